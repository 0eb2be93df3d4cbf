//! Session domain - the non-payment records kept per session.

mod conversation;
mod order;

pub use conversation::ConversationState;
pub use order::{OrderLine, OrderState};
