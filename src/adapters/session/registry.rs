//! Per-session records: payment, order and conversation.
//!
//! Each record lives in its own sharded map and is created on first access.
//! Every accessor takes a `SessionGuard`, so records are only ever touched by
//! the holder of that session's lock. Shard locks are held for the duration
//! of the closure only; closures must not await or block.

use dashmap::DashMap;

use crate::domain::foundation::{Money, SessionId};
use crate::domain::payment::PaymentRecord;
use crate::domain::session::{ConversationState, OrderState};

use super::lock_table::SessionGuard;

#[derive(Debug)]
pub struct SessionStateRegistry {
    starting_balance: Money,
    payments: DashMap<SessionId, PaymentRecord>,
    orders: DashMap<SessionId, OrderState>,
    conversations: DashMap<SessionId, ConversationState>,
}

impl SessionStateRegistry {
    pub fn new(starting_balance: Money) -> Self {
        Self {
            starting_balance,
            payments: DashMap::new(),
            orders: DashMap::new(),
            conversations: DashMap::new(),
        }
    }

    pub fn starting_balance(&self) -> Money {
        self.starting_balance
    }

    /// Runs `f` against the session's payment record, creating it if absent.
    pub fn payment_mut<R>(&self, guard: &SessionGuard, f: impl FnOnce(&mut PaymentRecord) -> R) -> R {
        let mut record = self
            .payments
            .entry(guard.session_id().clone())
            .or_insert_with(|| PaymentRecord::new(self.starting_balance));
        f(&mut record)
    }

    pub fn order_mut<R>(&self, guard: &SessionGuard, f: impl FnOnce(&mut OrderState) -> R) -> R {
        let mut order = self.orders.entry(guard.session_id().clone()).or_default();
        f(&mut order)
    }

    pub fn conversation_mut<R>(
        &self,
        guard: &SessionGuard,
        f: impl FnOnce(&mut ConversationState) -> R,
    ) -> R {
        let mut conversation = self
            .conversations
            .entry(guard.session_id().clone())
            .or_default();
        f(&mut conversation)
    }

    /// Copy of the payment record, or a fresh default one.
    pub fn payment(&self, guard: &SessionGuard) -> PaymentRecord {
        self.payments
            .get(guard.session_id())
            .map(|record| record.clone())
            .unwrap_or_else(|| PaymentRecord::new(self.starting_balance))
    }

    pub fn order(&self, guard: &SessionGuard) -> OrderState {
        self.orders
            .get(guard.session_id())
            .map(|order| order.clone())
            .unwrap_or_default()
    }

    pub fn conversation(&self, guard: &SessionGuard) -> ConversationState {
        self.conversations
            .get(guard.session_id())
            .map(|conversation| conversation.clone())
            .unwrap_or_default()
    }

    /// Drops every record held for the session. Returns true if any existed.
    pub fn remove(&self, guard: &SessionGuard) -> bool {
        let id = guard.session_id();
        let payment = self.payments.remove(id).is_some();
        let order = self.orders.remove(id).is_some();
        let conversation = self.conversations.remove(id).is_some();
        payment || order || conversation
    }

    /// Whether any record exists for `session_id`.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.payments.contains_key(session_id)
            || self.orders.contains_key(session_id)
            || self.conversations.contains_key(session_id)
    }
}
