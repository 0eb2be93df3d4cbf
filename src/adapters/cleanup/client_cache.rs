//! Per-session cache of downstream clients (speech, retrieval, model
//! connections) that must be closed when their session goes away.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::foundation::SessionId;
use crate::ports::{CleanupError, SessionResourceCleaner};

/// A client holding resources that need an explicit close.
#[async_trait]
pub trait DownstreamClient: Send + Sync {
    async fn close(&self) -> Result<(), CleanupError>;
}

type ClientFactory<C> = dyn Fn(&SessionId) -> C + Send + Sync;

/// Lazily builds one client per session and closes it on release.
pub struct SessionClientCache<C: DownstreamClient> {
    clients: DashMap<SessionId, Arc<C>>,
    factory: Box<ClientFactory<C>>,
}

impl<C: DownstreamClient> SessionClientCache<C> {
    pub fn new(factory: impl Fn(&SessionId) -> C + Send + Sync + 'static) -> Self {
        Self {
            clients: DashMap::new(),
            factory: Box::new(factory),
        }
    }

    /// The session's client, built on first use.
    pub fn client(&self, session_id: &SessionId) -> Arc<C> {
        self.clients
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new((self.factory)(session_id)))
            .clone()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.clients.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl<C: DownstreamClient + 'static> SessionResourceCleaner for SessionClientCache<C> {
    async fn release_session(&self, session_id: &SessionId) -> Result<(), CleanupError> {
        let Some((_, client)) = self.clients.remove(session_id) else {
            return Ok(());
        };
        match client.close().await {
            Ok(()) => {
                tracing::debug!(session_id = %session_id, "downstream client closed");
                Ok(())
            }
            Err(e) => {
                // Keep the client reachable so a retry can close it. If the
                // session already built a new one, that one wins.
                if e.is_transient() {
                    self.clients.entry(session_id.clone()).or_insert(client);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeClient {
        closes: Arc<AtomicUsize>,
        fail_first: bool,
    }

    #[async_trait]
    impl DownstreamClient for FakeClient {
        async fn close(&self) -> Result<(), CleanupError> {
            let n = self.closes.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(CleanupError::transient("socket busy"));
            }
            Ok(())
        }
    }

    fn sid(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    fn cache(closes: Arc<AtomicUsize>, fail_first: bool) -> SessionClientCache<FakeClient> {
        SessionClientCache::new(move |_| FakeClient {
            closes: closes.clone(),
            fail_first,
        })
    }

    #[tokio::test]
    async fn client_is_built_once_per_session() {
        let closes = Arc::new(AtomicUsize::new(0));
        let cache = cache(closes, false);

        let a = cache.client(&sid("a"));
        let again = cache.client(&sid("a"));
        cache.client(&sid("b"));

        assert!(Arc::ptr_eq(&a, &again));
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn release_closes_and_forgets_client() {
        let closes = Arc::new(AtomicUsize::new(0));
        let cache = cache(closes.clone(), false);
        cache.client(&sid("a"));

        cache.release_session(&sid("a")).await.unwrap();

        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(!cache.contains(&sid("a")));
    }

    #[tokio::test]
    async fn release_of_unknown_session_is_ok() {
        let cache = cache(Arc::new(AtomicUsize::new(0)), false);
        assert!(cache.release_session(&sid("ghost")).await.is_ok());
    }

    #[tokio::test]
    async fn transient_close_failure_keeps_client_for_retry() {
        let closes = Arc::new(AtomicUsize::new(0));
        let cache = cache(closes.clone(), true);
        cache.client(&sid("a"));

        assert!(cache.release_session(&sid("a")).await.is_err());
        assert!(cache.contains(&sid("a")));

        cache.release_session(&sid("a")).await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
