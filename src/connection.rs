//! A lazily initialised, process-scoped database connection.
//!
//! The first caller of [ConnectionProvider::get] starts a connection attempt.
//! Callers that arrive while the attempt is in flight wait for the same
//! attempt instead of starting their own, and everyone receives its outcome.
//! A failed attempt is forgotten so that a later call can try again.

use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OnceCell;

/// The store could not be reached.
///
/// The message holds the driver's error text. It is meant for the server logs
/// and must not be sent to clients.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("could not connect to the database: {0}")]
pub struct ConnectionError(pub String);

impl ConnectionError {
    /// Create a connection error from any displayable driver error.
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self(error.to_string())
    }
}

/// Opens connections to a database.
pub trait Connector: Send + Sync + 'static {
    /// A cheaply cloneable handle to an open connection.
    type Handle: Clone + Send + Sync + 'static;

    /// Open a new connection.
    fn connect(&self) -> impl Future<Output = Result<Self::Handle, ConnectionError>> + Send;
}

type Attempt<H> = Arc<OnceCell<Result<H, ConnectionError>>>;

/// Memoizes the connection produced by a [Connector].
///
/// Clones share the same cached connection.
pub struct ConnectionProvider<C: Connector> {
    connector: Arc<C>,
    attempt: Arc<Mutex<Option<Attempt<C::Handle>>>>,
}

impl<C: Connector> Clone for ConnectionProvider<C> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            attempt: self.attempt.clone(),
        }
    }
}

impl<C: Connector> std::fmt::Debug for ConnectionProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionProvider")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl<C: Connector> ConnectionProvider<C> {
    /// Create a provider that connects with `connector` on first use.
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            attempt: Arc::new(Mutex::new(None)),
        }
    }

    /// Get the shared connection handle, connecting if needed.
    ///
    /// # Errors
    /// Returns a [ConnectionError] if the connection attempt this call waited
    /// on failed. The failed attempt is discarded, so calling again retries.
    pub async fn get(&self) -> Result<C::Handle, ConnectionError> {
        let attempt = self.current_attempt();

        let outcome = attempt
            .get_or_init(|| self.connector.connect())
            .await
            .clone();

        if let Err(error) = &outcome {
            tracing::error!("Connection attempt failed: {error}");
            self.discard(&attempt);
        }

        outcome
    }

    /// Drop the cached connection so that the next call to
    /// [ConnectionProvider::get] reconnects.
    pub fn reset(&self) {
        let mut slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.take().is_some() {
            tracing::debug!("Discarded cached connection");
        }
    }

    /// Whether a connection has been established and cached.
    pub fn is_connected(&self) -> bool {
        let slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);

        matches!(
            slot.as_ref().and_then(|attempt| attempt.get()),
            Some(Ok(_))
        )
    }

    fn current_attempt(&self) -> Attempt<C::Handle> {
        let mut slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);

        slot.get_or_insert_with(|| Arc::new(OnceCell::new())).clone()
    }

    fn discard(&self, attempt: &Attempt<C::Handle>) {
        let mut slot = self.attempt.lock().unwrap_or_else(PoisonError::into_inner);

        // A newer attempt may already have replaced the failed one.
        if slot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, attempt))
        {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use tokio::task::JoinSet;

    use super::{ConnectionError, ConnectionProvider, Connector};

    /// Counts connection attempts and fails the first `failures` of them.
    struct CountingConnector {
        attempts: Arc<AtomicUsize>,
        failures: usize,
        delay: Duration,
    }

    impl CountingConnector {
        fn new(failures: usize) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            let connector = Self {
                attempts: attempts.clone(),
                failures,
                delay: Duration::from_millis(50),
            };

            (connector, attempts)
        }
    }

    impl Connector for CountingConnector {
        type Handle = usize;

        async fn connect(&self) -> Result<usize, ConnectionError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.delay).await;

            if attempt <= self.failures {
                Err(ConnectionError(format!("attempt {attempt} refused")))
            } else {
                Ok(attempt)
            }
        }
    }

    #[tokio::test]
    async fn reuses_connection() {
        let (connector, attempts) = CountingConnector::new(0);
        let provider = ConnectionProvider::new(connector);

        assert_eq!(provider.get().await, Ok(1));
        assert_eq!(provider.get().await, Ok(1));
        assert_eq!(provider.clone().get().await, Ok(1));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(provider.is_connected());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_attempt() {
        let (connector, attempts) = CountingConnector::new(0);
        let provider = ConnectionProvider::new(connector);

        let mut tasks = JoinSet::new();
        for _ in 0..16 {
            let provider = provider.clone();
            tasks.spawn(async move { provider.get().await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(result.unwrap(), Ok(1));
        }

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_all_see_failure() {
        let (connector, attempts) = CountingConnector::new(1);
        let provider = ConnectionProvider::new(connector);

        let mut tasks = JoinSet::new();
        for _ in 0..8 {
            let provider = provider.clone();
            tasks.spawn(async move { provider.get().await });
        }

        while let Some(result) = tasks.join_next().await {
            assert_eq!(
                result.unwrap(),
                Err(ConnectionError("attempt 1 refused".to_owned()))
            );
        }

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(!provider.is_connected());
    }

    #[tokio::test]
    async fn retries_after_failure() {
        let (connector, attempts) = CountingConnector::new(1);
        let provider = ConnectionProvider::new(connector);

        assert!(provider.get().await.is_err());
        assert_eq!(provider.get().await, Ok(2));
        assert_eq!(provider.get().await, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reset_forces_reconnect() {
        let (connector, attempts) = CountingConnector::new(0);
        let provider = ConnectionProvider::new(connector);

        assert_eq!(provider.get().await, Ok(1));
        provider.reset();
        assert!(!provider.is_connected());
        assert_eq!(provider.get().await, Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
