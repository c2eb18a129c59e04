//! Session acquisition
//!
//! Every repository operation opens its own session through
//! [`SessionProvider::create_session`] and holds it in a [`SessionGuard`].
//! The guard logs the session out when dropped, so early returns and `?`
//! never leak a session.

use super::error::RepositoryError;
use crate::constants::{PLATFORM_NAMESPACE_URI, PLATFORM_PREFIX};
use crate::db::{Credentials, TreeSession, TreeStore};
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opens authenticated sessions against a tree store.
pub struct SessionProvider {
    store: Arc<dyn TreeStore>,
    credentials: Credentials,
    session_count: AtomicU64,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn TreeStore>, credentials: Credentials) -> Self {
        Self {
            store,
            credentials,
            session_count: AtomicU64::new(0),
        }
    }

    /// Authenticate, register the platform namespace and hand out a guard.
    ///
    /// # Errors
    ///
    /// `RepositoryError::StoreUnavailable` when login or namespace
    /// registration fails. The counter only moves on success.
    pub async fn create_session(&self) -> Result<SessionGuard, RepositoryError> {
        let session = self.store.login(&self.credentials).await.map_err(|e| {
            tracing::error!("Failed to open session for '{}': {}", self.credentials.user, e);
            RepositoryError::store_unavailable(e.to_string())
        })?;
        let guard = SessionGuard { session };

        guard
            .register_namespace(PLATFORM_PREFIX, PLATFORM_NAMESPACE_URI)
            .await
            .map_err(|e| {
                tracing::error!("Failed to register namespace '{}': {}", PLATFORM_PREFIX, e);
                RepositoryError::store_unavailable(e.to_string())
            })?;

        let count = self.session_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Session opened for '{}' (session count {})", guard.user(), count);
        Ok(guard)
    }

    /// Sessions successfully opened so far
    pub fn session_count(&self) -> u64 {
        self.session_count.load(Ordering::SeqCst)
    }
}

/// Scoped session; logs out on drop.
pub struct SessionGuard {
    session: Box<dyn TreeSession>,
}

impl Deref for SessionGuard {
    type Target = dyn TreeSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.logout();
    }
}
