//! Identity provider client.
//!
//! Sign-in is delegated to an identity provider; the rest of the crate only
//! ever sees a [`UserHandle`] for the current user.

mod local;

pub use local::LocalIdentity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{EventlyError, EventlyResult};

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle {
    /// Stable, provider-issued id.
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

/// Profile returned by an external sign-in provider (e.g. a Google popup).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> EventlyResult<UserHandle>;

    async fn sign_in_with_provider(&self, profile: ProviderProfile) -> EventlyResult<UserHandle>;

    async fn sign_up(&self, email: &str, password: &str) -> EventlyResult<UserHandle>;

    async fn sign_out(&self) -> EventlyResult<()>;

    fn current_user(&self) -> Option<UserHandle>;

    /// Receives the new state every time a user signs in or out.
    fn watch_auth_state(&self) -> watch::Receiver<Option<UserHandle>>;
}

/// The current user, or [`EventlyError::NotAuthenticated`].
pub fn require_user(identity: &dyn IdentityProvider) -> EventlyResult<UserHandle> {
    identity.current_user().ok_or(EventlyError::NotAuthenticated)
}
