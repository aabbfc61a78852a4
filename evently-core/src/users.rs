//! User records at `users/{uid}`.

use std::sync::Arc;

use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{EventlyError, EventlyResult};
use crate::identity::{IdentityProvider, ProviderProfile, UserHandle, require_user};
use crate::path;
use crate::store::{DocumentStore, WriteBatch};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub created_at: String,
    /// Date of birth, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

/// Fields a user may change on their own profile. `None` leaves a field alone;
/// an empty `dob` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub dob: Option<String>,
}

pub struct UserDirectory {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        UserDirectory { store, identity }
    }

    /// Create an email/password account and its user record, leaving the new user signed in.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
        username: &str,
    ) -> EventlyResult<UserProfile> {
        if password != confirm {
            return Err(EventlyError::Validation("Passwords do not match".into()));
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(EventlyError::Validation("Please enter a username".into()));
        }

        let user = self.identity.sign_up(email, password).await?;
        let profile = self.create_record(&user, username).await?;
        info!(uid = %user.uid, "registered user");
        Ok(profile)
    }

    /// Sign in through an external provider. The user record is only created
    /// the first time; returning users keep the profile they edited.
    pub async fn sign_in_with_provider(&self, provider: ProviderProfile) -> EventlyResult<UserProfile> {
        let user = self.identity.sign_in_with_provider(provider).await?;
        if let Some(existing) = self.find(&user.uid).await? {
            return Ok(existing);
        }

        let username = user
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.email.split('@').next().unwrap_or_default().to_string());
        self.create_record(&user, &username).await
    }

    async fn create_record(&self, user: &UserHandle, username: &str) -> EventlyResult<UserProfile> {
        let profile = UserProfile {
            id: user.uid.clone(),
            username: username.to_string(),
            email: user.email.clone(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            dob: None,
        };
        self.store
            .set(&path::user(&user.uid)?, serde_json::to_value(&profile)?)
            .await?;
        Ok(profile)
    }

    async fn find(&self, uid: &str) -> EventlyResult<Option<UserProfile>> {
        let profile = self.store.get(&path::user(uid)?).await?.deserialize::<UserProfile>()?;
        Ok(profile.map(|mut p| {
            p.id = uid.to_string();
            p
        }))
    }

    pub async fn profile(&self, uid: &str) -> EventlyResult<UserProfile> {
        self.find(uid)
            .await?
            .ok_or_else(|| EventlyError::NotFound(format!("User {} not found", uid)))
    }

    /// Change the caller's own username and/or date of birth.
    ///
    /// Only the named fields are written, so `email` and `createdAt` survive.
    pub async fn update_profile(&self, uid: &str, update: ProfileUpdate) -> EventlyResult<UserProfile> {
        let user = require_user(self.identity.as_ref())?;
        if user.uid != uid {
            return Err(EventlyError::NotOwner);
        }
        self.profile(uid).await?;

        let mut partial = Map::new();
        if let Some(username) = update.username {
            let username = username.trim();
            if username.is_empty() {
                return Err(EventlyError::Validation("Please enter a username".into()));
            }
            partial.insert("username".into(), Value::String(username.to_string()));
        }
        if let Some(dob) = update.dob {
            let dob = dob.trim();
            if dob.is_empty() {
                partial.insert("dob".into(), Value::Null);
            } else {
                NaiveDate::parse_from_str(dob, "%Y-%m-%d").map_err(|_| {
                    EventlyError::Validation(format!("Invalid date of birth '{}'. Expected YYYY-MM-DD", dob))
                })?;
                partial.insert("dob".into(), Value::String(dob.to_string()));
            }
        }

        if !partial.is_empty() {
            let batch = WriteBatch::new().merge(&path::user(uid)?, partial)?;
            self.store.update(batch).await?;
            info!(uid, "updated profile");
        }
        self.profile(uid).await
    }
}
