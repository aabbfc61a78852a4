//! Wiring between the configuration and the core services.

use std::sync::Arc;

use anyhow::{Context, Result};
use evently_core::config::EventlyConfig;
use evently_core::identity::{IdentityProvider, LocalIdentity, UserHandle};
use evently_core::repository::EventRepository;
use evently_core::route::EventRoute;
use evently_core::store::{DocumentStore, FileStore, TimedStore};
use evently_core::users::UserDirectory;
use tracing::debug;

pub struct App {
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<LocalIdentity>,
    pub repo: EventRepository,
    pub users: UserDirectory,
}

impl App {
    /// Open the file store and account book under the configured data directory.
    pub fn open(config: EventlyConfig) -> Result<Self> {
        let data_dir = config.data_path();
        let timeout = config.store_timeout()?;

        let file_store = FileStore::open(&data_dir)
            .with_context(|| format!("Could not open the store in {}", data_dir.display()))?;
        let store: Arc<dyn DocumentStore> = Arc::new(TimedStore::new(Arc::new(file_store), timeout));
        let identity = Arc::new(
            LocalIdentity::open(&data_dir)
                .with_context(|| format!("Could not open accounts in {}", data_dir.display()))?,
        );

        debug!(data_dir = %data_dir.display(), use_indexes = config.use_indexes, "opened data directory");

        Ok(App {
            repo: EventRepository::new(store.clone(), identity.clone(), config.use_indexes),
            users: UserDirectory::new(store.clone(), identity.clone()),
            store,
            identity,
        })
    }

    pub fn user(&self) -> Result<UserHandle> {
        self.identity
            .current_user()
            .context("Not signed in. Run `evently signin --email <email>` first")
    }

    /// `<owner>/<event>`, or a bare event id for one of the caller's own events.
    pub fn route(&self, event: &str) -> Result<EventRoute> {
        if event.contains('/') {
            return Ok(event.parse()?);
        }
        let user = self.user()?;
        Ok(EventRoute::from_params(Some(&user.uid), Some(event))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> App {
        let config = EventlyConfig {
            data_dir: PathBuf::from(dir.path()),
            ..Default::default()
        };
        App::open(config).unwrap()
    }

    #[tokio::test]
    async fn test_state_persists_between_runs() {
        let dir = TempDir::new().unwrap();

        let created = {
            let app = open(&dir);
            app.users
                .register("ann@example.com", "secret1", "secret1", "ann")
                .await
                .unwrap();
            app.repo.create_event("Trip").await.unwrap()
        };

        let app = open(&dir);
        let user = app.user().unwrap();
        let route = app.route(&created.event_id).unwrap();
        assert_eq!(route.owner_id, user.uid);

        let event = app.repo.fetch_event(&route.owner_id, &route.event_id).await.unwrap();
        assert_eq!(event.code, created.code);
    }

    #[tokio::test]
    async fn test_bare_event_id_needs_sign_in() {
        let dir = TempDir::new().unwrap();
        let app = open(&dir);

        assert!(app.route("e1").is_err());
        let route = app.route("u1/e1").unwrap();
        assert_eq!((route.owner_id.as_str(), route.event_id.as_str()), ("u1", "e1"));
    }
}
