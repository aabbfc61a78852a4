//! Identity provider backed by a local account book.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{EventlyError, EventlyResult};
use crate::identity::{IdentityProvider, ProviderProfile, UserHandle};
use crate::lockfile::FileLock;

const ACCOUNTS_FILE: &str = "accounts.json";
const ACCOUNTS_LOCK: &str = "accounts.lock";
const MIN_PASSWORD_LEN: usize = 6;

/// Accounts with salted SHA-256 password digests, plus the active session.
///
/// `LocalIdentity::open` keeps the book in `<dir>/accounts.json` so the
/// session survives between runs; `in_memory` keeps nothing on disk. Each
/// change re-reads the file under a lock on `<dir>/accounts.lock`, so
/// processes sharing the directory do not drop each other's accounts.
pub struct LocalIdentity {
    book: Mutex<AccountBook>,
    session: watch::Sender<Option<UserHandle>>,
    file: Option<BookFile>,
}

struct BookFile {
    path: PathBuf,
    lock: PathBuf,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccountBook {
    /// Keyed by lowercased email.
    #[serde(default)]
    accounts: BTreeMap<String, Account>,
    /// uid of the signed-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Account {
    uid: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<PasswordDigest>,
    #[serde(default)]
    providers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PasswordDigest {
    salt: String,
    hash: String,
}

impl PasswordDigest {
    fn new(password: &str) -> Self {
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = hex::encode(salt);
        let hash = digest(&salt, password);
        PasswordDigest { salt, hash }
    }

    fn matches(&self, password: &str) -> bool {
        digest(&self.salt, password) == self.hash
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl Account {
    fn handle(&self) -> UserHandle {
        UserHandle {
            uid: self.uid.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

impl AccountBook {
    fn by_uid(&self, uid: &str) -> Option<&Account> {
        self.accounts.values().find(|a| a.uid == uid)
    }
}

impl BookFile {
    fn read(&self) -> EventlyResult<AccountBook> {
        if !self.path.exists() {
            return Ok(AccountBook::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content)
            .map_err(|e| EventlyError::Serialization(format!("{}: {}", self.path.display(), e)))
    }

    fn write(&self, book: &AccountBook) -> EventlyResult<()> {
        let content = serde_json::to_string_pretty(book)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

impl LocalIdentity {
    pub fn in_memory() -> Self {
        LocalIdentity::from_book(AccountBook::default(), None)
    }

    /// Load (or start) the account book in `dir`, restoring any saved session.
    pub fn open(dir: &Path) -> EventlyResult<Self> {
        std::fs::create_dir_all(dir)?;
        let file = BookFile {
            path: dir.join(ACCOUNTS_FILE),
            lock: dir.join(ACCOUNTS_LOCK),
        };

        let book = {
            let _lock = FileLock::shared(&file.lock)?;
            file.read()?
        };

        Ok(LocalIdentity::from_book(book, Some(file)))
    }

    fn from_book(book: AccountBook, file: Option<BookFile>) -> Self {
        let current = book
            .session
            .as_deref()
            .and_then(|uid| book.by_uid(uid))
            .map(Account::handle);
        let (session, _) = watch::channel(current);

        LocalIdentity {
            book: Mutex::new(book),
            session,
            file,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AccountBook> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `change` on the latest book and persist the result.
    ///
    /// With a backing file the book is re-read under the exclusive lock first.
    /// Nothing is written when `change` fails.
    fn transact<T>(
        &self,
        change: impl FnOnce(&mut AccountBook) -> EventlyResult<T>,
    ) -> EventlyResult<T> {
        let mut book = self.lock();
        let Some(file) = &self.file else {
            return change(&mut book);
        };

        let _lock = FileLock::exclusive(&file.lock)?;
        let mut latest = file.read()?;
        let out = change(&mut latest)?;
        file.write(&latest)?;
        *book = latest;
        Ok(out)
    }

    /// Record `user` as signed in (or nobody) and notify watchers.
    fn set_session(&self, user: Option<UserHandle>) -> EventlyResult<()> {
        let uid = user.as_ref().map(|u| u.uid.clone());
        self.transact(|book| {
            book.session = uid;
            Ok(())
        })?;
        self.session.send_replace(user);
        Ok(())
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> EventlyResult<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(EventlyError::Auth(format!("Invalid email address '{}'", email))),
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> EventlyResult<UserHandle> {
        let user = self.transact(|book| {
            let user = book
                .accounts
                .get(&email_key(email))
                .filter(|a| a.password.as_ref().is_some_and(|p| p.matches(password)))
                .map(Account::handle)
                .ok_or_else(|| EventlyError::Auth("Invalid email or password".into()))?;
            book.session = Some(user.uid.clone());
            Ok(user)
        })?;

        self.session.send_replace(Some(user.clone()));
        info!(uid = %user.uid, "signed in");
        Ok(user)
    }

    async fn sign_in_with_provider(&self, profile: ProviderProfile) -> EventlyResult<UserHandle> {
        validate_email(&profile.email)?;

        let user = self.transact(|book| {
            let account = book
                .accounts
                .entry(email_key(&profile.email))
                .or_insert_with(|| Account {
                    uid: Uuid::new_v4().simple().to_string(),
                    email: profile.email.trim().to_string(),
                    display_name: None,
                    password: None,
                    providers: Vec::new(),
                });
            if !account.providers.contains(&profile.provider) {
                account.providers.push(profile.provider.clone());
            }
            if profile.display_name.is_some() {
                account.display_name = profile.display_name.clone();
            }
            let user = account.handle();
            book.session = Some(user.uid.clone());
            Ok(user)
        })?;

        self.session.send_replace(Some(user.clone()));
        info!(uid = %user.uid, provider = %profile.provider, "signed in with provider");
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> EventlyResult<UserHandle> {
        validate_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(EventlyError::Auth(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let user = self.transact(|book| {
            let key = email_key(email);
            if book.accounts.contains_key(&key) {
                return Err(EventlyError::Auth("Email already in use".into()));
            }

            let account = Account {
                uid: Uuid::new_v4().simple().to_string(),
                email: email.trim().to_string(),
                display_name: None,
                password: Some(PasswordDigest::new(password)),
                providers: Vec::new(),
            };
            let user = account.handle();
            book.accounts.insert(key, account);
            book.session = Some(user.uid.clone());
            Ok(user)
        })?;

        self.session.send_replace(Some(user.clone()));
        info!(uid = %user.uid, "account created");
        Ok(user)
    }

    async fn sign_out(&self) -> EventlyResult<()> {
        self.set_session(None)?;
        debug!("signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<UserHandle> {
        self.session.borrow().clone()
    }

    fn watch_auth_state(&self) -> watch::Receiver<Option<UserHandle>> {
        self.session.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sign_up_signs_in() {
        let identity = LocalIdentity::in_memory();
        let user = identity.sign_up("Ann@Example.com", "secret1").await.unwrap();

        assert_eq!(identity.current_user(), Some(user.clone()));
        assert_eq!(user.email, "Ann@Example.com");
    }

    #[tokio::test]
    async fn test_sign_in_checks_password() {
        let identity = LocalIdentity::in_memory();
        let user = identity.sign_up("ann@example.com", "secret1").await.unwrap();
        identity.sign_out().await.unwrap();
        assert_eq!(identity.current_user(), None);

        let err = identity.sign_in("ann@example.com", "wrong!").await.unwrap_err();
        assert!(matches!(err, EventlyError::Auth(_)));

        let again = identity.sign_in("ANN@example.com", "secret1").await.unwrap();
        assert_eq!(again.uid, user.uid);
    }

    #[tokio::test]
    async fn test_duplicate_email_and_short_password_rejected() {
        let identity = LocalIdentity::in_memory();
        identity.sign_up("ann@example.com", "secret1").await.unwrap();

        assert!(identity.sign_up("ann@example.com", "secret2").await.is_err());
        assert!(identity.sign_up("bob@example.com", "123").await.is_err());
        assert!(identity.sign_up("not-an-email", "secret1").await.is_err());
    }

    #[tokio::test]
    async fn test_provider_sign_in_reuses_account() {
        let identity = LocalIdentity::in_memory();
        let created = identity.sign_up("ann@example.com", "secret1").await.unwrap();

        let profile = ProviderProfile {
            provider: "google".into(),
            email: "ann@example.com".into(),
            display_name: Some("Ann".into()),
        };
        let user = identity.sign_in_with_provider(profile).await.unwrap();
        assert_eq!(user.uid, created.uid);
        assert_eq!(user.display_name.as_deref(), Some("Ann"));
    }

    #[tokio::test]
    async fn test_watchers_see_sign_out() {
        let identity = LocalIdentity::in_memory();
        identity.sign_up("ann@example.com", "secret1").await.unwrap();

        let mut watcher = identity.watch_auth_state();
        assert!(watcher.borrow_and_update().is_some());

        identity.sign_out().await.unwrap();
        watcher.changed().await.unwrap();
        assert!(watcher.borrow().is_none());
    }

    #[tokio::test]
    async fn test_session_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let user = {
            let identity = LocalIdentity::open(dir.path()).unwrap();
            identity.sign_up("ann@example.com", "secret1").await.unwrap()
        };

        let reopened = LocalIdentity::open(dir.path()).unwrap();
        assert_eq!(reopened.current_user(), Some(user));

        let raw = std::fs::read_to_string(dir.path().join(ACCOUNTS_FILE)).unwrap();
        assert!(!raw.contains("secret1"));
    }

    #[tokio::test]
    async fn test_two_books_on_one_directory_keep_both_accounts() {
        let dir = TempDir::new().unwrap();
        let a = LocalIdentity::open(dir.path()).unwrap();
        let b = LocalIdentity::open(dir.path()).unwrap();

        let ann = a.sign_up("ann@example.com", "secret1").await.unwrap();
        let bob = b.sign_up("bob@example.com", "secret2").await.unwrap();
        assert!(a.sign_up("bob@example.com", "secret3").await.is_err());

        let reopened = LocalIdentity::open(dir.path()).unwrap();
        assert_eq!(reopened.sign_in("ann@example.com", "secret1").await.unwrap().uid, ann.uid);
        assert_eq!(reopened.sign_in("bob@example.com", "secret2").await.unwrap().uid, bob.uid);
    }
}
