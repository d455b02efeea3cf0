//! In-memory account and task document store.
//!
//! Accounts are keyed by lowercase email and hold a salted SHA-256
//! password hash. Task documents are kept per user in id order. Task
//! operations do not check that the user exists.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};
use taskpad_proto::user::codes;
use taskpad_proto::{Task, TaskId, TaskPatch, UserId, UserProfile};
use tokio::sync::RwLock;

/// Default minimum password length in characters.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 6;

/// Errors returned by [`DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Sign-up with an email that already has an account.
    #[error("email already in use")]
    EmailAlreadyInUse,
    /// The email is not of the form `local@domain`.
    #[error("invalid email address")]
    InvalidEmail,
    /// The password is shorter than the configured minimum.
    #[error("password must be at least {0} characters")]
    WeakPassword(usize),
    /// No account with that email, or no profile with that uid.
    #[error("user not found")]
    UserNotFound,
    /// The password does not match.
    #[error("wrong password")]
    WrongPassword,
    /// Patch of a task document that does not exist.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
}

impl StoreError {
    /// The wire error code sent to clients.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmailAlreadyInUse => codes::EMAIL_ALREADY_IN_USE,
            Self::InvalidEmail => codes::INVALID_EMAIL,
            Self::WeakPassword(_) => codes::WEAK_PASSWORD,
            Self::UserNotFound => codes::USER_NOT_FOUND,
            Self::WrongPassword => codes::WRONG_PASSWORD,
            Self::TaskNotFound(_) => codes::TASK_NOT_FOUND,
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    profile: UserProfile,
    salt: [u8; 16],
    hash: [u8; 32],
}

#[derive(Debug, Default)]
struct Accounts {
    by_email: HashMap<String, Account>,
    by_uid: HashMap<UserId, String>,
}

/// Accounts plus per-user task documents.
///
/// Thread-safe via [`RwLock`]. Locks are never held across an await.
pub struct DocumentStore {
    accounts: RwLock<Accounts>,
    tasks: RwLock<HashMap<UserId, BTreeMap<TaskId, Task>>>,
    min_password_len: usize,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_password(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
}

impl DocumentStore {
    /// Creates an empty store with the default password policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_min_password_len(DEFAULT_MIN_PASSWORD_LEN)
    }

    /// Creates an empty store requiring passwords of at least `len` chars.
    #[must_use]
    pub fn with_min_password_len(len: usize) -> Self {
        Self {
            accounts: RwLock::new(Accounts::default()),
            tasks: RwLock::new(HashMap::new()),
            min_password_len: len,
        }
    }

    /// Create an account and its profile.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidEmail`], [`StoreError::WeakPassword`] or
    /// [`StoreError::EmailAlreadyInUse`].
    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, StoreError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(StoreError::InvalidEmail);
        }
        if password.chars().count() < self.min_password_len {
            return Err(StoreError::WeakPassword(self.min_password_len));
        }

        let mut accounts = self.accounts.write().await;
        if accounts.by_email.contains_key(&email) {
            return Err(StoreError::EmailAlreadyInUse);
        }

        let salt: [u8; 16] = rand::random();
        let profile = UserProfile {
            uid: UserId::new(uuid::Uuid::now_v7().to_string()),
            email: email.clone(),
            full_name: full_name.to_string(),
        };
        accounts
            .by_uid
            .insert(profile.uid.clone(), email.clone());
        accounts.by_email.insert(
            email,
            Account {
                profile: profile.clone(),
                salt,
                hash: hash_password(&salt, password),
            },
        );
        drop(accounts);
        Ok(profile)
    }

    /// Check credentials and return the profile.
    ///
    /// # Errors
    ///
    /// [`StoreError::UserNotFound`] or [`StoreError::WrongPassword`].
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, StoreError> {
        let email = email.trim().to_lowercase();
        let accounts = self.accounts.read().await;
        let account = accounts
            .by_email
            .get(&email)
            .ok_or(StoreError::UserNotFound)?;
        if hash_password(&account.salt, password) != account.hash {
            return Err(StoreError::WrongPassword);
        }
        Ok(account.profile.clone())
    }

    /// The profile for `uid`.
    ///
    /// # Errors
    ///
    /// [`StoreError::UserNotFound`] if there is no such user.
    pub async fn profile(&self, uid: &UserId) -> Result<UserProfile, StoreError> {
        let accounts = self.accounts.read().await;
        accounts
            .by_uid
            .get(uid)
            .and_then(|email| accounts.by_email.get(email))
            .map(|account| account.profile.clone())
            .ok_or(StoreError::UserNotFound)
    }

    /// Create or replace a task document.
    pub async fn put_task(&self, uid: &UserId, task: Task) {
        self.tasks
            .write()
            .await
            .entry(uid.clone())
            .or_default()
            .insert(task.id.clone(), task);
    }

    /// Merge `patch` into an existing task document.
    ///
    /// # Errors
    ///
    /// [`StoreError::TaskNotFound`] if the document does not exist.
    pub async fn patch_task(
        &self,
        uid: &UserId,
        id: &TaskId,
        patch: TaskPatch,
    ) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .get_mut(uid)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::TaskNotFound(id.clone()))?;
        task.apply(patch);
        Ok(task.clone())
    }

    /// Remove a task document. Returns `true` if it existed.
    pub async fn delete_task(&self, uid: &UserId, id: &TaskId) -> bool {
        self.tasks
            .write()
            .await
            .get_mut(uid)
            .is_some_and(|docs| docs.remove(id).is_some())
    }

    /// Every task document for `uid`, ordered by id.
    pub async fn list_tasks(&self, uid: &UserId) -> Vec<Task> {
        self.tasks
            .read()
            .await
            .get(uid)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Upsert every task in `batch`. Returns how many were written.
    pub async fn batch_write(&self, uid: &UserId, batch: Vec<Task>) -> usize {
        let count = batch.len();
        let mut tasks = self.tasks.write().await;
        let docs = tasks.entry(uid.clone()).or_default();
        for task in batch {
            docs.insert(task.id.clone(), task);
        }
        drop(tasks);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpad_proto::TaskStatus;

    fn task(id: &str, title: &str) -> Task {
        Task {
            id: TaskId::new(id),
            title: title.to_string(),
            description: String::new(),
            date: String::new(),
            status: TaskStatus::pending(),
        }
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let store = DocumentStore::new();
        let created = store
            .sign_up("Ann", "Ann@Example.com", "secret1")
            .await
            .unwrap();
        assert_eq!(created.email, "ann@example.com");

        let signed_in = store.sign_in("ann@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in, created);
        assert_eq!(store.profile(&created.uid).await.unwrap(), created);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = DocumentStore::new();
        store.sign_up("Ann", "a@x.io", "secret1").await.unwrap();
        let err = store.sign_up("Ann", "A@X.io", "secret2").await.unwrap_err();
        assert_eq!(err, StoreError::EmailAlreadyInUse);
        assert_eq!(err.code(), "auth/email-already-in-use");
    }

    #[tokio::test]
    async fn sign_up_validates_input() {
        let store = DocumentStore::new();
        assert_eq!(
            store.sign_up("Ann", "no-at-sign", "secret1").await,
            Err(StoreError::InvalidEmail)
        );
        assert_eq!(
            store.sign_up("Ann", "a@x.io", "123").await,
            Err(StoreError::WeakPassword(6))
        );
    }

    #[tokio::test]
    async fn bad_credentials() {
        let store = DocumentStore::new();
        store.sign_up("Ann", "a@x.io", "secret1").await.unwrap();
        assert_eq!(
            store.sign_in("a@x.io", "nope!!").await,
            Err(StoreError::WrongPassword)
        );
        assert_eq!(
            store.sign_in("b@x.io", "secret1").await,
            Err(StoreError::UserNotFound)
        );
    }

    #[tokio::test]
    async fn same_password_gets_different_hashes() {
        let store = DocumentStore::new();
        store.sign_up("A", "a@x.io", "secret1").await.unwrap();
        store.sign_up("B", "b@x.io", "secret1").await.unwrap();
        let accounts = store.accounts.read().await;
        assert_ne!(
            accounts.by_email["a@x.io"].hash,
            accounts.by_email["b@x.io"].hash
        );
    }

    #[tokio::test]
    async fn patch_merges_fields_and_requires_document() {
        let store = DocumentStore::new();
        let uid = UserId::new("u1");
        store.put_task(&uid, task("1", "old")).await;

        let patch = TaskPatch {
            status: Some(TaskStatus::completed()),
            ..TaskPatch::default()
        };
        let merged = store
            .patch_task(&uid, &TaskId::new("1"), patch.clone())
            .await
            .unwrap();
        assert_eq!(merged.title, "old");
        assert!(merged.status.is_completed());

        let err = store
            .patch_task(&uid, &TaskId::new("2"), patch)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "tasks/not-found");
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_list_is_ordered() {
        let store = DocumentStore::new();
        let uid = UserId::new("u1");
        store
            .batch_write(&uid, vec![task("3", "c"), task("1", "a"), task("2", "b")])
            .await;
        assert!(store.delete_task(&uid, &TaskId::new("2")).await);
        assert!(!store.delete_task(&uid, &TaskId::new("2")).await);
        assert!(!store.delete_task(&UserId::new("nobody"), &TaskId::new("1")).await);

        let ids: Vec<_> = store
            .list_tasks(&uid)
            .await
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
