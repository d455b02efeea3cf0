//! Account sign-up, sign-in, sign-out, and startup user restoration.
//!
//! Backend failures arrive as `auth/...` codes and are mapped onto
//! [`AuthError`] variants whose `Display` text is the message shown to the
//! user. Authentication errors are the only failures in `Taskpad` that are
//! surfaced with user-directed wording.

use reqwest::StatusCode;
use taskpad_proto::user::{ErrorBody, SignInRequest, SignUpRequest, codes};
use taskpad_proto::{UserId, UserProfile};

use crate::connectivity::Connectivity;
use crate::remote::HttpBackend;
use crate::remote::http::transport_error;
use crate::session::{SecureStore, SessionStore};
use crate::storage::{KeyValueStore, USER_DETAILS_KEY};

/// Authentication failures, worded for display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `auth/email-already-in-use`
    #[error("This email is already registered. Please login instead.")]
    EmailAlreadyInUse,
    /// `auth/invalid-email`
    #[error("The email address is invalid.")]
    InvalidEmail,
    /// `auth/weak-password`
    #[error("Password is too weak. Please use at least 6 characters.")]
    WeakPassword,
    /// `auth/network-request-failed`
    #[error("Network error. Please check your connection.")]
    NetworkRequestFailed,
    /// `auth/user-not-found`
    #[error("No user found with this email. Please sign up.")]
    UserNotFound,
    /// `auth/invalid-credential`
    #[error("Invalid credentials provided. Please try again.")]
    InvalidCredential,
    /// `auth/wrong-password`
    #[error("Incorrect password. Please try again.")]
    WrongPassword,
    /// The account exists but has no profile document.
    #[error("User profile not found.")]
    ProfileNotFound,
    /// Any other code.
    #[error("An unexpected error occurred. Please try again.")]
    Unexpected,
}

impl AuthError {
    /// Map a backend error code to its user-facing error.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            codes::EMAIL_ALREADY_IN_USE => Self::EmailAlreadyInUse,
            codes::INVALID_EMAIL => Self::InvalidEmail,
            codes::WEAK_PASSWORD => Self::WeakPassword,
            codes::NETWORK_REQUEST_FAILED => Self::NetworkRequestFailed,
            codes::USER_NOT_FOUND => Self::UserNotFound,
            codes::INVALID_CREDENTIAL => Self::InvalidCredential,
            codes::WRONG_PASSWORD => Self::WrongPassword,
            _ => Self::Unexpected,
        }
    }
}

/// Backend account operations.
pub trait AuthProvider: Send + Sync {
    /// Create an account and its profile.
    fn sign_up(
        &self,
        request: &SignUpRequest,
    ) -> impl std::future::Future<Output = Result<UserProfile, AuthError>> + Send;

    /// Verify credentials and return the profile.
    fn sign_in(
        &self,
        request: &SignInRequest,
    ) -> impl std::future::Future<Output = Result<UserProfile, AuthError>> + Send;

    /// Fetch the profile for `uid`.
    fn profile(
        &self,
        uid: &UserId,
    ) -> impl std::future::Future<Output = Result<UserProfile, AuthError>> + Send;
}

impl HttpBackend {
    async fn post_auth<B: serde::Serialize + Sync>(
        &self,
        route: &str,
        body: &B,
    ) -> Result<UserProfile, AuthError> {
        let url = self
            .endpoint(&["auth", route])
            .map_err(|_| AuthError::Unexpected)?;
        let response = self
            .client()
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %transport_error(&e), "auth request failed");
                AuthError::NetworkRequestFailed
            })?;
        read_profile(response).await
    }
}

async fn read_profile(response: reqwest::Response) -> Result<UserProfile, AuthError> {
    if response.status().is_success() {
        return response.json::<UserProfile>().await.map_err(|e| {
            tracing::warn!(error = %e, "malformed profile in auth response");
            AuthError::Unexpected
        });
    }
    let status = response.status();
    let Ok(body) = response.json::<ErrorBody>().await else {
        return Err(if status == StatusCode::NOT_FOUND {
            AuthError::ProfileNotFound
        } else {
            AuthError::Unexpected
        });
    };
    tracing::debug!(code = %body.code, message = %body.message, "auth rejected");
    Err(AuthError::from_code(&body.code))
}

impl AuthProvider for HttpBackend {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<UserProfile, AuthError> {
        self.post_auth("sign-up", request).await
    }

    async fn sign_in(&self, request: &SignInRequest) -> Result<UserProfile, AuthError> {
        self.post_auth("sign-in", request).await
    }

    async fn profile(&self, uid: &UserId) -> Result<UserProfile, AuthError> {
        let url = self
            .endpoint(&["users", uid.as_str()])
            .map_err(|_| AuthError::Unexpected)?;
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .map_err(|_| AuthError::NetworkRequestFailed)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(AuthError::ProfileNotFound);
        }
        read_profile(response).await
    }
}

/// Account workflows tying the backend, the session, and the cached
/// profile together.
pub struct AuthService<P, K, S, C> {
    provider: P,
    storage: K,
    session: SessionStore<S>,
    connectivity: C,
}

impl<P, K, S, C> AuthService<P, K, S, C>
where
    P: AuthProvider,
    K: KeyValueStore,
    S: SecureStore,
    C: Connectivity,
{
    /// Assemble the service from its collaborators.
    pub const fn new(provider: P, storage: K, session: SessionStore<S>, connectivity: C) -> Self {
        Self {
            provider,
            storage,
            session,
            connectivity,
        }
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`] from the backend.
    pub async fn sign_up(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let request = SignUpRequest {
            full_name: full_name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let profile = self.provider.sign_up(&request).await?;
        tracing::info!(uid = %profile.uid, "account created");
        Ok(profile)
    }

    /// Sign in, start a session, and cache the profile locally.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`AuthError`] from the backend. Failing to cache
    /// the profile is logged, not returned.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile, AuthError> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let profile = self.provider.sign_in(&request).await?;
        self.session.set_session(&profile.uid).await;
        self.cache_profile(&profile).await;
        tracing::info!(uid = %profile.uid, "signed in");
        Ok(profile)
    }

    /// End the session and drop the cached profile.
    ///
    /// Queued task operations and the task snapshot are left in place.
    pub async fn sign_out(&self) {
        self.session.clear_session().await;
        if let Err(err) = self.storage.remove_item(USER_DETAILS_KEY).await {
            tracing::warn!(error = %err, "failed to remove cached profile");
        }
        tracing::info!("signed out");
    }

    /// Work out who is signed in at startup.
    ///
    /// Online: the profile for the session user is fetched from the
    /// backend. Offline: the cached profile is used. Any failure means
    /// guest (`None`).
    pub async fn restore_user(&self) -> Option<UserProfile> {
        if self.connectivity.is_online().await {
            let uid = self.session.get_session().await?;
            match self.provider.profile(&uid).await {
                Ok(profile) => Some(profile),
                Err(err) => {
                    tracing::warn!(uid = %uid, error = %err, "could not restore user");
                    None
                }
            }
        } else {
            self.cached_profile().await
        }
    }

    /// The profile cached by the last sign-in, if readable.
    pub async fn cached_profile(&self) -> Option<UserProfile> {
        let raw = match self.storage.get_item(USER_DETAILS_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read cached profile");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::warn!(key = USER_DETAILS_KEY, error = %err, "cached profile is corrupt");
                None
            }
        }
    }

    async fn cache_profile(&self, profile: &UserProfile) {
        let encoded = match serde_json::to_string(profile) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode profile");
                return;
            }
        };
        if let Err(err) = self.storage.set_item(USER_DETAILS_KEY, encoded).await {
            tracing::warn!(error = %err, "failed to cache profile");
        }
    }
}
