//! User identity, profile, and authentication request bodies.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a signed-in user. All remote task documents are
/// scoped under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wraps an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public profile of a user, returned by sign-in and cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User identifier.
    pub uid: UserId,
    /// Sign-in email address.
    pub email: String,
    /// Display name captured at sign-up.
    pub full_name: String,
}

/// Body of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    /// Display name.
    pub full_name: String,
    /// Email address used to sign in.
    pub email: String,
    /// Plain-text password (hashed by the backend).
    pub password: String,
}

/// Body of a sign-in request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    /// Email address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Error body returned by the backend for any non-2xx response.
///
/// `code` uses the `auth/...` namespace for authentication failures and
/// `tasks/...` for document failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable detail.
    pub message: String,
}

impl ErrorBody {
    /// Builds an error body from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Well-known backend error codes.
pub mod codes {
    /// Sign-up with an email that already has an account.
    pub const EMAIL_ALREADY_IN_USE: &str = "auth/email-already-in-use";
    /// Malformed email address.
    pub const INVALID_EMAIL: &str = "auth/invalid-email";
    /// Password shorter than the minimum length.
    pub const WEAK_PASSWORD: &str = "auth/weak-password";
    /// The backend could not be reached.
    pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
    /// No account for the given email.
    pub const USER_NOT_FOUND: &str = "auth/user-not-found";
    /// Credentials were malformed.
    pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
    /// Password did not match.
    pub const WRONG_PASSWORD: &str = "auth/wrong-password";
    /// Update of a task document that does not exist.
    pub const TASK_NOT_FOUND: &str = "tasks/not-found";
    /// Request body did not match the document it targets.
    pub const TASK_ID_MISMATCH: &str = "tasks/id-mismatch";
}
