use std::fmt;

use serde::{Deserialize, Serialize};

// -- Sign up --

#[derive(Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct VerifyCodeRequest {
    pub code: String,
}

// -- Sign in --

/// `identifier` is either an email address or a username.
#[derive(Clone)]
pub struct SignInRequest {
    pub identifier: String,
    pub password: String,
}

impl fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInRequest")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

// -- Session --

/// An authenticated session as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    /// Primary email on the account, if the provider knows one.
    pub primary_email: Option<String>,
}
