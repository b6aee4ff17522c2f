use std::future::Future;

use thiserror::Error;
use tracing::{info, warn};

use quadmart_types::api::{Session, SignInRequest, SignUpRequest, VerifyCodeRequest};

/// Only addresses ending in this suffix may create accounts or stay signed in.
pub const REQUIRED_DOMAIN: &str = "@u.rochester.edu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    suffix: String,
}

impl DomainPolicy {
    /// `suffix` may be given with or without the leading `@`.
    pub fn new(suffix: &str) -> Self {
        let suffix = suffix.trim().to_lowercase();
        let suffix = if suffix.starts_with('@') {
            suffix
        } else {
            format!("@{suffix}")
        };
        Self { suffix }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn allows(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        email.len() > self.suffix.len() && email.ends_with(&self.suffix)
    }
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self::new(REQUIRED_DOMAIN)
    }
}

/// Error reported by the identity provider, carrying its user-facing message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing info: {0}")]
    MissingInfo(&'static str),

    #[error("Not allowed: use your {domain} email.")]
    DomainNotAllowed { domain: String },

    #[error("Missing code: enter the code we sent to your email.")]
    MissingCode,

    #[error("Verification needed: please complete the verification step.")]
    Incomplete,

    #[error("{action} failed: {message}")]
    Provider { action: &'static str, message: String },
}

impl AuthError {
    fn provider(action: &'static str, e: ProviderError) -> Self {
        let message = if e.message.trim().is_empty() {
            "Try again.".to_string()
        } else {
            e.message
        };
        Self::Provider { action, message }
    }
}

/// The external identity service. Accounts, passwords, email codes and
/// sessions all live there.
pub trait IdentityProvider: Send + Sync {
    /// Create the account and email a verification code.
    fn sign_up(&self, req: &SignUpRequest) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// `None` means the provider wants further steps before issuing a session.
    fn verify_sign_up(
        &self,
        req: &VerifyCodeRequest,
    ) -> impl Future<Output = Result<Option<Session>, ProviderError>> + Send;

    fn resend_code(&self) -> impl Future<Output = Result<(), ProviderError>> + Send;

    fn sign_in(
        &self,
        req: &SignInRequest,
    ) -> impl Future<Output = Result<Option<Session>, ProviderError>> + Send;

    fn sign_out(&self, session: &Session) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

/// Input checks and the domain gate in front of an [`IdentityProvider`].
///
/// Every session handed out has passed [`AuthGate::admit`].
pub struct AuthGate<P> {
    provider: P,
    policy: DomainPolicy,
}

impl<P: IdentityProvider> AuthGate<P> {
    pub fn new(provider: P, policy: DomainPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn sign_up(&self, email: &str, username: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingInfo("all fields are required"));
        }
        self.check_domain(email)?;

        let req = SignUpRequest {
            email: email.trim().to_string(),
            username: username.trim().to_string(),
            password: password.to_string(),
        };
        self.provider
            .sign_up(&req)
            .await
            .map_err(|e| AuthError::provider("Sign up", e))?;

        info!("Sign-up started for {}, verification code sent", req.email);
        Ok(())
    }

    pub async fn verify_sign_up(&self, code: &str) -> Result<Session, AuthError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::MissingCode);
        }

        let session = self
            .provider
            .verify_sign_up(&VerifyCodeRequest { code: code.to_string() })
            .await
            .map_err(|e| AuthError::provider("Verification", e))?
            .ok_or(AuthError::Incomplete)?;

        self.admit(session).await
    }

    pub async fn resend_code(&self) -> Result<(), AuthError> {
        self.provider
            .resend_code()
            .await
            .map_err(|e| AuthError::provider("Resend", e))
    }

    /// `identifier` is an email or a username. An email is checked against
    /// the policy before the provider is contacted; a username is checked
    /// through the session's primary email afterwards.
    pub async fn sign_in(&self, identifier: &str, password: &str) -> Result<Session, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthError::MissingInfo("email/username and password required"));
        }
        if identifier.contains('@') {
            self.check_domain(identifier)?;
        }

        let session = self
            .provider
            .sign_in(&SignInRequest {
                identifier: identifier.to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(|e| AuthError::provider("Sign in", e))?
            .ok_or(AuthError::Incomplete)?;

        self.admit(session).await
    }

    /// Let a session in only if its primary email satisfies the policy;
    /// otherwise sign it out.
    pub async fn admit(&self, session: Session) -> Result<Session, AuthError> {
        let allowed = session
            .primary_email
            .as_deref()
            .is_some_and(|email| self.policy.allows(email));

        if allowed {
            info!("Session {} admitted", session.session_id);
            return Ok(session);
        }

        warn!(
            "Session {} rejected: primary email {:?} outside {}",
            session.session_id, session.primary_email, self.policy.suffix()
        );
        if let Err(e) = self.provider.sign_out(&session).await {
            warn!("Sign-out of rejected session {} failed: {}", session.session_id, e);
        }
        Err(self.not_allowed())
    }

    fn check_domain(&self, email: &str) -> Result<(), AuthError> {
        if self.policy.allows(email) {
            Ok(())
        } else {
            Err(self.not_allowed())
        }
    }

    fn not_allowed(&self) -> AuthError {
        AuthError::DomainNotAllowed {
            domain: self.policy.suffix().to_string(),
        }
    }
}
