//! Phone-number authentication via one-time password.

use std::collections::HashSet;
use std::time::Duration;

use aichat_proto::user::{
    User, ValidationError, normalize_phone, validate_country_code, validate_otp,
};

/// Default latency of an OTP send.
pub const SEND_DELAY: Duration = Duration::from_millis(1500);

/// Default latency of an OTP check.
pub const VERIFY_DELAY: Duration = Duration::from_secs(1);

/// Errors returned by an [`AuthService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The phone number, dial code or code is malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Verification was attempted before a code was sent to this number.
    #[error("no code was sent to {0}")]
    NotRequested(String),
}

/// Sends and checks one-time passwords.
pub trait AuthService: Send + Sync {
    /// Sends a code to `country_code` + `phone`.
    fn send_otp(
        &self,
        phone: &str,
        country_code: &str,
    ) -> impl std::future::Future<Output = Result<(), AuthError>> + Send;

    /// Checks `code` and returns the authenticated user.
    fn verify_otp(
        &self,
        phone: &str,
        country_code: &str,
        code: &str,
    ) -> impl std::future::Future<Output = Result<User, AuthError>> + Send;
}

/// Authenticator that waits a fixed delay and accepts any well-formed code
/// for a number it has sent a code to.
#[derive(Debug)]
pub struct SimulatedAuth {
    send_delay: Duration,
    verify_delay: Duration,
    sent: parking_lot::Mutex<HashSet<String>>,
}

impl Default for SimulatedAuth {
    fn default() -> Self {
        Self::new(SEND_DELAY, VERIFY_DELAY)
    }
}

impl SimulatedAuth {
    /// Creates an authenticator with the given latencies.
    #[must_use]
    pub fn new(send_delay: Duration, verify_delay: Duration) -> Self {
        Self {
            send_delay,
            verify_delay,
            sent: parking_lot::Mutex::new(HashSet::new()),
        }
    }

    fn key(phone: &str, country_code: &str) -> Result<String, AuthError> {
        validate_country_code(country_code)?;
        let digits = normalize_phone(phone)?;
        Ok(format!("{country_code}{digits}"))
    }
}

impl AuthService for SimulatedAuth {
    async fn send_otp(&self, phone: &str, country_code: &str) -> Result<(), AuthError> {
        let key = Self::key(phone, country_code)?;
        tokio::time::sleep(self.send_delay).await;
        tracing::info!(number = %key, "verification code sent");
        self.sent.lock().insert(key);
        Ok(())
    }

    async fn verify_otp(
        &self,
        phone: &str,
        country_code: &str,
        code: &str,
    ) -> Result<User, AuthError> {
        let key = Self::key(phone, country_code)?;
        validate_otp(code)?;
        tokio::time::sleep(self.verify_delay).await;
        if !self.sent.lock().remove(&key) {
            return Err(AuthError::NotRequested(key));
        }
        tracing::info!(number = %key, "verification code accepted");
        let digits = normalize_phone(phone)?;
        Ok(User::authenticated(digits, country_code))
    }
}
