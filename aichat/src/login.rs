//! Phone-number login.
//!
//! ```text
//!   EnterPhone ──submit_phone──► OtpSent ──submit_otp──► Verified
//!        ▲                        │  ▲
//!        └─────────back───────────┘  └──resend
//! ```
//!
//! Input is validated before any call to the [`AuthService`], so malformed
//! input fails immediately and leaves the step unchanged.

use aichat_proto::user::{
    Country, User, ValidationError, normalize_phone, validate_country_code, validate_otp,
};

use crate::notify::Notifier;
use crate::services::auth::{AuthError, AuthService};
use crate::services::countries::{CountryDirectory, load_countries};
use crate::store::{SharedStore, SnapshotStorage};

/// Where the login flow currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginStep {
    /// Waiting for a phone number.
    EnterPhone,
    /// A code was sent to this number.
    OtpSent {
        /// Digits-only national number.
        phone: String,
        /// Dial code including `+`.
        country_code: String,
    },
    /// The user is signed in.
    Verified(User),
}

/// Errors returned by [`LoginFlow`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// Input is malformed; nothing was submitted.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The authentication service refused the request.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The operation needs a code to have been sent first.
    #[error("no verification code has been sent")]
    NoCodeSent,
}

/// Drives the login screens against an [`AuthService`].
#[derive(Debug)]
pub struct LoginFlow<A> {
    auth: A,
    notifier: Notifier,
    step: LoginStep,
    countries: Vec<Country>,
}

impl<A: AuthService> LoginFlow<A> {
    /// Creates a flow at [`LoginStep::EnterPhone`].
    pub const fn new(auth: A, notifier: Notifier) -> Self {
        Self {
            auth,
            notifier,
            step: LoginStep::EnterPhone,
            countries: Vec::new(),
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> &LoginStep {
        &self.step
    }

    /// Countries loaded by [`start`](Self::start).
    #[must_use]
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Resets to [`LoginStep::EnterPhone`] and loads the dial-code list.
    ///
    /// A lookup failure leaves the list empty and emits a notice.
    pub async fn start<D: CountryDirectory>(&mut self, directory: &D) {
        self.step = LoginStep::EnterPhone;
        self.countries = load_countries(directory, &self.notifier).await;
    }

    /// Validates the number and sends a code to it.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Invalid`] for a malformed number or dial code,
    /// or [`LoginError::Auth`] if the send fails.
    pub async fn submit_phone(&mut self, phone: &str, country_code: &str) -> Result<(), LoginError> {
        let country_code = country_code.trim();
        validate_country_code(country_code)?;
        let phone = normalize_phone(phone)?;

        self.auth.send_otp(&phone, country_code).await?;
        self.notifier
            .success(format!("Verification code sent to {country_code} {phone}"));
        self.step = LoginStep::OtpSent {
            phone,
            country_code: country_code.to_string(),
        };
        Ok(())
    }

    /// Sends a fresh code to the number already entered.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::NoCodeSent`] outside [`LoginStep::OtpSent`], or
    /// [`LoginError::Auth`] if the send fails.
    pub async fn resend(&mut self) -> Result<(), LoginError> {
        let LoginStep::OtpSent {
            phone,
            country_code,
        } = &self.step
        else {
            return Err(LoginError::NoCodeSent);
        };
        self.auth.send_otp(phone, country_code).await?;
        self.notifier.info("A new verification code was sent");
        Ok(())
    }

    /// Checks the code and, on success, signs the user into `store`.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::NoCodeSent`] outside [`LoginStep::OtpSent`],
    /// [`LoginError::Invalid`] if the code is not six digits, or
    /// [`LoginError::Auth`] if verification fails.
    pub async fn submit_otp<S: SnapshotStorage>(
        &mut self,
        store: &SharedStore<S>,
        code: &str,
    ) -> Result<User, LoginError> {
        let LoginStep::OtpSent {
            phone,
            country_code,
        } = &self.step
        else {
            return Err(LoginError::NoCodeSent);
        };
        let code = code.trim();
        validate_otp(code)?;

        let user = self.auth.verify_otp(phone, country_code, code).await?;
        store.lock().set_user(Some(user.clone()));
        tracing::info!(user_id = %user.id, "signed in");
        self.notifier.success("Phone number verified");
        self.step = LoginStep::Verified(user.clone());
        Ok(user)
    }

    /// Returns to [`LoginStep::EnterPhone`].
    pub fn back(&mut self) {
        self.step = LoginStep::EnterPhone;
    }
}
