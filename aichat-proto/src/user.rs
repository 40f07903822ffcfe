//! Session user, country directory entries, and login input validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum number of digits in a national phone number.
pub const PHONE_MIN_DIGITS: usize = 7;

/// Maximum number of digits in a national phone number (E.164 limit).
pub const PHONE_MAX_DIGITS: usize = 15;

/// Number of digits in a one-time password.
pub const OTP_LEN: usize = 6;

/// Unique identifier for a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new user identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `UserId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The session user created by OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque identity.
    pub id: UserId,
    /// National phone number, digits only.
    pub phone: String,
    /// Country dial code including the leading `+`.
    pub country_code: String,
    /// Whether the OTP check succeeded.
    pub is_authenticated: bool,
}

impl User {
    /// Creates an authenticated user for the given number.
    pub fn authenticated(phone: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            phone: phone.into(),
            country_code: country_code.into(),
            is_authenticated: true,
        }
    }

    /// Full number in `+<code><phone>` form.
    #[must_use]
    pub fn full_number(&self) -> String {
        format!("{}{}", self.country_code, self.phone)
    }
}

/// An entry of the country/dial-code selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    /// Common English name.
    pub name: String,
    /// Dial code including the leading `+`.
    pub dial_code: String,
    /// Flag emoji, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
}

/// Error returned when login input fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Phone number is empty.
    #[error("phone number is required")]
    PhoneEmpty,
    /// Phone number contains characters other than digits and separators.
    #[error("phone number may only contain digits")]
    PhoneInvalidChars,
    /// Phone number has too few or too many digits.
    #[error("phone number must have {min}-{max} digits (got {digits})")]
    PhoneLength {
        /// Number of digits supplied.
        digits: usize,
        /// Minimum allowed.
        min: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// Country code is not `+` followed by 1-4 digits.
    #[error("invalid country code '{0}'")]
    CountryCode(String),
    /// OTP does not have exactly [`OTP_LEN`] characters.
    #[error("OTP must be {OTP_LEN} digits (got {0})")]
    OtpLength(usize),
    /// OTP contains a non-digit.
    #[error("OTP may only contain digits")]
    OtpNonDigit,
}

/// Validates a phone number and returns it with separators removed.
///
/// Spaces, dashes, dots and parentheses are accepted as separators.
///
/// # Errors
///
/// Returns [`ValidationError`] if the number is empty, contains other
/// characters, or has a digit count outside
/// [`PHONE_MIN_DIGITS`]..=[`PHONE_MAX_DIGITS`].
pub fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::PhoneEmpty);
    }

    let mut digits = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(ValidationError::PhoneInvalidChars),
        }
    }

    let count = digits.len();
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&count) {
        return Err(ValidationError::PhoneLength {
            digits: count,
            min: PHONE_MIN_DIGITS,
            max: PHONE_MAX_DIGITS,
        });
    }
    Ok(digits)
}

/// Validates a dial code such as `+1` or `+44`.
///
/// # Errors
///
/// Returns [`ValidationError::CountryCode`] unless the code is `+` followed
/// by one to four digits.
pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    let digits = code
        .strip_prefix('+')
        .ok_or_else(|| ValidationError::CountryCode(code.to_string()))?;
    if digits.is_empty() || digits.len() > 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::CountryCode(code.to_string()));
    }
    Ok(())
}

/// Validates a one-time password: exactly [`OTP_LEN`] ASCII digits.
///
/// # Errors
///
/// Returns [`ValidationError::OtpLength`] or [`ValidationError::OtpNonDigit`].
pub fn validate_otp(code: &str) -> Result<(), ValidationError> {
    let code = code.trim();
    let len = code.chars().count();
    if len != OTP_LEN {
        return Err(ValidationError::OtpLength(len));
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::OtpNonDigit);
    }
    Ok(())
}
