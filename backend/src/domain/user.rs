//! User data model as seen by lead synchronisation.
//!
//! Users are owned by the host application; this crate only reads them. The
//! email domain drives eligibility and company matching, so it is derived once
//! when the address is validated.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned when constructing user values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The email address was blank.
    #[error("email address must not be empty")]
    EmptyEmail,
    /// The email address lacks a local part or a domain.
    #[error("email address must have the form local@domain")]
    MalformedEmail,
}

/// Numeric user identifier assigned by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    /// Wrap a raw identifier.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Access the raw identifier.
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated email address with its lower-cased domain.
///
/// # Examples
/// ```
/// use lead_sync::domain::EmailAddress;
///
/// let email = EmailAddress::new("Ada@Example.COM")?;
/// assert_eq!(email.domain(), "example.com");
/// assert_eq!(email.as_ref(), "Ada@Example.COM");
/// # Ok::<(), lead_sync::domain::UserValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress {
    raw: String,
    domain: String,
}

impl EmailAddress {
    /// Validate and construct an address.
    pub fn new(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        Self::from_owned(raw.into())
    }

    fn from_owned(raw: String) -> Result<Self, UserValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }

        let (local, domain) = trimmed
            .rsplit_once('@')
            .ok_or(UserValidationError::MalformedEmail)?;
        if local.is_empty() || domain.is_empty() || domain.contains(char::is_whitespace) {
            return Err(UserValidationError::MalformedEmail);
        }

        let domain = domain.to_ascii_lowercase();
        Ok(Self {
            raw: trimmed.to_owned(),
            domain,
        })
    }

    /// Domain part of the address, lower-cased.
    pub fn domain(&self) -> &str {
        self.domain.as_str()
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.raw.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.raw
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Application user eligible for CRM synchronisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: EmailAddress,
    first_name: String,
    last_name: String,
}

impl User {
    /// Build a user from validated parts.
    pub fn new(
        id: UserId,
        email: EmailAddress,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            email,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Host identifier.
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Shorthand for the email's domain.
    pub fn email_domain(&self) -> &str {
        self.email.domain()
    }

    /// Given name, possibly empty.
    pub fn first_name(&self) -> &str {
        self.first_name.as_str()
    }

    /// Family name, possibly empty.
    pub fn last_name(&self) -> &str {
        self.last_name.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Validation coverage for user values.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ada@example.com", "example.com")]
    #[case("  grace@Navy.MIL ", "navy.mil")]
    #[case("odd@local@corp.example", "corp.example")]
    fn derives_lowercase_domain(#[case] raw: &str, #[case] domain: &str) {
        let email = EmailAddress::new(raw).expect("valid email");
        assert_eq!(email.domain(), domain);
    }

    #[rstest]
    #[case("", UserValidationError::EmptyEmail)]
    #[case("   ", UserValidationError::EmptyEmail)]
    #[case("no-at-sign", UserValidationError::MalformedEmail)]
    #[case("@example.com", UserValidationError::MalformedEmail)]
    #[case("someone@", UserValidationError::MalformedEmail)]
    #[case("someone@exa mple.com", UserValidationError::MalformedEmail)]
    fn rejects_invalid_addresses(#[case] raw: &str, #[case] expected: UserValidationError) {
        assert_eq!(EmailAddress::new(raw), Err(expected));
    }

    #[rstest]
    fn user_exposes_email_domain() {
        let email = EmailAddress::new("ada@Example.com").expect("valid email");
        let user = User::new(UserId::new(7), email, "Ada", "Lovelace");
        assert_eq!(user.email_domain(), "example.com");
        assert_eq!(user.id().get(), 7);
    }

    #[rstest]
    fn email_round_trips_through_serde_as_raw_string() {
        let email = EmailAddress::new("ada@Example.com").expect("valid email");
        let value = serde_json::to_value(&email).expect("serialise");
        assert_eq!(value, serde_json::json!("ada@Example.com"));
    }
}
