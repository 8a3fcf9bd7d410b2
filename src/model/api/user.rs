use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    db::user::{NewUser, User, UserCore},
    mongodb::Id,
};

pub const MIN_NAME_LENGTH: usize = 2;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Deliberately loose: the real check is the confirmation mail we don't
/// send yet, so just reject obvious garbage.
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// A leading `+` or digit followed by 6-20 digits, spaces or hyphens.
static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+0-9][0-9 \-]{6,20}$").unwrap());

/// A registration request, received from a user. Never stored directly,
/// since the password is in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl RegisterRequest {
    /// Validate this request and convert it into a storable user by
    /// hashing the password.
    pub fn into_user(self) -> Result<NewUser> {
        let name = self.name.trim().to_string();
        if name.len() < MIN_NAME_LENGTH {
            return Err(Error::validation(format!(
                "name must be at least {MIN_NAME_LENGTH} characters"
            )));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }

        let email = normalize(self.email);
        let phone = normalize(self.phone);
        if email.is_none() && phone.is_none() {
            return Err(Error::validation(
                "an email address or phone number is required",
            ));
        }
        if let Some(ref email) = email {
            if !EMAIL_REGEX.is_match(email) {
                return Err(Error::validation(format!("malformed email address: {email}")));
            }
        }
        if let Some(ref phone) = phone {
            if !PHONE_REGEX.is_match(phone) {
                return Err(Error::validation(format!("malformed phone number: {phone}")));
            }
        }

        UserCore::new(name, email, phone, &self.password)
    }
}

/// Treat whitespace-only identifiers as absent.
fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Response to a successful registration: only the new id, never the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub id: Id,
}

/// A safe user projection: everything the user may see about themselves,
/// and nothing derived from their password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Id,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.user.name,
            email: user.user.email,
            phone: user.user.phone,
            created_at: user.user.created_at,
        }
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl RegisterRequest {
        pub fn example() -> Self {
            Self {
                name: "Ada Lovelace".to_string(),
                email: Some("ada@example.com".to_string()),
                phone: None,
                password: "correct horse".to_string(),
            }
        }

        pub fn example_phone_only() -> Self {
            Self {
                name: "Charles Babbage".to_string(),
                email: None,
                phone: Some("+44 1234 567890".to_string()),
                password: "difference engine".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rocket::serde::json::serde_json;

    #[test]
    fn valid_registrations() {
        let user = RegisterRequest::example().into_user().unwrap();
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
        assert_eq!(user.phone, None);
        assert!(user.verify_password("correct horse"));

        let user = RegisterRequest::example_phone_only().into_user().unwrap();
        assert_eq!(user.email, None);
        assert_eq!(user.phone.as_deref(), Some("+44 1234 567890"));
    }

    #[test]
    fn name_too_short() {
        let mut request = RegisterRequest::example();
        request.name = " A ".to_string();
        assert!(matches!(
            request.into_user(),
            Err(crate::error::Error::Validation(_))
        ));
    }

    #[test]
    fn password_too_short() {
        let mut request = RegisterRequest::example();
        request.password = "12345".to_string();
        assert!(matches!(
            request.into_user(),
            Err(crate::error::Error::Validation(_))
        ));
    }

    #[test]
    fn identifier_required() {
        let mut request = RegisterRequest::example();
        request.email = None;
        request.phone = None;
        assert!(request.clone().into_user().is_err());

        // Whitespace-only identifiers count as absent.
        request.email = Some("   ".to_string());
        assert!(request.into_user().is_err());
    }

    #[test]
    fn malformed_email() {
        for email in ["not-an-email", "a@b", "two@at@signs.com", "spaces in@it.com"] {
            let mut request = RegisterRequest::example();
            request.email = Some(email.to_string());
            assert!(request.into_user().is_err(), "accepted {email}");
        }
    }

    #[test]
    fn malformed_phone() {
        for phone in ["12345", "-441234567890", "+44_1234_567890", "phone"] {
            let mut request = RegisterRequest::example_phone_only();
            request.phone = Some(phone.to_string());
            assert!(request.into_user().is_err(), "accepted {phone}");
        }
    }

    #[test]
    fn phone_formats_accepted() {
        for phone in ["+441234567890", "0123 456-789", "+1 555-0100"] {
            let mut request = RegisterRequest::example_phone_only();
            request.phone = Some(phone.to_string());
            assert!(request.into_user().is_ok(), "rejected {phone}");
        }
    }

    #[test]
    fn projection_never_exposes_hash() {
        let user = crate::model::db::user::User::example();
        let response = UserResponse::from(user);
        let value = serde_json::to_value(&response).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.contains_key("id"));
        assert!(object.contains_key("name"));
        assert!(!object.contains_key("password_hash"));
        assert!(!object.contains_key("is_admin"));
    }
}
