use std::ops::{Deref, DerefMut};

use argon2::Config;
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::mongodb::Id;

/// Core user data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct UserCore {
    /// Display name.
    pub name: String,
    /// Email address; at least one of email and phone is always present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Argon2-encoded password hash. Never exposed via any projection.
    pub password_hash: String,
    /// Administrative privileges. No endpoint currently mutates this;
    /// promotion is a manual operation against the database.
    pub is_admin: bool,
    /// Creation time, set once.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl UserCore {
    /// Create a new user, hashing the given plaintext password.
    pub fn new(
        name: String,
        email: Option<String>,
        phone: Option<String>,
        password: &str,
    ) -> Result<Self> {
        Ok(Self {
            name,
            email,
            phone,
            password_hash: hash_password(password)?,
            is_admin: false,
            created_at: Utc::now(),
        })
    }

    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        // A malformed stored hash counts as a failed verification; the only
        // way to create a `UserCore` is via `new`, so it shouldn't happen.
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }
}

/// Derive a salted password hash.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    let hash = argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())?;
    Ok(hash)
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the database, with its unique ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub user: UserCore,
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl DerefMut for User {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.user
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    use mongodb::bson::oid::ObjectId;

    impl UserCore {
        pub fn example() -> Self {
            Self::new(
                "Ada Lovelace".to_string(),
                Some("ada@example.com".to_string()),
                Some("+441234567890".to_string()),
                "correct horse",
            )
            .unwrap()
        }
    }

    impl User {
        pub fn example() -> Self {
            Self {
                id: ObjectId::new().into(),
                user: UserCore::example(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_verification() {
        let user = UserCore::example();
        assert!(user.verify_password("correct horse"));
        assert!(!user.verify_password("battery staple"));
        assert!(!user.verify_password(""));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("hunter22").unwrap();
        let second = hash_password("hunter22").unwrap();
        assert_ne!(first, second);
        assert!(argon2::verify_encoded(&first, b"hunter22").unwrap());
    }

    #[test]
    fn new_users_are_not_admin() {
        assert!(!UserCore::example().is_admin);
    }
}
