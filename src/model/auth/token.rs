use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::model::{db::user::User, mongodb::Id};

/// The identity claims embedded in a session token. These are a snapshot
/// taken at issuance; consumers needing fresh attributes must re-resolve
/// the user by id (the `Authenticated` guard does exactly that).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    pub id: Id,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl AuthClaims {
    /// Create claims for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }

    /// Sign these claims into a bearer token expiring `auth_ttl` from now.
    #[allow(clippy::missing_panics_doc)]
    pub fn encode(self, config: &Config) -> String {
        let claims = Claims {
            token: self,
            expire_at: Utc::now() + config.auth_ttl(),
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .expect("JWT encoding is infallible with default settings")
    }

    /// Verify a token's signature and expiry, recovering the claims.
    /// Every path that trusts token claims goes through here; there is
    /// deliberately no decode-without-verify.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        let data: TokenData<Claims> = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )?;
        Ok(data.claims.token)
    }
}

/// Token claims: the identity itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    token: AuthClaims,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    #[test]
    fn roundtrip() {
        let config = Config::example();
        let user = User::example();
        let claims = AuthClaims::new(&user);
        let token = claims.clone().encode(&config);

        let decoded = AuthClaims::decode(&token, &config).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.id, user.id);
    }

    #[test]
    fn tampered_token_rejected() {
        let config = Config::example();
        let token = AuthClaims::new(&User::example()).encode(&config);

        // Flip a character in the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(AuthClaims::decode(&tampered, &config).is_err());

        // Garbage is no identity either.
        assert!(AuthClaims::decode("not-a-jwt", &config).is_err());
        assert!(AuthClaims::decode("", &config).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let config = Config::example();
        let claims = Claims {
            token: AuthClaims::new(&User::example()),
            // Comfortably beyond the default validation leeway.
            expire_at: Utc::now() - Duration::hours(1),
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )
        .unwrap();

        assert!(AuthClaims::decode(&token, &config).is_err());
    }
}
