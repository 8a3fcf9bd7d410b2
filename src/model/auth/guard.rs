use mongodb::Database;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request},
    State,
};

use crate::config::Config;
use crate::error::Error;
use crate::model::{
    db::user::User,
    mongodb::Coll,
};

use super::token::AuthClaims;

/// A request guard for any authenticated caller. Extracts the bearer token
/// from the `Authorization` header, verifies it, and re-resolves the live
/// user record by the embedded id. An absent header, malformed or expired
/// token, or vanished user all fail with 401.
pub struct Authenticated {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Authenticated {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let token = match bearer_token(req) {
            Some(token) => token,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("missing bearer token"),
                ));
            }
        };

        // Verify the signature and expiry. All failure modes look the same
        // to the caller.
        let claims = match AuthClaims::decode(token, config) {
            Ok(claims) => claims,
            Err(_) => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::unauthorized("invalid session token"),
                ));
            }
        };

        // The claims are a snapshot; check the user still exists and use
        // their live record.
        let db = req.guard::<&State<Database>>().await.unwrap();
        match Coll::<User>::from_db(db)
            .find_one(claims.id.as_doc(), None)
            .await
        {
            Ok(Some(user)) => Outcome::Success(Authenticated { user }),
            Ok(None) => Outcome::Failure((
                Status::Unauthorized,
                Error::unauthorized("invalid session token"),
            )),
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}

/// A request guard for administrators: an authenticated caller whose
/// `is_admin` flag is set. No current route requires this, but it is part
/// of the authorization contract.
pub struct AdminUser {
    pub user: User,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match req.guard::<Authenticated>().await {
            Outcome::Success(auth) if auth.user.is_admin => {
                Outcome::Success(AdminUser { user: auth.user })
            }
            Outcome::Success(_) => Outcome::Failure((
                Status::Forbidden,
                Error::forbidden("administrator access required"),
            )),
            Outcome::Failure(failure) => Outcome::Failure(failure),
            Outcome::Forward(forward) => Outcome::Forward(forward),
        }
    }
}

/// Extract the token from a standard `Authorization: Bearer <token>` header.
fn bearer_token<'r>(req: &'r Request<'_>) -> Option<&'r str> {
    req.headers()
        .get_one("Authorization")?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
