use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::Responder,
    serde::json::{json, Json},
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while handling a request. Each variant maps
/// to exactly one HTTP status, and every variant renders as a uniform
/// `{"error": message}` JSON body.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            // Storage failures must surface loudly rather than degrade to
            // silently lost writes.
            Self::Db(_) | Self::Argon2(_) | Self::Internal(_) => Status::InternalServerError,
            // Any token failure (bad signature, malformed, expired) is
            // indistinguishable "no identity".
            Self::Jwt(_) | Self::Unauthorized(_) => Status::Unauthorized,
            Self::Validation(_) => Status::BadRequest,
            Self::Conflict(_) => Status::Conflict,
            Self::Forbidden(_) => Status::Forbidden,
            Self::NotFound(_) => Status::NotFound,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.class() == rocket::http::StatusClass::ServerError {
            error!("{self}");
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            Error::validation("bad field").status(),
            Status::BadRequest
        );
        assert_eq!(Error::conflict("taken").status(), Status::Conflict);
        assert_eq!(
            Error::unauthorized("no token").status(),
            Status::Unauthorized
        );
        assert_eq!(Error::forbidden("not admin").status(), Status::Forbidden);
        assert_eq!(Error::not_found("no election").status(), Status::NotFound);
        assert_eq!(
            Error::internal("id space exhausted").status(),
            Status::InternalServerError
        );
    }
}
