use mongodb::bson::doc;
use rocket::{http::Status, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::user::{RegisterRequest, RegisterResponse, UserResponse},
    auth::Authenticated,
    db::{
        audit::{self, AuditAction, AuditEntry},
        user::NewUser,
    },
    mongodb::{is_duplicate_key_error, Coll, Id},
};

pub fn routes() -> Vec<Route> {
    routes![register, whoami]
}

#[post("/users", data = "<request>", format = "json")]
async fn register(
    request: Json<RegisterRequest>,
    users: Coll<NewUser>,
    audit: Coll<AuditEntry>,
) -> Result<(Status, Json<RegisterResponse>)> {
    let user = request.0.into_user()?;

    // Pre-check for a friendly error message; the unique indexes still
    // close the race window between this check and the insert.
    let mut identifiers = Vec::new();
    if let Some(ref email) = user.email {
        identifiers.push(doc! { "email": email });
    }
    if let Some(ref phone) = user.phone {
        identifiers.push(doc! { "phone": phone });
    }
    let taken = users
        .find_one(doc! { "$or": identifiers }, None)
        .await?
        .is_some();
    if taken {
        return Err(Error::conflict("email or phone already registered"));
    }

    let id: Id = match users.insert_one(&user, None).await {
        Ok(result) => result
            .inserted_id
            .as_object_id()
            .unwrap() // Safe because the ID comes directly from the database.
            .into(),
        // Concurrent registration beat us to the index.
        Err(err) if is_duplicate_key_error(&err) => {
            return Err(Error::conflict("email or phone already registered"));
        }
        Err(err) => return Err(err.into()),
    };

    audit::record(&audit, AuditEntry::new(AuditAction::Registered, id)).await;

    Ok((Status::Created, Json(RegisterResponse { id })))
}

#[get("/auth/me")]
async fn whoami(caller: Authenticated) -> Json<UserResponse> {
    Json(caller.user.into())
}
