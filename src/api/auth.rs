use mongodb::bson::doc;
use rocket::{serde::json::Json, Route, State};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    api::auth::{LoginRequest, TokenResponse},
    auth::AuthClaims,
    db::{
        audit::{self, AuditAction, AuditEntry},
        user::User,
    },
    mongodb::Coll,
};

pub fn routes() -> Vec<Route> {
    routes![login]
}

#[post("/auth/login", data = "<request>", format = "json")]
async fn login(
    request: Json<LoginRequest>,
    users: Coll<User>,
    audit: Coll<AuditEntry>,
    config: &State<Config>,
) -> Result<Json<TokenResponse>> {
    let identifier = request.identifier.trim();
    if identifier.is_empty() || request.password.is_empty() {
        return Err(Error::validation("identifier and password are required"));
    }

    // The identifier matches either a stored email or a stored phone.
    // Unknown identifier and wrong password produce the same generic error
    // so that registered identifiers cannot be probed.
    let with_identifier = doc! {
        "$or": [{ "email": identifier }, { "phone": identifier }]
    };
    let user = users
        .find_one(with_identifier, None)
        .await?
        .filter(|user| user.verify_password(&request.password))
        .ok_or_else(|| Error::unauthorized("invalid credentials"))?;

    let token = AuthClaims::new(&user).encode(config);

    audit::record(&audit, AuditEntry::new(AuditAction::LoggedIn, user.id)).await;

    Ok(Json(TokenResponse { token }))
}
