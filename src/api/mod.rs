use rocket::{
    http::Status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route,
};

mod auth;
mod elections;
mod users;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(users::routes());
    routes.extend(auth::routes());
    routes.extend(elections::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

/// Keep the `{"error": message}` shape even for failures that never reach a
/// handler (bad routes, guard failures, framing errors).
#[catch(default)]
fn default_catcher(status: Status, _req: &Request) -> (Status, Json<Value>) {
    (status, Json(json!({ "error": status.reason_lossy() })))
}
