use mongodb::{bson::doc, options::FindOptions};
use rocket::{futures::TryStreamExt, http::Status, serde::json::Json, Route};

use crate::error::{Error, Result};
use crate::model::{
    api::election::{CandidateSummary, ElectionDescription, ElectionSpec, ElectionSummary},
    auth::Authenticated,
    db::election::{Election, ElectionId, ELECTION_ID_ATTEMPTS},
    mongodb::{is_duplicate_key_error, Coll},
};

pub fn routes() -> Vec<Route> {
    routes![create_election, elections, election, candidates]
}

#[post("/elections", data = "<spec>", format = "json")]
async fn create_election(
    caller: Authenticated,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
) -> Result<(Status, Json<ElectionDescription>)> {
    let mut election = spec.0.into_election(caller.user.id)?;

    // The election and its candidate set go in as one document, so the
    // insert is atomic. The unique `_id` index arbitrates short-id
    // collisions; on one, retry with a fresh id up to the bound.
    for _ in 0..ELECTION_ID_ATTEMPTS {
        match elections.insert_one(&election, None).await {
            Ok(_) => {
                info!(
                    "user {} created election {}",
                    election.created_by, election.id
                );
                return Ok((Status::Created, Json(election.into())));
            }
            Err(err) if is_duplicate_key_error(&err) => {
                election.id = ElectionId::generate();
            }
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::internal("could not allocate a unique election id"))
}

#[get("/elections")]
async fn elections(elections: Coll<Election>) -> Result<Json<Vec<ElectionSummary>>> {
    // Sort by creation time so repeated listings are identically ordered.
    let by_creation = FindOptions::builder()
        .sort(doc! { "created_at": 1, "_id": 1 })
        .build();
    let all: Vec<Election> = elections.find(None, by_creation).await?.try_collect().await?;
    Ok(Json(all.into_iter().map(ElectionSummary::from).collect()))
}

#[get("/elections/<election_id>")]
async fn election(
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<Json<ElectionDescription>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("No election with ID '{election_id}'")))?;
    Ok(Json(election.into()))
}

#[get("/elections/<election_id>/candidates")]
async fn candidates(
    election_id: ElectionId,
    elections: Coll<Election>,
) -> Result<Json<Vec<CandidateSummary>>> {
    let election = elections
        .find_one(election_id.as_doc(), None)
        .await?
        .ok_or_else(|| Error::not_found(format!("No election with ID '{election_id}'")))?;
    let roster = election
        .election
        .candidates
        .into_iter()
        .map(CandidateSummary::from)
        .collect();
    Ok(Json(roster))
}
