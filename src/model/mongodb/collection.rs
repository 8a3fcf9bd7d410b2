use std::ops::Deref;

use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    audit::AuditEntry,
    election::Election,
    user::{NewUser, User},
};

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// User collections
const USERS: &str = "users";
impl MongoCollection for User {
    const NAME: &'static str = USERS;
}
impl MongoCollection for NewUser {
    const NAME: &'static str = USERS;
}

// Election collection
const ELECTIONS: &str = "elections";
impl MongoCollection for Election {
    const NAME: &'static str = ELECTIONS;
}

// Audit collection
const AUDIT: &str = "audit";
impl MongoCollection for AuditEntry {
    const NAME: &'static str = AUDIT;
}

/// Ensure that all the required unique indexes exist on the given database.
/// These indexes are the linearization point for the uniqueness invariants:
/// concurrent inserts race to them, and the loser gets a duplicate key error.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    // Sparse so that users registered with only one of the two identifiers
    // don't collide on the missing field.
    let unique_sparse = IndexOptions::builder().unique(true).sparse(true).build();

    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(unique_sparse.clone())
        .build();
    let phone_index = IndexModel::builder()
        .keys(doc! { "phone": 1 })
        .options(unique_sparse)
        .build();
    let users = Coll::<User>::from_db(db);
    users.create_index(email_index, None).await?;
    users.create_index(phone_index, None).await?;

    // Elections use the string `_id` directly, which is always unique.

    Ok(())
}
