use anyhow::Context;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime, Document},
    Collection,
};
use serde::{Deserialize, Serialize};

/// A user record as stored in the `users` collection. Field names here are
/// the wire names. `password` holds the hash and never leaves the API; the
/// outbound view is `dto::Profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    pub password: String,
    pub city: String,
    pub skills: Vec<String>,
    pub experience: f64,
    pub portfolio: String,
    pub profile_pic: String,
    pub created_at: DateTime,
}

impl User {
    pub async fn find_by_email(
        users: &Collection<User>,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = users.find_one(doc! { "email": email }).await?;
        Ok(user)
    }

    pub async fn find_by_id(
        users: &Collection<User>,
        id: ObjectId,
    ) -> anyhow::Result<Option<User>> {
        let user = users.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    /// Insert a new record and return the store-assigned id.
    pub async fn insert(users: &Collection<User>, user: &User) -> anyhow::Result<ObjectId> {
        let result = users.insert_one(user).await?;
        result
            .inserted_id
            .as_object_id()
            .context("store returned a non-ObjectId insert id")
    }

    /// Apply a partial `$set` and report how many records matched the id.
    pub async fn apply_update(
        users: &Collection<User>,
        id: ObjectId,
        set: Document,
    ) -> anyhow::Result<u64> {
        let result = users
            .update_one(doc! { "_id": id }, doc! { "$set": set })
            .await?;
        Ok(result.matched_count)
    }

    /// Full collection scan, newest first. Unpaginated.
    pub async fn list_newest_first(users: &Collection<User>) -> anyhow::Result<Vec<User>> {
        let cursor = users.find(doc! {}).sort(doc! { "createdAt": -1 }).await?;
        let all = cursor.try_collect().await?;
        Ok(all)
    }
}
