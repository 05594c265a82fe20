//! MongoDB client and collection wrapper

use bson::{doc, DateTime, Document};
use futures_util::{Stream, TryStreamExt};
use mongodb::{
    options::{ClientOptions, IndexOptions},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::info;

use crate::db::schemas::Metadata;
use crate::types::TrackerError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping the database
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, TrackerError> {
        info!("Connecting to MongoDB at {}", redact_uri(uri));

        let options = client_options(uri).await?;
        let client = Client::with_options(options)
            .map_err(|e| TrackerError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| TrackerError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, creating its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, TrackerError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, TrackerError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), TrackerError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| TrackerError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, filling in missing metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<(), TrackerError> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        let now = DateTime::now();
        metadata.created_at.get_or_insert(now);
        metadata.updated_at.get_or_insert(now);

        self.inner
            .insert_one(item)
            .await
            .map_err(|e| TrackerError::Database(format!("Insert failed: {}", e)))?;

        Ok(())
    }

    /// Find one live document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, TrackerError> {
        self.inner
            .find_one(live(filter))
            .await
            .map_err(|e| TrackerError::Database(format!("Find failed: {}", e)))
    }

    /// Find live documents by filter in the given sort order
    pub async fn find_sorted(&self, filter: Document, sort: Document) -> Result<Vec<T>, TrackerError> {
        let cursor = self
            .inner
            .find(live(filter))
            .sort(sort)
            .await
            .map_err(|e| TrackerError::Database(format!("Find failed: {}", e)))?;

        collect_documents(cursor).await
    }

    /// Replace a live document; returns whether one matched
    pub async fn replace_one(&self, filter: Document, item: T) -> Result<bool, TrackerError> {
        let result = self
            .inner
            .replace_one(live(filter), item)
            .await
            .map_err(|e| TrackerError::Database(format!("Replace failed: {}", e)))?;

        Ok(result.matched_count > 0)
    }

    /// Replace or insert the document matching `filter`
    pub async fn upsert_one(&self, filter: Document, item: T) -> Result<(), TrackerError> {
        self.inner
            .replace_one(filter, item)
            .upsert(true)
            .await
            .map_err(|e| TrackerError::Database(format!("Upsert failed: {}", e)))?;

        Ok(())
    }

    /// Soft delete a live document
    pub async fn soft_delete(&self, filter: Document) -> Result<UpdateResult, TrackerError> {
        let update = doc! {
            "$set": {
                "metadata.is_deleted": true,
                "metadata.deleted_at": DateTime::now(),
                "metadata.updated_at": DateTime::now(),
            }
        };

        self.inner
            .update_one(live(filter), update)
            .await
            .map_err(|e| TrackerError::Database(format!("Delete failed: {}", e)))
    }
}

/// Parse a connection string, failing fast on an unreachable server unless
/// the URI sets its own timeouts
async fn client_options(uri: &str) -> Result<ClientOptions, TrackerError> {
    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(|e| TrackerError::Database(format!("Invalid MongoDB URI: {}", e)))?;
    options.server_selection_timeout = options.server_selection_timeout.or(Some(CONNECT_TIMEOUT));
    options.connect_timeout = options.connect_timeout.or(Some(CONNECT_TIMEOUT));
    Ok(options)
}

/// Drain a cursor; one undecodable document fails the whole read
async fn collect_documents<T, E>(
    cursor: impl Stream<Item = Result<T, E>>,
) -> Result<Vec<T>, TrackerError>
where
    E: std::fmt::Display,
{
    cursor
        .try_collect()
        .await
        .map_err(|e| TrackerError::Database(format!("Error reading document: {}", e)))
}

/// Exclude soft-deleted documents
fn live(mut filter: Document) -> Document {
    filter.insert("metadata.is_deleted", doc! { "$ne": true });
    filter
}

/// Hide credentials in a connection string before logging it
fn redact_uri(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &uri[..scheme_end], &uri[at + 1..])
        }
        _ => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Collection behaviour needs a running MongoDB; only pure helpers are covered here.

    #[test]
    fn test_live_filter_excludes_deleted() {
        let filter = live(doc! { "student_id": "s1" });
        assert_eq!(filter.get_str("student_id").unwrap(), "s1");
        assert!(filter.get_document("metadata.is_deleted").is_ok());
    }

    #[tokio::test]
    async fn test_client_options_keep_database_path() {
        let options = client_options("mongodb://user:pw@localhost:27017/admin")
            .await
            .unwrap();
        assert_eq!(options.default_database.as_deref(), Some("admin"));
        assert_eq!(options.server_selection_timeout, Some(CONNECT_TIMEOUT));
        assert_eq!(options.connect_timeout, Some(CONNECT_TIMEOUT));

        let options = client_options("mongodb://localhost:27017/?connectTimeoutMS=500")
            .await
            .unwrap();
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(500)));
        assert_eq!(options.server_selection_timeout, Some(CONNECT_TIMEOUT));

        assert!(client_options("not-a-uri").await.is_err());
    }

    #[tokio::test]
    async fn test_undecodable_document_fails_the_read() {
        let good = futures_util::stream::iter(vec![Ok::<_, String>(1), Ok(2)]);
        assert_eq!(collect_documents(good).await.unwrap(), vec![1, 2]);

        let corrupt = futures_util::stream::iter(vec![
            Ok(1),
            Err("invalid type: string, expected u32".to_string()),
            Ok(3),
        ]);
        let err = collect_documents(corrupt).await.unwrap_err();
        assert!(matches!(err, TrackerError::Database(_)));
        assert!(err.to_string().contains("invalid type"));
    }

    #[test]
    fn test_redact_uri() {
        assert_eq!(
            redact_uri("mongodb://user:pw@db.internal:27017"),
            "mongodb://***@db.internal:27017"
        );
        assert_eq!(redact_uri("mongodb://localhost:27017"), "mongodb://localhost:27017");
    }
}
