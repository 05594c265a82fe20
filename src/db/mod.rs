//! MongoDB access layer
//!
//! Typed collections with schema-declared indexes and soft deletes.

pub mod mongo;
pub mod schemas;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection, MutMetadata};
