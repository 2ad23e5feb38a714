//! Persistence seam over the hosted datastore.
//!
//! The engines only see [`PollStore`]; production wires in the Postgres
//! implementation while tests run against the in-memory one, which enforces
//! the same vote-uniqueness contract.

pub mod memory;
pub mod pg;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Poll, PollOption, Vote};

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A row collided with a uniqueness constraint. For this schema that
    /// means a second vote under an identity key that already voted.
    #[error("unique constraint violated")]
    UniqueViolation,

    #[error("datastore unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

/// Collection-style operations over the polls, poll_options and votes
/// tables. The vote-uniqueness guarantee lives behind `insert_vote`: of two
/// concurrent inserts with the same identity key, exactly one succeeds and
/// the other returns [`StoreError::UniqueViolation`].
#[async_trait]
pub trait PollStore: Send + Sync {
    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError>;

    async fn fetch_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError>;

    /// Creator id only; used for the pre-mutation ownership check.
    async fn poll_owner(&self, id: Uuid) -> Result<Option<Uuid>, StoreError>;

    /// All polls, newest first.
    async fn list_polls(&self) -> Result<Vec<Poll>, StoreError>;

    /// Patches the poll's mutable fields; the option set is replaced
    /// separately via `delete_options` + `insert_options`.
    async fn update_poll(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn delete_poll(&self, id: Uuid) -> Result<(), StoreError>;

    async fn insert_options(&self, options: &[PollOption]) -> Result<(), StoreError>;

    async fn delete_options(&self, poll_id: Uuid) -> Result<(), StoreError>;

    /// Options for a poll ordered by `order_index`.
    async fn options_for_poll(&self, poll_id: Uuid) -> Result<Vec<PollOption>, StoreError>;

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// Vote count per option id for one poll. Options without votes are
    /// simply absent from the map.
    async fn vote_counts(&self, poll_id: Uuid) -> Result<HashMap<Uuid, i64>, StoreError>;
}
