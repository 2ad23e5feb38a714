// store/memory.rs
//
// In-memory implementation of the store contract. The engines are exercised
// against this before the Postgres backend; it mirrors the schema's two
// partial uniqueness keys for votes and can inject an options-insert failure
// to drive the compensating-rollback path.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{PollStore, StoreError};
use crate::models::{Poll, PollOption, Vote};

#[derive(Default)]
struct Inner {
    polls: Vec<Poll>,
    options: Vec<PollOption>,
    votes: Vec<Vote>,
    fail_next_options_insert: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `insert_options` call fail, simulating a backend
    /// fault between the poll insert and the options insert.
    pub fn fail_next_options_insert(&self) {
        self.inner.lock().unwrap().fail_next_options_insert = true;
    }
}

fn same_identity(a: &Vote, b: &Vote) -> bool {
    match (a.user_id, b.user_id) {
        (Some(left), Some(right)) => left == right,
        (None, None) => {
            a.ip_address == b.ip_address
                && a.user_agent == b.user_agent
                && a.session_fingerprint == b.session_fingerprint
        }
        _ => false,
    }
}

#[async_trait]
impl PollStore for MemoryStore {
    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        self.inner.lock().unwrap().polls.push(poll.clone());
        Ok(())
    }

    async fn fetch_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.polls.iter().find(|p| p.id == id).cloned())
    }

    async fn poll_owner(&self, id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.polls.iter().find(|p| p.id == id).map(|p| p.creator_id))
    }

    async fn list_polls(&self) -> Result<Vec<Poll>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut polls = inner.polls.clone();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }

    async fn update_poll(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(poll) = inner.polls.iter_mut().find(|p| p.id == id) {
            poll.title = title.to_string();
            poll.description = description.map(String::from);
            poll.updated_at = updated_at;
        }
        Ok(())
    }

    async fn delete_poll(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.polls.retain(|p| p.id != id);
        // Same referential policy as the schema's ON DELETE CASCADE.
        inner.options.retain(|o| o.poll_id != id);
        inner.votes.retain(|v| v.poll_id != id);
        Ok(())
    }

    async fn insert_options(&self, options: &[PollOption]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_options_insert {
            inner.fail_next_options_insert = false;
            return Err(StoreError::Unavailable("injected options failure".to_string()));
        }
        inner.options.extend_from_slice(options);
        Ok(())
    }

    async fn delete_options(&self, poll_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let removed: Vec<Uuid> = inner
            .options
            .iter()
            .filter(|o| o.poll_id == poll_id)
            .map(|o| o.id)
            .collect();
        inner.options.retain(|o| o.poll_id != poll_id);
        inner.votes.retain(|v| !removed.contains(&v.option_id));
        Ok(())
    }

    async fn options_for_poll(&self, poll_id: Uuid) -> Result<Vec<PollOption>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut options: Vec<PollOption> = inner
            .options
            .iter()
            .filter(|o| o.poll_id == poll_id)
            .cloned()
            .collect();
        options.sort_by_key(|o| o.order_index);
        Ok(options)
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let collision = inner
            .votes
            .iter()
            .any(|existing| existing.poll_id == vote.poll_id && same_identity(existing, vote));
        if collision {
            return Err(StoreError::UniqueViolation);
        }
        inner.votes.push(vote.clone());
        Ok(())
    }

    async fn vote_counts(&self, poll_id: Uuid) -> Result<HashMap<Uuid, i64>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        for vote in inner.votes.iter().filter(|v| v.poll_id == poll_id) {
            *counts.entry(vote.option_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
