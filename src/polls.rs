//! Poll mutation engine: create, update and delete of a poll together with
//! its ordered option set.
//!
//! The hosted datastore has no cross-table transaction, so multi-step
//! writes use compensating actions instead: a failed options insert during
//! create deletes the just-created poll row, and update replaces the option
//! set delete-then-insert. A reader racing an update can observe the poll
//! with zero options for the width of that window; that is a documented
//! property of the design, not something this module papers over.

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Identity;
use crate::models::{Poll, PollDetail, PollOption, PollPayload};
use crate::store::PollStore;
use crate::validation::{validate_poll, ValidatedPoll};

fn build_options(poll_id: Uuid, validated: &ValidatedPoll) -> Vec<PollOption> {
    validated
        .options
        .iter()
        .enumerate()
        .map(|(index, text)| PollOption {
            id: Uuid::new_v4(),
            poll_id,
            text: text.clone(),
            order_index: index as i32,
        })
        .collect()
}

/// Ownership is re-checked against the store immediately before every
/// mutation; the client-supplied actor is never trusted on its own.
async fn check_owner(
    store: &dyn PollStore,
    actor: Uuid,
    poll_id: Uuid,
) -> Result<(), AppError> {
    match store.poll_owner(poll_id).await? {
        None => Err(AppError::NotFound),
        Some(owner) if owner != actor => Err(AppError::Forbidden),
        Some(_) => Ok(()),
    }
}

pub async fn create_poll(
    store: &dyn PollStore,
    identity: &Identity,
    candidate: PollPayload,
) -> Result<Poll, AppError> {
    let actor = identity.actor_id().ok_or(AppError::Unauthenticated)?;
    let validated = validate_poll(&candidate).map_err(AppError::Validation)?;

    let now = Utc::now();
    let poll = Poll {
        id: Uuid::new_v4(),
        title: validated.title.clone(),
        description: validated.description.clone(),
        creator_id: actor,
        created_at: now,
        updated_at: now,
        is_active: true,
        expires_at: None,
    };

    store.insert_poll(&poll).await?;

    let options = build_options(poll.id, &validated);
    if let Err(err) = store.insert_options(&options).await {
        // No multi-table transaction available: take back the poll row so
        // no poll is ever left standing with zero options.
        warn!(poll_id = %poll.id, "options insert failed, rolling back poll row");
        if let Err(cleanup) = store.delete_poll(poll.id).await {
            error!(poll_id = %poll.id, error = %cleanup, "compensating delete failed");
        }
        return Err(err.into());
    }

    info!(poll_id = %poll.id, "poll created");
    Ok(poll)
}

pub async fn update_poll(
    store: &dyn PollStore,
    identity: &Identity,
    poll_id: Uuid,
    candidate: PollPayload,
) -> Result<(), AppError> {
    let actor = identity.actor_id().ok_or(AppError::Unauthenticated)?;
    check_owner(store, actor, poll_id).await?;

    let validated = validate_poll(&candidate).map_err(AppError::Validation)?;

    store
        .update_poll(
            poll_id,
            &validated.title,
            validated.description.as_deref(),
            Utc::now(),
        )
        .await?;

    // Whole-set replace. If the delete fails we abort with the prior option
    // set intact; if the insert fails after a successful delete the poll is
    // briefly observable with zero options.
    store.delete_options(poll_id).await?;

    let options = build_options(poll_id, &validated);
    if let Err(err) = store.insert_options(&options).await {
        warn!(%poll_id, "options insert failed mid-update, poll left without options");
        return Err(err.into());
    }

    info!(%poll_id, "poll updated");
    Ok(())
}

pub async fn delete_poll(
    store: &dyn PollStore,
    identity: &Identity,
    poll_id: Uuid,
) -> Result<(), AppError> {
    let actor = identity.actor_id().ok_or(AppError::Unauthenticated)?;
    check_owner(store, actor, poll_id).await?;

    // Options and votes are the datastore's referential concern (cascade).
    store.delete_poll(poll_id).await?;

    info!(%poll_id, "poll deleted");
    Ok(())
}

pub async fn get_poll(store: &dyn PollStore, poll_id: Uuid) -> Result<PollDetail, AppError> {
    let poll = store.fetch_poll(poll_id).await?.ok_or(AppError::NotFound)?;
    let options = store.options_for_poll(poll_id).await?;
    Ok(PollDetail { poll, options })
}

pub async fn list_polls(store: &dyn PollStore) -> Result<Vec<Poll>, AppError> {
    Ok(store.list_polls().await?)
}
