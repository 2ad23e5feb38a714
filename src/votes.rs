//! Vote admission and result aggregation.
//!
//! Duplicate prevention is deliberately not a check-then-insert in
//! application code; the store's uniqueness constraint is the arbiter so
//! two concurrent submissions from one identity collide safely.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Identity;
use crate::models::{OptionTally, PollResults, Vote};
use crate::store::PollStore;

pub async fn submit_vote(
    store: &dyn PollStore,
    identity: &Identity,
    poll_id: Uuid,
    option_id: Option<Uuid>,
) -> Result<(), AppError> {
    let option_id = option_id.ok_or(AppError::MissingFields)?;

    let signals = identity.signals();
    let vote = Vote {
        id: Uuid::new_v4(),
        poll_id,
        option_id,
        user_id: identity.actor_id(),
        ip_address: signals.ip_address.clone(),
        user_agent: signals.user_agent.clone(),
        session_fingerprint: signals.session_fingerprint.clone(),
        created_at: Utc::now(),
    };

    // A uniqueness violation converts to DuplicateVote on the way out.
    store.insert_vote(&vote).await?;

    info!(%poll_id, %option_id, authenticated = vote.user_id.is_some(), "vote recorded");
    Ok(())
}

/// Tallies a poll's options from the raw vote rows. Recomputed on every
/// call; nothing is materialized.
///
/// Ordering: descending by count, ties broken by the option's original
/// `order_index`. Percentage is 0 for every option when the poll has no
/// votes at all.
pub async fn compute_results(
    store: &dyn PollStore,
    poll_id: Uuid,
) -> Result<PollResults, AppError> {
    store.fetch_poll(poll_id).await?.ok_or(AppError::NotFound)?;

    let options = store.options_for_poll(poll_id).await?;
    let counts = store.vote_counts(poll_id).await?;
    let total_votes: i64 = counts.values().sum();

    let mut tallies: Vec<OptionTally> = options
        .into_iter()
        .map(|option| {
            let count = counts.get(&option.id).copied().unwrap_or(0);
            let percentage = if total_votes == 0 {
                0.0
            } else {
                count as f64 / total_votes as f64 * 100.0
            };
            OptionTally {
                option_id: option.id,
                text: option.text,
                count,
                percentage,
                order_index: option.order_index,
            }
        })
        .collect();

    tallies.sort_by(|a, b| b.count.cmp(&a.count).then(a.order_index.cmp(&b.order_index)));

    Ok(PollResults {
        poll_id,
        total_votes,
        tallies,
    })
}
