use std::sync::Arc;
use teloxide::types::PollAnswer;

use super::HandlerResult;
use crate::bot::context::AppContext;

pub async fn poll_answer_handler(answer: PollAnswer, ctx: Arc<AppContext>) -> HandlerResult {
    let indices: Vec<i64> = answer.option_ids.iter().map(|&index| i64::from(index)).collect();

    tracing::debug!(
        "Poll answer from user {} on poll {}: {:?}",
        answer.user.id.0, answer.poll_id, indices
    );

    // A retracted vote arrives with no options; nothing to count.
    if indices.is_empty() {
        return Ok(());
    }

    if let Err(e) = ctx.polls.on_vote(&answer.poll_id, &indices).await {
        tracing::error!("Failed to record vote on poll {}: {}", answer.poll_id, e);
    }
    Ok(())
}
