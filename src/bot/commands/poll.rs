use teloxide::types::ChatId;

use crate::bot::context::AppContext;
use crate::error::{BotError, BotResult};

/// `/poll`: publishes the poll pair to the configured chat right away.
pub async fn handle_poll(ctx: &AppContext, chat_id: ChatId) -> BotResult<()> {
    let target = ctx.polls.settings().chat_id;

    match ctx.polls.send_scheduled_polls().await {
        Ok(_) if chat_id != target => {
            ctx.feedback(chat_id).success("The polls have been posted to the group chat.").await?;
        }
        Ok(_) => {}
        // The coordinator already told the target chat why.
        Err(BotError::InsufficientData) if chat_id == target => {}
        Err(BotError::InsufficientData) => {
            ctx.feedback(chat_id)
                .info("Not enough places for a poll yet. Add at least two with /add.")
                .await?;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
