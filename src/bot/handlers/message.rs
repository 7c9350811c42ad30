use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use super::HandlerResult;
use crate::bot::commands::{places, poll, Command};
use crate::bot::context::AppContext;
use crate::bot::dialogue::IncomingMessage;
use crate::error::BotResult;
use crate::utils::logging::log_command_start;

const WELCOME: &str = "👋 Hi! I keep the list of places where we meet.\n\nUse /add to suggest a place, /place to see them all and /help for every command.";

/// Converts a teloxide message into what the dialogue engine needs.
/// Messages without a sender (channel posts) are skipped.
pub fn incoming(msg: &Message) -> Option<IncomingMessage> {
    let user = msg.from()?;
    Some(IncomingMessage {
        chat_id: msg.chat.id,
        user_id: user.id,
        message_id: msg.id,
        text: msg.text().unwrap_or_default().to_string(),
    })
}

pub async fn command_handler(msg: Message, cmd: Command, ctx: Arc<AppContext>) -> HandlerResult {
    let Some(incoming) = incoming(&msg) else {
        return Ok(());
    };

    let cleanup = match cmd {
        Command::Add => ctx.controller.begin_add(&incoming).await,
        Command::Del => ctx.controller.begin_delete(&incoming).await,
        Command::Rating => ctx.controller.begin_rate(&incoming).await,
        Command::Cancel => ctx.controller.cancel(&incoming).await,
        other => {
            let cleanup = ctx.controller.abandon(&incoming).await;
            if let Err(e) = answer_directly(&ctx, &other, &incoming).await {
                tracing::error!("Command {:?} failed in chat {}: {}", other, incoming.chat_id.0, e);
                if let Err(send_err) = ctx
                    .feedback(incoming.chat_id)
                    .error("Something went wrong, please try again later.")
                    .await
                {
                    tracing::warn!("Could not report failure to chat {}: {}", incoming.chat_id.0, send_err);
                }
            }
            cleanup
        }
    };

    if let Some(request) = cleanup {
        ctx.cleaner.schedule(request);
    }
    Ok(())
}

/// Commands answered with a single reply, outside any dialogue.
async fn answer_directly(ctx: &AppContext, cmd: &Command, incoming: &IncomingMessage) -> BotResult<()> {
    let chat_id = incoming.chat_id;
    match cmd {
        Command::Start => {
            log_command_start("/start", incoming.user_id.0, chat_id.0);
            ctx.feedback(chat_id).plain(WELCOME).await?;
        }
        Command::Help => {
            log_command_start("/help", incoming.user_id.0, chat_id.0);
            ctx.feedback(chat_id).plain(&Command::descriptions().to_string()).await?;
        }
        Command::Place => {
            log_command_start("/place", incoming.user_id.0, chat_id.0);
            places::handle_place_list(ctx, chat_id).await?;
        }
        Command::Random => {
            log_command_start("/random", incoming.user_id.0, chat_id.0);
            places::handle_random(ctx, chat_id).await?;
        }
        Command::Poll => {
            log_command_start("/poll", incoming.user_id.0, chat_id.0);
            poll::handle_poll(ctx, chat_id).await?;
        }
        Command::Add | Command::Del | Command::Rating | Command::Cancel => {}
    }
    Ok(())
}

/// Free text feeds the sender's open dialogue, if any. Unknown slash
/// commands are left alone.
pub async fn text_handler(msg: Message, ctx: Arc<AppContext>) -> HandlerResult {
    let Some(incoming) = incoming(&msg) else {
        return Ok(());
    };
    if msg.text().is_none() || incoming.text.starts_with('/') {
        return Ok(());
    }

    if let Some(request) = ctx.controller.handle_text(&incoming).await {
        ctx.cleaner.schedule(request);
    }
    Ok(())
}
