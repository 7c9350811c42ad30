pub mod message;
pub mod poll_answer;

use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*, types::PollAnswer};

use crate::bot::commands::Command;
use crate::bot::context::AppContext;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;
pub type HandlerResult = Result<(), HandlerError>;

/// Dispatch table: commands, free text and poll answers.
pub struct BotHandler {
    pub ctx: Arc<AppContext>,
}

impl BotHandler {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    pub fn schema(&self) -> UpdateHandler<HandlerError> {
        use teloxide::dispatching::UpdateFilterExt;

        let ctx_command = self.ctx.clone();
        let ctx_text = self.ctx.clone();
        let ctx_poll = self.ctx.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |msg: Message, cmd: Command| {
                        let ctx = ctx_command.clone();
                        async move { message::command_handler(msg, cmd, ctx).await }
                    }),
            )
            .branch(Update::filter_message().endpoint(move |msg: Message| {
                let ctx = ctx_text.clone();
                async move { message::text_handler(msg, ctx).await }
            }))
            .branch(Update::filter_poll_answer().endpoint(move |answer: PollAnswer| {
                let ctx = ctx_poll.clone();
                async move { poll_answer::poll_answer_handler(answer, ctx).await }
            }))
    }
}
