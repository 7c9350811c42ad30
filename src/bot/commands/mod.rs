pub mod places;
pub mod poll;

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Add a new place")]
    Add,
    #[command(description = "Delete a place (administrators only)")]
    Del,
    #[command(description = "Show every place on the list")]
    Place,
    #[command(description = "Pick a random place")]
    Random,
    #[command(description = "Rate a place from 1 to 10")]
    Rating,
    #[command(description = "Post the time and place polls now")]
    Poll,
    #[command(description = "Cancel the current dialogue")]
    Cancel,
}
