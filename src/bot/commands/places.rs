use teloxide::types::ChatId;

use crate::bot::context::AppContext;
use crate::database::models::Place;
use crate::error::{BotError, BotResult};

/// Telegram rejects messages over 4096 characters; stay well below.
const MAX_MESSAGE_LEN: usize = 3500;

pub fn format_place(place: &Place) -> String {
    let rating = if place.rating > 0.0 {
        format!("{:.1}", place.rating)
    } else {
        "not rated yet".to_string()
    };
    format!("📍 {}\nAddress: {}\nAverage rating: {}", place.name, place.address, rating)
}

/// Joins place cards into as few messages as fit the length limit.
pub fn paginate_places(places: &[Place]) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();

    for card in places.iter().map(format_place) {
        if !current.is_empty() && current.len() + card.len() + 2 > MAX_MESSAGE_LEN {
            pages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&card);
    }

    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

/// `/place`: lists every stored place.
pub async fn handle_place_list(ctx: &AppContext, chat_id: ChatId) -> BotResult<()> {
    let feedback = ctx.feedback(chat_id);
    let places = Place::list(&ctx.db.pool).await?;

    if places.is_empty() {
        feedback.info("The list is empty! Add a place with /add.").await?;
        return Ok(());
    }

    for page in paginate_places(&places) {
        feedback.plain(&page).await?;
    }
    Ok(())
}

/// `/random`: suggests one place at random.
pub async fn handle_random(ctx: &AppContext, chat_id: ChatId) -> BotResult<()> {
    let feedback = ctx.feedback(chat_id);

    match Place::random(&ctx.db.pool).await {
        Ok(place) => {
            feedback.plain(&format!("🎲 How about this one?\n\n{}", format_place(&place))).await?;
        }
        Err(BotError::NotFound(_)) => {
            feedback.info("The list is empty! Add a place with /add.").await?;
        }
        Err(e) => return Err(e),
    }
    Ok(())
}
