use crate::error::{BotError, BotResult};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ADDRESS_LEN: usize = 200;
pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 10;

/// Telegram accepts between 2 and 10 poll options of at most 100 characters.
pub const MIN_POLL_OPTIONS: usize = 2;
pub const MAX_POLL_OPTIONS: usize = 10;
pub const MAX_POLL_OPTION_LEN: usize = 100;

/// Trims and lowercases a place name, the key every flow looks places up by.
pub fn normalize_place_name(name: &str) -> BotResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(BotError::Validation("Place name cannot be empty".to_string()));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(BotError::Validation(format!(
            "Place name cannot be longer than {MAX_NAME_LEN} characters"
        )));
    }

    if name.contains('\n') || name.contains('\r') {
        return Err(BotError::Validation("Place name cannot contain line breaks".to_string()));
    }

    Ok(name.to_lowercase())
}

pub fn validate_address(address: &str) -> BotResult<String> {
    let address = address.trim();

    if address.is_empty() {
        return Err(BotError::Validation("Address cannot be empty".to_string()));
    }

    if address.chars().count() > MAX_ADDRESS_LEN {
        return Err(BotError::Validation(format!(
            "Address cannot be longer than {MAX_ADDRESS_LEN} characters"
        )));
    }

    Ok(address.to_string())
}

/// Parses a rating score, accepting only whole numbers from 1 to 10.
pub fn parse_score(input: &str) -> BotResult<i64> {
    let score: i64 = input
        .trim()
        .parse()
        .map_err(|_| BotError::Validation(format!("'{}' is not a whole number", input.trim())))?;

    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(BotError::Validation(format!(
            "Score must be between {MIN_SCORE} and {MAX_SCORE}"
        )));
    }

    Ok(score)
}

/// Splits a comma-separated list of poll time slots.
pub fn validate_time_options(options: &str) -> BotResult<Vec<String>> {
    let options = options.trim();

    if options.is_empty() {
        return Err(BotError::Validation("Time options cannot be empty".to_string()));
    }

    let option_list: Vec<String> = options
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if option_list.len() < MIN_POLL_OPTIONS {
        return Err(BotError::Validation(format!(
            "Must provide at least {MIN_POLL_OPTIONS} time options"
        )));
    }

    if option_list.len() > MAX_POLL_OPTIONS {
        return Err(BotError::Validation(format!(
            "Cannot have more than {MAX_POLL_OPTIONS} time options"
        )));
    }

    for option in &option_list {
        if option.chars().count() > MAX_POLL_OPTION_LEN {
            return Err(BotError::Validation(format!(
                "Time option '{option}' is too long (max {MAX_POLL_OPTION_LEN} characters)"
            )));
        }
    }

    Ok(option_list)
}
