use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

use crate::utils::validation::validate_time_options;

const DEFAULT_DATABASE_URL: &str = "sqlite:./data/places.db";
const DEFAULT_TIME_SLOTS: &str = "Friday 18:00, Friday 19:00, Saturday 14:00, Saturday 18:00";
const DEFAULT_SEND_CRON: &str = "0 32 13 * * Mon";
const DEFAULT_TALLY_CRON: &str = "0 0 13 * * Fri";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    /// Users allowed to delete places regardless of their chat role.
    pub admin_ids: Vec<u64>,
    /// Chats where `/add` is accepted. Empty means every chat.
    pub allowed_chat_ids: Vec<i64>,
    /// Chat receiving the scheduled polls and their results.
    pub poll_chat_id: i64,
    pub poll_time_slots: Vec<String>,
    pub poll_send_cron: String,
    pub poll_tally_cron: String,
    pub cleanup_delay: Duration,
    pub denied_cleanup_delay: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let database_url = if database_url.trim().is_empty() {
            DEFAULT_DATABASE_URL.to_string()
        } else {
            database_url
        };

        let port_str = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string());
        let http_port = port_str.trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let admin_ids = parse_id_list::<u64>("ADMIN_IDS")?;
        let allowed_chat_ids = parse_id_list::<i64>("ALLOWED_CHAT_IDS")?;

        let poll_chat_id = env::var("POLL_CHAT_ID")
            .map_err(|_| anyhow!("POLL_CHAT_ID must be set"))?
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid POLL_CHAT_ID"))?;

        let slots = env::var("POLL_TIME_SLOTS").unwrap_or_else(|_| DEFAULT_TIME_SLOTS.to_string());
        let poll_time_slots = validate_time_options(&slots)
            .map_err(|e| anyhow!("Invalid POLL_TIME_SLOTS: {}", e))?;

        let poll_send_cron = non_empty_or("POLL_SEND_CRON", DEFAULT_SEND_CRON);
        let poll_tally_cron = non_empty_or("POLL_TALLY_CRON", DEFAULT_TALLY_CRON);

        Ok(Config {
            telegram_bot_token: token,
            database_url,
            http_port,
            admin_ids,
            allowed_chat_ids,
            poll_chat_id,
            poll_time_slots,
            poll_send_cron,
            poll_tally_cron,
            cleanup_delay: parse_secs("CLEANUP_DELAY_SECS", 1)?,
            denied_cleanup_delay: parse_secs("DENIED_CLEANUP_DELAY_SECS", 10)?,
            request_timeout: parse_secs("REQUEST_TIMEOUT_SECS", 10)?,
        })
    }
}

/// Parses a comma-separated id list, keeping first-seen order and dropping repeats.
fn parse_id_list<T>(var: &str) -> Result<Vec<T>>
where
    T: std::str::FromStr + PartialEq,
{
    let raw = env::var(var).unwrap_or_default();
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: T = part
            .parse()
            .map_err(|_| anyhow!("Invalid {}: '{}' is not a number", var, part))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn non_empty_or(var: &str, default: &str) -> String {
    env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_secs(var: &str, default: u64) -> Result<Duration> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("Invalid {}", var)),
        _ => Ok(Duration::from_secs(default)),
    }
}
