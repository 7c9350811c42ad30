use tracing::{debug, error, info, warn};

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user_id: u64, chat_id: i64) {
    info!("CMD_START: {} by {} in chat {}", command, user_id, chat_id);
}

/// Logs a dialogue state change for one session
pub fn log_flow_transition(flow: &str, from: &str, to: &str, user_id: u64, chat_id: i64) {
    debug!(
        "FLOW: {} {} -> {} for user {} in chat {}",
        flow, from, to, user_id, chat_id
    );
}

/// Logs a flow that ended without completing
pub fn log_flow_aborted(flow: &str, reason: &str, user_id: u64, chat_id: i64) {
    warn!(
        "FLOW_ABORTED: {} - {} - user {} in chat {}",
        flow, reason, user_id, chat_id
    );
}

/// Logs validation errors with consistent format
pub fn log_validation_error(flow: &str, field: &str, value: &str, error: &str, user_id: u64, chat_id: i64) {
    warn!(
        "VALIDATION_ERROR: {} - {} field '{}' invalid: {} - user {} in chat {}",
        flow, field, value, error, user_id, chat_id
    );
}

/// Logs database operations with consistent format
pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

/// Logs database errors with consistent format
pub fn log_database_error(operation: &str, table: &str, error: &str) {
    error!("DB_ERROR: {} on {} failed: {}", operation, table, error);
}

/// Logs the outcome of a deferred message cleanup
pub fn log_cleanup(chat_id: i64, deleted: usize, already_gone: usize, failed: usize) {
    if failed > 0 {
        warn!(
            "CLEANUP: chat {} - deleted {}, already gone {}, failed {}",
            chat_id, deleted, already_gone, failed
        );
    } else {
        debug!(
            "CLEANUP: chat {} - deleted {}, already gone {}",
            chat_id, deleted, already_gone
        );
    }
}

/// Logs timeout events with consistent format
pub fn log_timeout(operation: &str, duration_secs: u64, details: Option<&str>) {
    match details {
        Some(d) => warn!("TIMEOUT: {} after {}s - {}", operation, duration_secs, d),
        None => warn!("TIMEOUT: {} after {}s", operation, duration_secs),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}

/// Logs failures of background jobs that have no user to report to
pub fn log_job_error(job: &str, error: &str) {
    error!("JOB_ERROR: {} failed: {}", job, error);
}
