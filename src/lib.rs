//! # Places Bot
//!
//! A Telegram bot that keeps a shared list of places for a chat group.
//!
//! ## Features
//! - Add, delete (administrators only) and rate places through short dialogues
//! - List places or pick one at random
//! - Weekly polls on when and where to meet, with automatic result announcements
//! - Transient dialogue messages are removed once a dialogue ends
//! - Persistent storage with SQLite

/// Bot commands, dialogues, sessions and the Telegram transport
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and schema
pub mod database;
/// Error kinds shared by the store, dialogues and polls
pub mod error;
/// Background services: polls, scheduling, message cleanup and health checks
pub mod services;
/// Utility functions for validation, feedback and logging
pub mod utils;
