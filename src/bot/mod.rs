pub mod auth;
pub mod commands;
pub mod context;
pub mod dialogue;
pub mod handlers;
pub mod session_store;
pub mod state;
pub mod transport;
