pub mod cleanup;
pub mod health;
pub mod polls;
pub mod scheduler;
