pub mod place;
pub mod poll;

pub use place::*;
pub use poll::*;
