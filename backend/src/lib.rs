pub mod channel;
pub mod config;
pub mod market;
pub mod notify;
pub mod scheduler;
pub mod signal;
pub mod state;

pub mod error;
pub mod time;
