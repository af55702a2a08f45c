//! Battle Noodles game server library.

pub mod collision;
pub mod config;
pub mod discovery;
pub mod entity;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{ControlBroadcast, GameState, Recipient, run};
