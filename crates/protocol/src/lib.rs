//! Shared protocol crate for the Battle Noodles server.
//!
//! This crate contains:
//! - Text token reading/writing utilities (the wire format is space-delimited
//!   ASCII, no trailing newline)
//! - Frame definitions: client commands, server messages, state snapshots
//! - The UDP discovery payloads
//!
//! Both directions are implemented here: the server uses the encoders, a
//! client uses the parsers. The snapshot decoder doubles as the reference
//! client-side parser.

mod error;
mod text;

pub mod discovery;
pub mod frames;

pub use error::ProtocolError;
pub use text::{TextWriter, TokenReader};

/// Bullet slots carried by every worm. Fixed by the wire format: a snapshot
/// always encodes exactly this many `<bx> <by> <bangle>` triples per worm.
pub const MAX_BULLETS: usize = 3;

/// Represents a 2D position using glam's Vec2.
pub type Position = glam::Vec2;

/// Power-up kinds, with their wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PowerupKind {
    /// Reloads the worm's three bullet slots.
    ExtraBullets = 0,
    /// Temporary forward speed multiplier.
    SpeedBoost = 1,
    /// Temporary collision immunity.
    Ghost = 2,
}

impl PowerupKind {
    /// Decode a wire value.
    pub fn from_wire(v: u8) -> Result<Self, ProtocolError> {
        match v {
            0 => Ok(PowerupKind::ExtraBullets),
            1 => Ok(PowerupKind::SpeedBoost),
            2 => Ok(PowerupKind::Ghost),
            _ => Err(ProtocolError::InvalidPowerupKind(v)),
        }
    }

    /// The value sent on the wire.
    pub fn to_wire(self) -> u8 {
        self as u8
    }
}
