//! Power-up pool entry.

use glam::Vec2;
use protocol::PowerupKind;

/// An active power-up on the arena floor.
#[derive(Debug, Clone, Copy)]
pub struct Powerup {
    pub position: Vec2,
    pub kind: PowerupKind,
}
