//! Player session state.

use std::net::SocketAddr;

use crate::entity::Worm;

/// A connected player: stable id, remote address, and the owned worm.
///
/// Sessions are created on `JOIN` and destroyed on disconnect or read error.
/// They live in a stable-handle map, so removing one never moves another
/// session's id mid-tick.
#[derive(Debug)]
pub struct Session {
    /// Stable session id, 0-based. Also the spawn slot on the spawn circle.
    pub id: u32,
    /// Remote address.
    pub addr: SocketAddr,
    /// Display name announced in roster updates.
    pub name: String,
    /// The worm this session steers.
    pub worm: Worm,
}

impl Session {
    /// Create a new session around a freshly spawned worm.
    pub fn new(id: u32, addr: SocketAddr, worm: Worm) -> Self {
        Self {
            id,
            addr,
            name: format!("Player{}", id + 1),
            worm,
        }
    }
}
