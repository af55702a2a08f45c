//! World state management.
//!
//! The arena bounds and the global power-up pool. Sessions and worms live in
//! the game state; everything here is shared arena furniture.

use std::time::{Duration, Instant};

use glam::Vec2;
use protocol::PowerupKind;
use rand::Rng;

use crate::collision;
use crate::entity::Powerup;

/// Arena bounds. Worm movement is toroidal; bullets fall off the edge.
#[derive(Debug, Clone, Copy)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Center of the arena (spawn circle origin).
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Wrap a position onto the torus.
    #[inline]
    pub fn wrap(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.rem_euclid(self.width), p.y.rem_euclid(self.height))
    }

    /// Whether a position is inside the bounds (bullets only).
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Get a random position within the bounds.
    #[inline]
    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        Vec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }
}

/// The shared arena state outside the worms themselves.
#[derive(Debug)]
pub struct World {
    pub arena: Arena,
    /// Active power-ups; removal compacts by swap-with-last.
    pub powerups: Vec<Powerup>,
    last_powerup_spawn: Option<Instant>,
}

impl World {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            arena: Arena::new(width, height),
            powerups: Vec::new(),
            last_powerup_spawn: None,
        }
    }

    /// Timed spawner: once `interval` has elapsed since the previous attempt,
    /// spawn one power-up at a random position with a random kind, unless the
    /// pool is already at capacity. The first eligible call spawns
    /// immediately.
    pub fn maybe_spawn_powerup(
        &mut self,
        now: Instant,
        interval: Duration,
        max_active: usize,
    ) -> Option<Powerup> {
        if let Some(last) = self.last_powerup_spawn {
            if now.duration_since(last) < interval {
                return None;
            }
        }
        self.last_powerup_spawn = Some(now);

        if self.powerups.len() >= max_active {
            return None;
        }

        let powerup = Powerup {
            position: self.arena.random_position(),
            kind: random_kind(),
        };
        self.powerups.push(powerup);
        Some(powerup)
    }

    /// Remove and return the first power-up within reach of a worm head.
    pub fn collect_powerup(
        &mut self,
        head: Vec2,
        worm_radius: f32,
        powerup_radius: f32,
    ) -> Option<Powerup> {
        let index = self.powerups.iter().position(|p| {
            collision::powerup_in_reach(head, p.position, worm_radius, powerup_radius)
        })?;
        Some(self.powerups.swap_remove(index))
    }
}

fn random_kind() -> PowerupKind {
    let mut rng = rand::rng();
    match rng.random_range(0..3) {
        0 => PowerupKind::ExtraBullets,
        1 => PowerupKind::SpeedBoost,
        _ => PowerupKind::Ghost,
    }
}
