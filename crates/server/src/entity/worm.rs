//! Worm entity.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use glam::Vec2;
use protocol::frames::{BulletState, WormState};
use protocol::{MAX_BULLETS, PowerupKind};

use super::Bullet;

const PATH_INITIAL_CAPACITY: usize = 100;

/// Last received command snapshot for a worm.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
}

/// Shared handle to a worm's input snapshot.
///
/// The connection task writes through its clone on every `INPUT` frame; the
/// simulation reads once per tick. This is the fine-grained lock that keeps
/// input traffic off the coarse game lock. The critical section is a plain
/// copy, so a blocking mutex is safe inside async tasks.
#[derive(Debug, Clone, Default)]
pub struct InputHandle(Arc<Mutex<InputState>>);

impl InputHandle {
    /// Overwrite the snapshot.
    pub fn set(&self, left: bool, right: bool, up: bool) {
        let mut input = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        *input = InputState { left, right, up };
    }

    /// Copy the current snapshot out.
    pub fn get(&self) -> InputState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A player's worm: head position, heading, and the full trail since spawn.
#[derive(Debug)]
pub struct Worm {
    pub position: Vec2,
    pub angle: f32,
    pub alive: bool,
    /// Trail from spawn to head. Append-only while alive; frozen at death.
    pub path: Vec<Vec2>,
    pub bullets_left: u8,
    pub bullets: [Bullet; MAX_BULLETS],
    pub speed_boost_time_left: f32,
    pub speed_boost_active: bool,
    pub is_ghost: bool,
    /// Collisions are ignored before this time.
    pub invincibility_end: Instant,
    pub last_shot: Option<Instant>,
    input: InputHandle,
}

impl Worm {
    /// Create a worm at its spawn point with a fresh grace period.
    pub fn new(spawn: Vec2, angle: f32, now: Instant, grace: Duration) -> Self {
        let mut path = Vec::with_capacity(PATH_INITIAL_CAPACITY);
        path.push(spawn);
        Self {
            position: spawn,
            angle,
            alive: true,
            path,
            bullets_left: 0,
            bullets: [Bullet::default(); MAX_BULLETS],
            speed_boost_time_left: 0.0,
            speed_boost_active: false,
            is_ghost: false,
            invincibility_end: now + grace,
            last_shot: None,
            input: InputHandle::default(),
        }
    }

    /// Reset the worm onto a spawn point for a new round. The input handle is
    /// preserved so the connection task's clone stays wired up.
    pub fn respawn(&mut self, spawn: Vec2, angle: f32, now: Instant, grace: Duration) {
        let input = self.input.clone();
        *self = Self::new(spawn, angle, now, grace);
        self.input = input;
    }

    /// Handle for the owning connection task.
    pub fn input_handle(&self) -> InputHandle {
        self.input.clone()
    }

    /// Read the input snapshot for this tick.
    pub fn input_snapshot(&self) -> InputState {
        self.input.get()
    }

    /// Whether the post-spawn grace period is still running.
    pub fn is_invincible(&self, now: Instant) -> bool {
        now < self.invincibility_end
    }

    /// Whether the fire-rate cooldown has elapsed.
    pub fn can_fire(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_shot {
            Some(last) => now.duration_since(last) >= cooldown,
            None => true,
        }
    }

    /// Fire one bullet from the head at the current heading. Returns false
    /// when every slot is already in flight.
    pub fn fire(&mut self, now: Instant) -> bool {
        let Some(slot) = self.bullets.iter_mut().find(|b| !b.active) else {
            return false;
        };
        slot.position = self.position;
        slot.angle = self.angle;
        slot.active = true;
        self.bullets_left = self.bullets_left.saturating_sub(1);
        self.last_shot = Some(now);
        true
    }

    /// Append the new head to the trail, growing the buffer by doubling.
    /// Returns false if the allocation failed; the caller kills the worm
    /// instead of letting the process abort.
    pub fn try_extend_path(&mut self, point: Vec2) -> bool {
        if self.path.len() == self.path.capacity()
            && self.path.try_reserve(self.path.capacity().max(1)).is_err()
        {
            return false;
        }
        self.path.push(point);
        true
    }

    /// Apply a power-up effect. Effects are mutually exclusive: applying one
    /// resets the other two to their inactive values.
    pub fn apply_powerup(&mut self, kind: PowerupKind, boost_duration: f32) {
        match kind {
            PowerupKind::ExtraBullets => {
                self.bullets_left = MAX_BULLETS as u8;
                self.speed_boost_time_left = 0.0;
                self.speed_boost_active = false;
                self.is_ghost = false;
            }
            PowerupKind::SpeedBoost => {
                self.speed_boost_time_left = boost_duration;
                self.speed_boost_active = true;
                self.bullets_left = 0;
                self.is_ghost = false;
            }
            PowerupKind::Ghost => {
                self.is_ghost = true;
                self.bullets_left = 0;
                self.speed_boost_time_left = 0.0;
                self.speed_boost_active = false;
            }
        }
    }

    /// This worm's block of the broadcast snapshot.
    pub fn state(&self) -> WormState {
        let mut bullets = [None; MAX_BULLETS];
        for (slot, bullet) in bullets.iter_mut().zip(&self.bullets) {
            if bullet.active {
                *slot = Some(BulletState {
                    position: bullet.position,
                    angle: bullet.angle,
                });
            }
        }
        WormState {
            position: self.position,
            angle: self.angle,
            alive: self.alive,
            bullets_left: self.bullets_left,
            boost_time_left: self.speed_boost_time_left,
            boost_active: self.speed_boost_active,
            ghost: self.is_ghost,
            bullets,
            path: self.path.clone(),
        }
    }
}
