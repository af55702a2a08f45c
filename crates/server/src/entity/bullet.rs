//! Bullet slot.

use glam::Vec2;

/// One of a worm's fixed bullet slots. Inactive slots are reused on fire.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bullet {
    pub position: Vec2,
    pub angle: f32,
    pub active: bool,
}

impl Bullet {
    /// Move the bullet one tick along its firing angle.
    pub fn advance(&mut self, speed: f32) {
        self.position += Vec2::from_angle(self.angle) * speed;
    }
}
