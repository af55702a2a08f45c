//! Game entities.
//!
//! This module defines the worm, its bullets, and the power-up pool entries.

mod bullet;
mod powerup;
mod worm;

pub use bullet::Bullet;
pub use powerup::Powerup;
pub use worm::{InputHandle, InputState, Worm};
