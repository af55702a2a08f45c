//! Server configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub worm: WormConfig,
    #[serde(default)]
    pub bullet: BulletConfig,
    #[serde(default)]
    pub powerup: PowerupConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            arena: ArenaConfig::default(),
            worm: WormConfig::default(),
            bullet: BulletConfig::default(),
            powerup: PowerupConfig::default(),
        }
    }
}

/// Networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TCP game port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// UDP discovery port.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// Server name announced in discovery replies.
    #[serde(default = "default_name")]
    pub name: String,
    /// Maximum concurrent players.
    #[serde(default = "default_max_players")]
    pub max_players: usize,
    /// Tick interval in milliseconds.
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            discovery_port: default_discovery_port(),
            name: default_name(),
            max_players: default_max_players(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_discovery_port() -> u16 {
    8081
}
fn default_name() -> String {
    "BattleNoodles_Server".to_string()
}
fn default_max_players() -> usize {
    6
}
fn default_tick_interval() -> u64 {
    16
}

/// Arena bounds. The arena is toroidal for worms; bullets fall off the edge.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArenaConfig {
    #[serde(default = "default_arena_width")]
    pub width: f32,
    #[serde(default = "default_arena_height")]
    pub height: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: default_arena_width(),
            height: default_arena_height(),
        }
    }
}

fn default_arena_width() -> f32 {
    1228.0
}
fn default_arena_height() -> f32 {
    768.0
}

/// Worm movement and collision settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WormConfig {
    /// Forward speed per tick.
    #[serde(default = "default_worm_speed")]
    pub speed: f32,
    /// Turn rate in radians per tick.
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f32,
    /// Body radius used for every collision test.
    #[serde(default = "default_worm_radius")]
    pub radius: f32,
    /// Radius of the spawn circle around the arena center.
    #[serde(default = "default_spawn_circle_radius")]
    pub spawn_circle_radius: f32,
    /// Newest own-trail points excluded from self-collision.
    #[serde(default = "default_tail_collision_threshold")]
    pub tail_collision_threshold: usize,
    /// Post-spawn grace period during which collisions are ignored.
    #[serde(default = "default_invincibility_secs")]
    pub invincibility_secs: f32,
}

impl Default for WormConfig {
    fn default() -> Self {
        Self {
            speed: default_worm_speed(),
            turn_speed: default_turn_speed(),
            radius: default_worm_radius(),
            spawn_circle_radius: default_spawn_circle_radius(),
            tail_collision_threshold: default_tail_collision_threshold(),
            invincibility_secs: default_invincibility_secs(),
        }
    }
}

fn default_worm_speed() -> f32 {
    2.0
}
fn default_turn_speed() -> f32 {
    0.1
}
fn default_worm_radius() -> f32 {
    3.0
}
fn default_spawn_circle_radius() -> f32 {
    50.0
}
fn default_tail_collision_threshold() -> usize {
    10
}
fn default_invincibility_secs() -> f32 {
    2.0
}

/// Bullet ballistics settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulletConfig {
    /// Travel per tick along the firing angle.
    #[serde(default = "default_bullet_speed")]
    pub speed: f32,
    #[serde(default = "default_bullet_radius")]
    pub radius: f32,
    /// Minimum seconds between shots.
    #[serde(default = "default_bullet_cooldown")]
    pub cooldown_secs: f32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            speed: default_bullet_speed(),
            radius: default_bullet_radius(),
            cooldown_secs: default_bullet_cooldown(),
        }
    }
}

fn default_bullet_speed() -> f32 {
    12.0
}
fn default_bullet_radius() -> f32 {
    5.0
}
fn default_bullet_cooldown() -> f32 {
    0.003
}

/// Power-up spawner and effect settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PowerupConfig {
    /// Seconds between spawn attempts.
    #[serde(default = "default_powerup_interval")]
    pub spawn_interval_secs: f32,
    /// Maximum concurrently active power-ups.
    #[serde(default = "default_max_powerups")]
    pub max_active: usize,
    /// Pickup radius.
    #[serde(default = "default_powerup_radius")]
    pub radius: f32,
    /// Forward speed multiplier while boosted.
    #[serde(default = "default_boost_multiplier")]
    pub boost_multiplier: f32,
    /// Seconds of boost granted by a speed power-up.
    #[serde(default = "default_boost_duration")]
    pub boost_duration_secs: f32,
}

impl Default for PowerupConfig {
    fn default() -> Self {
        Self {
            spawn_interval_secs: default_powerup_interval(),
            max_active: default_max_powerups(),
            radius: default_powerup_radius(),
            boost_multiplier: default_boost_multiplier(),
            boost_duration_secs: default_boost_duration(),
        }
    }
}

fn default_powerup_interval() -> f32 {
    5.0
}
fn default_max_powerups() -> usize {
    3
}
fn default_powerup_radius() -> f32 {
    10.0
}
fn default_boost_multiplier() -> f32 {
    3.0
}
fn default_boost_duration() -> f32 {
    3.0
}
