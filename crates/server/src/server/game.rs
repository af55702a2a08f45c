//! Game state and main loop.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use glam::Vec2;
use protocol::frames::{PowerupState, ServerFrame, Snapshot};
use rand::Rng;
use tokio::sync::{RwLock, broadcast, watch};
use tokio::time::{MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use crate::collision;
use crate::config::Config;
use crate::entity::{InputHandle, Worm};
use crate::world::World;

use super::session::Session;

/// Who receives a control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every joined session.
    All,
    /// One session by id.
    One(u32),
}

/// A non-state frame fanned out through the control channel. Connection
/// tasks filter on the recipient.
#[derive(Debug, Clone)]
pub struct ControlBroadcast {
    pub to: Recipient,
    pub frame: Bytes,
}

/// The world state store: every session and worm, the power-up pool, and the
/// round lifecycle. Guarded by one coarse `RwLock`; the tick loop holds the
/// write side for a whole tick, session tasks hold it briefly for
/// join/start/removal.
pub struct GameState {
    pub config: Config,
    pub world: World,

    /// Sessions by stable id.
    sessions: HashMap<u32, Session>,
    /// Join order; per-tick iteration and snapshots follow this.
    order: Vec<u32>,

    pub tick_count: u64,
    pub game_started: bool,
    started_at: Option<Instant>,

    // Fan-out channels; sends never block.
    state_tx: broadcast::Sender<Bytes>,
    control_tx: broadcast::Sender<ControlBroadcast>,
}

impl GameState {
    /// Create a new game state.
    pub fn new(
        config: &Config,
        state_tx: broadcast::Sender<Bytes>,
        control_tx: broadcast::Sender<ControlBroadcast>,
    ) -> Self {
        Self {
            world: World::new(config.arena.width, config.arena.height),
            config: config.clone(),
            sessions: HashMap::new(),
            order: Vec::new(),
            tick_count: 0,
            game_started: false,
            started_at: None,
            state_tx,
            control_tx,
        }
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Allocate a session and worm for a new connection. Returns `None` at
    /// capacity; the caller replies `Server full` and closes. On success the
    /// caller gets the assigned id and the worm's input handle, so later
    /// `INPUT` frames bypass the coarse lock entirely.
    pub fn try_join(&mut self, addr: SocketAddr, now: Instant) -> Option<(u32, InputHandle)> {
        let max_players = self.config.server.max_players;
        if self.sessions.len() >= max_players {
            warn!("Join from {} rejected: server full", addr);
            return None;
        }
        let id = (0..max_players as u32).find(|id| !self.sessions.contains_key(id))?;

        let (spawn, angle) = self.spawn_slot(id);
        let grace = Duration::from_secs_f32(self.config.worm.invincibility_secs);
        let session = Session::new(id, addr, Worm::new(spawn, angle, now, grace));
        let handle = session.worm.input_handle();

        // Replay the existing roster to the newcomer, then announce the
        // newcomer to everyone. Both are best-effort channel sends.
        for &other_id in &self.order {
            if let Some(other) = self.sessions.get(&other_id) {
                let frame = ServerFrame::PlayerUpdate {
                    id: other_id,
                    name: other.name.clone(),
                }
                .encode();
                self.send_to(id, frame);
            }
        }
        let announce = ServerFrame::PlayerUpdate {
            id,
            name: session.name.clone(),
        }
        .encode();

        self.order.push(id);
        self.sessions.insert(id, session);
        self.send_all(announce);
        info!(
            "Session {} joined from {} ({} players)",
            id,
            addr,
            self.sessions.len()
        );
        Some((id, handle))
    }

    /// Remove a session and its worm. Other sessions keep their ids.
    pub fn remove_session(&mut self, id: u32) {
        if let Some(session) = self.sessions.remove(&id) {
            self.order.retain(|&other| other != id);
            info!(
                "Session {} ({}) disconnected, {} players remain",
                id,
                session.addr,
                self.sessions.len()
            );
        }
    }

    /// Handle `START`: the first occurrence with at least one session begins
    /// the round. Every worm respawns on its slot with a fresh grace period,
    /// so spawn-circle overlaps cannot kill anyone before the window ends.
    pub fn start(&mut self, now: Instant) {
        if self.game_started || self.sessions.is_empty() {
            return;
        }
        self.game_started = true;
        self.started_at = Some(now);

        let grace = Duration::from_secs_f32(self.config.worm.invincibility_secs);
        let ids = self.order.clone();
        for id in ids {
            let (spawn, angle) = self.spawn_slot(id);
            if let Some(session) = self.sessions.get_mut(&id) {
                session.worm.respawn(spawn, angle, now, grace);
            }
        }

        info!("Game started with {} players", self.sessions.len());
        self.send_all(ServerFrame::GameStarted.encode());
    }

    /// Spawn position and heading for a slot: one point per max-capacity
    /// position on a circle around the arena center, with angular jitter so
    /// re-spawns do not re-collide symmetrically.
    fn spawn_slot(&self, id: u32) -> (Vec2, f32) {
        let max_players = self.config.server.max_players;
        let slot_angle = std::f32::consts::TAU * id as f32 / max_players as f32;
        let spawn = self.world.arena.center()
            + Vec2::from_angle(slot_angle) * self.config.worm.spawn_circle_radius;
        let mut rng = rand::rng();
        let heading = slot_angle + rng.random_range(-1.0..1.0);
        (spawn, heading)
    }

    /// Run one simulation tick. The caller holds the coarse write lock and
    /// only calls this while the game is started with at least one session.
    pub fn tick(&mut self, now: Instant) {
        let interval = Duration::from_secs_f32(self.config.powerup.spawn_interval_secs);
        let max_active = self.config.powerup.max_active;
        if let Some(powerup) = self.world.maybe_spawn_powerup(now, interval, max_active) {
            info!(
                "Spawned {:?} power-up at ({:.1}, {:.1})",
                powerup.kind, powerup.position.x, powerup.position.y
            );
        }

        self.update_worms(now);
        self.update_bullets();

        if self.game_started {
            self.check_game_over();
        }

        self.tick_count += 1;
        self.broadcast_state();
    }

    /// Movement, trail collision, and power-up pickup for every alive worm,
    /// in session order.
    fn update_worms(&mut self, now: Instant) {
        let dt = self.config.server.tick_interval_ms as f32 / 1000.0;
        let turn_speed = self.config.worm.turn_speed;
        let base_speed = self.config.worm.speed;
        let worm_radius = self.config.worm.radius;
        let boost_multiplier = self.config.powerup.boost_multiplier;
        let boost_duration = self.config.powerup.boost_duration_secs;
        let powerup_radius = self.config.powerup.radius;
        let cooldown = Duration::from_secs_f32(self.config.bullet.cooldown_secs);

        let ids = self.order.clone();
        for id in ids {
            // Inputs, turning, boost or fire, candidate head position.
            let (candidate, collidable) = {
                let Some(session) = self.sessions.get_mut(&id) else {
                    continue;
                };
                let worm = &mut session.worm;
                if !worm.alive {
                    continue;
                }

                let input = worm.input_snapshot();
                if input.left {
                    worm.angle -= turn_speed;
                }
                if input.right {
                    worm.angle += turn_speed;
                }

                let mut speed = base_speed;
                if worm.speed_boost_active && worm.speed_boost_time_left > 0.0 {
                    // Boost priority: while the timer runs, `up` cannot fire.
                    speed *= boost_multiplier;
                    worm.speed_boost_time_left = (worm.speed_boost_time_left - dt).max(0.0);
                    if worm.speed_boost_time_left == 0.0 {
                        worm.speed_boost_active = false;
                    }
                } else if input.up
                    && worm.bullets_left > 0
                    && worm.can_fire(now, cooldown)
                    && worm.fire(now)
                {
                    debug!("Worm {} fired, {} bullets left", id, worm.bullets_left);
                }

                // Ghosting lasts only while the player holds forward.
                if !input.up {
                    worm.is_ghost = false;
                }

                let candidate = self
                    .world
                    .arena
                    .wrap(worm.position + Vec2::from_angle(worm.angle) * speed);
                let collidable = !worm.is_ghost && !worm.is_invincible(now);
                (candidate, collidable)
            };

            let crashed = collidable && self.hits_any_trail(id, candidate);

            let Some(session) = self.sessions.get_mut(&id) else {
                continue;
            };
            let worm = &mut session.worm;
            if crashed {
                worm.alive = false;
                info!("Worm {} crashed into a trail", id);
                continue;
            }

            worm.position = candidate;
            if !worm.try_extend_path(candidate) {
                worm.alive = false;
                warn!("Worm {} trail buffer could not grow, removing it from play", id);
                continue;
            }

            if let Some(powerup) = self
                .world
                .collect_powerup(candidate, worm_radius, powerup_radius)
            {
                worm.apply_powerup(powerup.kind, boost_duration);
                info!("Worm {} collected {:?}", id, powerup.kind);
            }
        }
    }

    /// Candidate head vs own trail (minus the tail window) and every other
    /// alive worm's full trail.
    fn hits_any_trail(&self, id: u32, candidate: Vec2) -> bool {
        let radius = self.config.worm.radius;
        let tail_exclusion = self.config.worm.tail_collision_threshold;

        if let Some(session) = self.sessions.get(&id) {
            if collision::own_trail_hit(candidate, &session.worm.path, radius, tail_exclusion) {
                return true;
            }
        }

        self.order.iter().any(|&other_id| {
            other_id != id
                && self.sessions.get(&other_id).is_some_and(|other| {
                    other.worm.alive && collision::trail_hit(candidate, &other.worm.path, radius)
                })
        })
    }

    /// Advance bullets, drop the ones leaving the arena, resolve hits. Worms
    /// are processed in session order; a worm that is no longer alive at its
    /// turn is not simulated, so its in-flight bullets freeze with it.
    fn update_bullets(&mut self) {
        let bullet_speed = self.config.bullet.speed;
        let bullet_radius = self.config.bullet.radius;
        let worm_radius = self.config.worm.radius;

        let ids = self.order.clone();
        for id in ids {
            let shots: Vec<(usize, Vec2)> = {
                let Some(session) = self.sessions.get_mut(&id) else {
                    continue;
                };
                let worm = &mut session.worm;
                if !worm.alive {
                    continue;
                }

                let mut shots = Vec::new();
                for (slot, bullet) in worm.bullets.iter_mut().enumerate() {
                    if !bullet.active {
                        continue;
                    }
                    bullet.advance(bullet_speed);
                    if !self.world.arena.contains(bullet.position) {
                        bullet.active = false;
                        debug!("Worm {} bullet left the arena", id);
                    } else {
                        shots.push((slot, bullet.position));
                    }
                }
                shots
            };

            for (slot, position) in shots {
                let victim = self.order.iter().copied().find(|&other_id| {
                    other_id != id
                        && self.sessions.get(&other_id).is_some_and(|other| {
                            other.worm.alive
                                && collision::bullet_hit(
                                    position,
                                    other.worm.position,
                                    worm_radius,
                                    bullet_radius,
                                )
                        })
                });
                if let Some(victim_id) = victim {
                    if let Some(target) = self.sessions.get_mut(&victim_id) {
                        target.worm.alive = false;
                    }
                    if let Some(shooter) = self.sessions.get_mut(&id) {
                        shooter.worm.bullets[slot].active = false;
                    }
                    info!("Worm {} shot worm {}", id, victim_id);
                }
            }
        }
    }

    /// End the round when nobody is left, or when a duel (or bigger match)
    /// is down to its last worm.
    fn check_game_over(&mut self) {
        let alive = self
            .order
            .iter()
            .filter(|&&id| self.sessions.get(&id).is_some_and(|s| s.worm.alive))
            .count();
        if alive == 0 || (self.sessions.len() >= 2 && alive <= 1) {
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        if let Some(started) = self.started_at.take() {
            info!(
                "Game over after {} ticks ({:.1}s)",
                self.tick_count,
                started.elapsed().as_secs_f32()
            );
        }
        self.game_started = false;
        self.send_all(ServerFrame::GameOver.encode());
    }

    /// Serialize the whole world, in session order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            powerups: self
                .world
                .powerups
                .iter()
                .map(|p| PowerupState {
                    position: p.position,
                    kind: p.kind,
                })
                .collect(),
            worms: self
                .order
                .iter()
                .filter_map(|id| self.sessions.get(id))
                .map(|session| session.worm.state())
                .collect(),
        }
    }

    /// Encode the post-tick snapshot once and fan it out. Runs under the
    /// tick's write lock, so no join can interleave mid-broadcast.
    fn broadcast_state(&self) {
        let frame = ServerFrame::State(self.snapshot()).encode();
        let _ = self.state_tx.send(frame);
    }

    /// Release every session before the process exits.
    pub fn shutdown(&mut self) {
        info!("Releasing {} sessions", self.sessions.len());
        self.order.clear();
        self.sessions.clear();
        self.game_started = false;
        self.started_at = None;
    }

    fn send_all(&self, frame: Bytes) {
        let _ = self.control_tx.send(ControlBroadcast {
            to: Recipient::All,
            frame,
        });
    }

    fn send_to(&self, id: u32, frame: Bytes) {
        let _ = self.control_tx.send(ControlBroadcast {
            to: Recipient::One(id),
            frame,
        });
    }
}

/// Run the fixed-rate tick loop until shutdown is requested. Ticks only
/// advance the world while a round is running with at least one session;
/// with nobody connected the loop hibernates to save CPU.
pub async fn run_game_loop(
    state: Arc<RwLock<GameState>>,
    tick_interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = Duration::from_millis(tick_interval_ms);
    let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
    // Use Skip to catch up on missed ticks - keeps game speed consistent.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                let mut game = state.write().await;
                game.shutdown();
                info!("Tick loop stopped");
                return;
            }
        }

        // Hibernate when no users are connected to reduce CPU usage.
        {
            let game = state.read().await;
            if game.session_count() == 0 {
                drop(game);
                sleep(Duration::from_millis((tick_interval_ms * 4).max(100))).await;
                continue;
            }
        }

        let mut game = state.write().await;
        if !game.game_started {
            continue;
        }
        game.tick(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Bullet;

    fn test_state() -> (
        GameState,
        broadcast::Receiver<Bytes>,
        broadcast::Receiver<ControlBroadcast>,
    ) {
        let (state_tx, state_rx) = broadcast::channel(64);
        let (control_tx, control_rx) = broadcast::channel(64);
        let mut config = Config::default();
        // Keep the random spawner out of the scenarios below.
        config.powerup.max_active = 0;
        let game = GameState::new(&config, state_tx, control_tx);
        (game, state_rx, control_rx)
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn drain(rx: &mut broadcast::Receiver<ControlBroadcast>) -> Vec<ControlBroadcast> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Park a worm somewhere quiet so it cannot interfere with the scenario
    /// under test.
    fn park(game: &mut GameState, id: u32, position: Vec2, angle: f32) {
        let worm = &mut game.sessions.get_mut(&id).unwrap().worm;
        worm.position = position;
        worm.angle = angle;
        worm.path = vec![position];
    }

    #[test]
    fn test_join_assigns_stable_ids() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        for i in 0..3 {
            let (id, _) = game.try_join(addr(5000 + i), now).unwrap();
            assert_eq!(id, i as u32);
        }

        game.remove_session(1);
        assert_eq!(game.session_count(), 2);
        // Remaining ids untouched; the freed slot is reused by the next join.
        assert!(game.sessions.contains_key(&0));
        assert!(game.sessions.contains_key(&2));
        let (id, _) = game.try_join(addr(5010), now).unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_seventh_join_is_rejected() {
        let (mut game, _state_rx, mut control_rx) = test_state();
        let now = Instant::now();
        for i in 0..6 {
            assert!(game.try_join(addr(6000 + i), now).is_some());
        }
        assert!(game.try_join(addr(6006), now).is_none());
        assert_eq!(game.session_count(), 6);
        // No roster frame was emitted for the rejected socket.
        let frames = drain(&mut control_rx);
        assert_eq!(
            frames
                .iter()
                .filter(|m| m.frame.starts_with(b"PLAYER_UPDATE"))
                .count(),
            6 + 15 // one announcement each, plus roster replays to newcomers
        );
    }

    #[test]
    fn test_start_broadcasts_and_rearms_grace() {
        let (mut game, _state_rx, mut control_rx) = test_state();
        let now = Instant::now();
        game.start(now);
        assert!(!game.game_started, "cannot start with no sessions");

        game.try_join(addr(7000), now).unwrap();
        game.try_join(addr(7001), now).unwrap();
        drain(&mut control_rx);

        // Start long after joining: the join-time grace has expired, the
        // start re-arms it.
        let start_time = now + Duration::from_secs(100);
        game.start(start_time);
        assert!(game.game_started);
        let frames = drain(&mut control_rx);
        assert!(
            frames
                .iter()
                .any(|m| m.frame == ServerFrame::GameStarted.encode())
        );

        for session in game.sessions.values() {
            assert!(session.worm.is_invincible(start_time + Duration::from_secs(1)));
        }

        // A second START is a no-op.
        game.start(start_time + Duration::from_secs(1));
        assert!(drain(&mut control_rx).is_empty());
    }

    /// A wall of trail points laid across a worm's straight-line course.
    fn wall_across(game: &mut GameState, owner: u32, y: f32, x_range: std::ops::Range<i32>) {
        let worm = &mut game.sessions.get_mut(&owner).unwrap().worm;
        worm.path = x_range.map(|x| Vec2::new(x as f32, y)).collect();
    }

    #[test]
    fn test_grace_period_then_trail_kill() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, _) = game.try_join(addr(7100), now).unwrap();
        let (b, _) = game.try_join(addr(7101), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        park(&mut game, b, Vec2::new(600.0, 600.0), 0.0);
        wall_across(&mut game, b, 100.0, 100..140);

        // Inside the grace period the wall is ignored.
        game.tick(now + Duration::from_millis(100));
        assert!(game.sessions[&a].worm.alive);

        // Past the grace period the same wall kills.
        game.tick(now + Duration::from_secs(3));
        assert!(!game.sessions[&a].worm.alive);
    }

    #[test]
    fn test_ghost_is_immune_while_holding_up() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, input_a) = game.try_join(addr(7200), now).unwrap();
        let (b, _) = game.try_join(addr(7201), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        park(&mut game, b, Vec2::new(600.0, 600.0), 0.0);
        wall_across(&mut game, b, 100.0, 100..200);
        game.sessions.get_mut(&a).unwrap().worm.is_ghost = true;
        input_a.set(false, false, true);

        let after_grace = now + Duration::from_secs(3);
        for i in 0..5 {
            game.tick(after_grace + Duration::from_millis(16 * i));
        }
        assert!(game.sessions[&a].worm.alive);
        assert!(game.sessions[&a].worm.is_ghost);

        // Releasing forward drops the ghost; the wall kills on the next tick.
        input_a.set(false, false, false);
        game.tick(after_grace + Duration::from_millis(200));
        assert!(!game.sessions[&a].worm.is_ghost);
        assert!(!game.sessions[&a].worm.alive);
    }

    #[test]
    fn test_armed_worm_fires_once() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, input_a) = game.try_join(addr(7300), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        let worm = &mut game.sessions.get_mut(&a).unwrap().worm;
        worm.bullets_left = 1;
        worm.speed_boost_time_left = 0.0;
        input_a.set(false, false, true);

        let head_before = game.sessions[&a].worm.position;
        let angle_before = game.sessions[&a].worm.angle;
        game.tick(now + Duration::from_millis(16));

        let worm = &game.sessions[&a].worm;
        assert_eq!(worm.bullets_left, 0);
        let active: Vec<&Bullet> = worm.bullets.iter().filter(|b| b.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].angle, angle_before);
        // The bullet left the head at fire time and advanced one step.
        assert_eq!(
            active[0].position,
            head_before + Vec2::from_angle(angle_before) * game.config.bullet.speed
        );
        // Moved at base speed: shooting and boosting are exclusive.
        assert_eq!(
            worm.position,
            head_before + Vec2::from_angle(angle_before) * game.config.worm.speed
        );
    }

    #[test]
    fn test_boost_takes_priority_over_firing() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, input_a) = game.try_join(addr(7400), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        let worm = &mut game.sessions.get_mut(&a).unwrap().worm;
        worm.bullets_left = 1;
        worm.speed_boost_active = true;
        worm.speed_boost_time_left = 1.0;
        input_a.set(false, false, true);

        game.tick(now + Duration::from_millis(16));

        let worm = &game.sessions[&a].worm;
        assert_eq!(worm.bullets_left, 1, "no bullet fired while boosting");
        assert!(worm.bullets.iter().all(|b| !b.active));
        let boosted = game.config.worm.speed * game.config.powerup.boost_multiplier;
        assert_eq!(worm.position, Vec2::new(100.0 + boosted, 100.0));
        assert!(worm.speed_boost_time_left < 1.0);
    }

    #[test]
    fn test_boost_timer_expires() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, _) = game.try_join(addr(7450), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        let worm = &mut game.sessions.get_mut(&a).unwrap().worm;
        worm.speed_boost_active = true;
        worm.speed_boost_time_left = 0.01;

        game.tick(now + Duration::from_millis(16));
        let worm = &game.sessions[&a].worm;
        assert_eq!(worm.speed_boost_time_left, 0.0);
        assert!(!worm.speed_boost_active);
    }

    #[test]
    fn test_bullet_kill_and_frozen_trail() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, _) = game.try_join(addr(7500), now).unwrap();
        let (b, _) = game.try_join(addr(7501), now).unwrap();
        let (c, _) = game.try_join(addr(7502), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        park(&mut game, b, Vec2::new(300.0, 300.0), 0.0);
        park(&mut game, c, Vec2::new(600.0, 600.0), 0.0);

        // A bullet one step short of worm b's head; b moves +2 in x first.
        let shooter = &mut game.sessions.get_mut(&a).unwrap().worm;
        shooter.bullets[0] = Bullet {
            position: Vec2::new(292.0, 300.0),
            angle: 0.0,
            active: true,
        };

        game.tick(now + Duration::from_millis(16));

        assert!(!game.sessions[&b].worm.alive, "bullet kill ignores grace");
        assert!(!game.sessions[&a].worm.bullets[0].active);
        assert!(game.game_started, "three players, two still alive");

        // The victim's trail freezes; survivors keep growing.
        let frozen = game.sessions[&b].worm.path.len();
        let growing = game.sessions[&a].worm.path.len();
        for i in 2..5 {
            game.tick(now + Duration::from_millis(16 * i));
        }
        assert_eq!(game.sessions[&b].worm.path.len(), frozen);
        assert!(game.sessions[&a].worm.path.len() > growing);
    }

    #[test]
    fn test_bullet_leaves_arena_once() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, _) = game.try_join(addr(7600), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        let width = game.config.arena.width;
        let worm = &mut game.sessions.get_mut(&a).unwrap().worm;
        worm.bullets[1] = Bullet {
            position: Vec2::new(width - 5.0, 100.0),
            angle: 0.0,
            active: true,
        };

        game.tick(now + Duration::from_millis(16));
        let bullet = game.sessions[&a].worm.bullets[1];
        assert!(!bullet.active);
        assert!(bullet.position.x > width, "bullets do not wrap");
    }

    #[test]
    fn test_duel_ends_in_game_over() {
        let (mut game, _state_rx, mut control_rx) = test_state();
        let now = Instant::now();
        let (a, _) = game.try_join(addr(7700), now).unwrap();
        let (b, _) = game.try_join(addr(7701), now).unwrap();
        game.start(now);
        drain(&mut control_rx);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        park(&mut game, b, Vec2::new(600.0, 600.0), 0.0);
        game.sessions.get_mut(&b).unwrap().worm.alive = false;

        game.tick(now + Duration::from_millis(16));
        assert!(!game.game_started);
        let frames = drain(&mut control_rx);
        assert!(
            frames
                .iter()
                .any(|m| m.frame == ServerFrame::GameOver.encode())
        );

        // The round can be started again.
        game.start(now + Duration::from_secs(1));
        assert!(game.game_started);
        assert!(game.sessions[&b].worm.alive, "start respawns dead worms");
    }

    #[test]
    fn test_pickup_applies_exclusively() {
        let (mut game, _state_rx, _control_rx) = test_state();
        let now = Instant::now();
        let (a, input_a) = game.try_join(addr(7800), now).unwrap();
        game.start(now);

        park(&mut game, a, Vec2::new(100.0, 100.0), 0.0);
        let worm = &mut game.sessions.get_mut(&a).unwrap().worm;
        worm.is_ghost = true;
        input_a.set(false, false, true);
        game.world.powerups.push(crate::entity::Powerup {
            position: Vec2::new(102.0, 100.0),
            kind: protocol::PowerupKind::ExtraBullets,
        });

        game.tick(now + Duration::from_millis(16));

        let worm = &game.sessions[&a].worm;
        assert_eq!(worm.bullets_left, 3);
        assert!(!worm.is_ghost);
        assert!(!worm.speed_boost_active);
        assert!(game.world.powerups.is_empty());
    }

    #[test]
    fn test_tick_broadcasts_full_state() {
        let (mut game, mut state_rx, _control_rx) = test_state();
        let now = Instant::now();
        game.try_join(addr(7900), now).unwrap();
        game.try_join(addr(7901), now).unwrap();
        game.start(now);

        game.tick(now + Duration::from_millis(16));
        assert_eq!(game.tick_count, 1);

        let frame = state_rx.try_recv().unwrap();
        let text = std::str::from_utf8(&frame).unwrap();
        assert!(text.starts_with("STATE 2 "));
        // The frame decodes back to the live snapshot.
        let decoded = match ServerFrame::parse(text).unwrap() {
            ServerFrame::State(s) => s,
            other => panic!("expected STATE, got {other:?}"),
        };
        assert_eq!(decoded.worms.len(), 2);
        assert!(decoded.worms.iter().all(|w| w.alive));
    }
}
