//! Server -> Client frame building and parsing.
//!
//! The `STATE` frame carries the entire world every tick:
//!
//! ```text
//! STATE <numWorms> <numPowerups>
//!       {<px> <py> <type>} x numPowerups
//!       {<pathLen> <x> <y> <angle> <alive> <bulletsLeft> <boostTimeLeft>
//!        <boostActive> <ghost> <fullPathLen>
//!        {<bx> <by> <bangle>} x 3
//!        {<x> <y>} x pathLen} x numWorms
//! ```
//!
//! `fullPathLen` always equals `pathLen`; it is carried for wire
//! compatibility and nothing more. A `0 0 0` bullet triple denotes an empty
//! slot.

use bytes::Bytes;
use glam::Vec2;

use crate::{MAX_BULLETS, Position, PowerupKind, ProtocolError, TextWriter, TokenReader};

/// An in-flight bullet as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BulletState {
    pub position: Position,
    pub angle: f32,
}

/// One worm block of a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct WormState {
    pub position: Position,
    pub angle: f32,
    pub alive: bool,
    pub bullets_left: u8,
    pub boost_time_left: f32,
    pub boost_active: bool,
    pub ghost: bool,
    pub bullets: [Option<BulletState>; MAX_BULLETS],
    pub path: Vec<Position>,
}

/// An active power-up as seen on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerupState {
    pub position: Position,
    pub kind: PowerupKind,
}

/// The full world state broadcast once per tick. Worms appear in session
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub powerups: Vec<PowerupState>,
    pub worms: Vec<WormState>,
}

/// A server -> client message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerFrame {
    /// Session id assigned on join.
    PlayerId(u32),
    /// The simulation has begun.
    GameStarted,
    /// The round ended; the simulation is idle until the next `START`.
    GameOver,
    /// Roster entry: a player's id and display name.
    PlayerUpdate { id: u32, name: String },
    /// Join rejected at capacity; the connection is closed after this.
    ServerFull,
    /// Full world snapshot.
    State(Snapshot),
}

impl ServerFrame {
    /// Build the wire frame for this message.
    pub fn encode(&self) -> Bytes {
        match self {
            ServerFrame::PlayerId(id) => {
                let mut w = TextWriter::new();
                w.put_token("PLAYER_ID");
                w.put_u32(*id);
                w.finish()
            }
            ServerFrame::GameStarted => Bytes::from_static(b"GAME_STARTED"),
            ServerFrame::GameOver => Bytes::from_static(b"GAME_OVER"),
            ServerFrame::PlayerUpdate { id, name } => {
                let mut w = TextWriter::new();
                w.put_token("PLAYER_UPDATE");
                w.put_u32(*id);
                w.put_token(name);
                w.finish()
            }
            ServerFrame::ServerFull => Bytes::from_static(b"Server full"),
            ServerFrame::State(snapshot) => encode_state(snapshot),
        }
    }

    /// Parse a server frame. This is the client-side parser.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let mut reader = TokenReader::new(frame);
        match reader.get_token()? {
            "PLAYER_ID" => Ok(ServerFrame::PlayerId(reader.get_u32()?)),
            "GAME_STARTED" => Ok(ServerFrame::GameStarted),
            "GAME_OVER" => Ok(ServerFrame::GameOver),
            "PLAYER_UPDATE" => {
                let id = reader.get_u32()?;
                let name = reader.get_token()?.to_owned();
                Ok(ServerFrame::PlayerUpdate { id, name })
            }
            "Server" if reader.try_get_token() == Some("full") => Ok(ServerFrame::ServerFull),
            "STATE" => Ok(ServerFrame::State(parse_state(&mut reader)?)),
            verb => Err(ProtocolError::UnknownMessage(verb.to_owned())),
        }
    }
}

fn encode_state(snapshot: &Snapshot) -> Bytes {
    // Path points dominate the frame; size the buffer for them up front.
    let points: usize = snapshot.worms.iter().map(|w| w.path.len()).sum();
    let mut w = TextWriter::with_capacity(64 + snapshot.worms.len() * 96 + points * 16);

    w.put_token("STATE");
    w.put_usize(snapshot.worms.len());
    w.put_usize(snapshot.powerups.len());

    for powerup in &snapshot.powerups {
        w.put_f32(powerup.position.x);
        w.put_f32(powerup.position.y);
        w.put_u8(powerup.kind.to_wire());
    }

    for worm in &snapshot.worms {
        w.put_usize(worm.path.len());
        w.put_f32(worm.position.x);
        w.put_f32(worm.position.y);
        w.put_f32(worm.angle);
        w.put_flag(worm.alive);
        w.put_u8(worm.bullets_left);
        w.put_f32(worm.boost_time_left);
        w.put_flag(worm.boost_active);
        w.put_flag(worm.ghost);
        w.put_usize(worm.path.len());

        for slot in &worm.bullets {
            match slot {
                Some(bullet) => {
                    w.put_f32(bullet.position.x);
                    w.put_f32(bullet.position.y);
                    w.put_f32(bullet.angle);
                }
                None => {
                    w.put_token("0");
                    w.put_token("0");
                    w.put_token("0");
                }
            }
        }

        for point in &worm.path {
            w.put_f32(point.x);
            w.put_f32(point.y);
        }
    }

    w.finish()
}

fn parse_state(reader: &mut TokenReader<'_>) -> Result<Snapshot, ProtocolError> {
    let num_worms = reader.get_usize()?;
    let num_powerups = reader.get_usize()?;

    let mut powerups = Vec::with_capacity(num_powerups);
    for _ in 0..num_powerups {
        let x = reader.get_f32()?;
        let y = reader.get_f32()?;
        let kind = PowerupKind::from_wire(reader.get_u8()?)?;
        powerups.push(PowerupState {
            position: Vec2::new(x, y),
            kind,
        });
    }

    let mut worms = Vec::with_capacity(num_worms);
    for _ in 0..num_worms {
        let path_len = reader.get_usize()?;
        let x = reader.get_f32()?;
        let y = reader.get_f32()?;
        let angle = reader.get_f32()?;
        let alive = reader.get_flag()?;
        let bullets_left = reader.get_u8()?;
        let boost_time_left = reader.get_f32()?;
        let boost_active = reader.get_flag()?;
        let ghost = reader.get_flag()?;
        // fullPathLen duplicates pathLen; consume and ignore.
        let _ = reader.get_usize()?;

        let mut bullets = [None; MAX_BULLETS];
        for slot in bullets.iter_mut() {
            let bx = reader.get_f32()?;
            let by = reader.get_f32()?;
            let bangle = reader.get_f32()?;
            if bx != 0.0 || by != 0.0 || bangle != 0.0 {
                *slot = Some(BulletState {
                    position: Vec2::new(bx, by),
                    angle: bangle,
                });
            }
        }

        let mut path = Vec::with_capacity(path_len);
        for _ in 0..path_len {
            let px = reader.get_f32()?;
            let py = reader.get_f32()?;
            path.push(Vec2::new(px, py));
        }

        worms.push(WormState {
            position: Vec2::new(x, y),
            angle,
            alive,
            bullets_left,
            boost_time_left,
            boost_active,
            ghost,
            bullets,
            path,
        });
    }

    Ok(Snapshot { powerups, worms })
}
