//! Game server implementation.
//!
//! One task per connection reads command frames and applies them to the
//! shared game state; the tick loop simulates and fans snapshots out through
//! broadcast channels. Connection tasks never hold the coarse lock across
//! socket I/O, so a stalled client can only slow its own stream.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast, watch};
use tracing::{debug, error, info, warn};

use protocol::frames::{ClientCommand, ServerFrame};

use crate::config::Config;
use crate::discovery;
use crate::entity::InputHandle;

pub mod game;
pub mod session;

pub use game::{ControlBroadcast, GameState, Recipient, run_game_loop};

/// Run the game server until a shutdown is requested.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on tcp://{}", addr);

    // Fan-out channels: state snapshots every tick, control frames as events
    // happen. Sends never block; a lagging receiver drops frames.
    let (state_tx, _state_rx) = broadcast::channel::<Bytes>(16);
    let (control_tx, _control_rx) = broadcast::channel::<ControlBroadcast>(256);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let game_state = Arc::new(RwLock::new(GameState::new(
        &config,
        state_tx.clone(),
        control_tx.clone(),
    )));

    // The discovery responder is stateless and runs on its own.
    {
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(e) = discovery::run(config).await {
                error!("Discovery responder failed: {}", e);
            }
        });
    }

    let tick_task = tokio::spawn(run_game_loop(
        Arc::clone(&game_state),
        config.server.tick_interval_ms,
        shutdown_rx.clone(),
    ));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = accepted?;
                let game_state = Arc::clone(&game_state);
                let state_rx = state_tx.subscribe();
                let control_rx = control_tx.subscribe();
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    if let Err(e) =
                        handle_connection(stream, addr, game_state, state_rx, control_rx, shutdown_rx)
                            .await
                    {
                        warn!("Connection error from {}: {}", addr, e);
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                let _ = shutdown_tx.send(true);
                break;
            }
        }
    }

    // The tick loop observes the shutdown flag between ticks and releases
    // every session before the process exits.
    tick_task.await?;
    info!("Server stopped");
    Ok(())
}

/// Handle a single client connection: parse inbound command frames, forward
/// outbound broadcasts, and tear the session down on EOF or error.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<RwLock<GameState>>,
    mut state_rx: broadcast::Receiver<Bytes>,
    mut control_rx: broadcast::Receiver<ControlBroadcast>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    info!("New connection from {}", addr);
    let (mut reader, mut writer) = stream.into_split();

    let mut session_id: Option<u32> = None;
    let mut input: Option<InputHandle> = None;
    let mut buf = vec![0u8; 8192];

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            read = reader.read(&mut buf) => {
                let n = match read {
                    Ok(0) => {
                        info!("Client {} disconnected", addr);
                        break Ok(());
                    }
                    Ok(n) => n,
                    Err(e) => break Err(e.into()),
                };
                // One read is one frame.
                let Ok(frame) = std::str::from_utf8(&buf[..n]) else {
                    debug!("Dropping non-text frame from {}", addr);
                    continue;
                };
                match ClientCommand::parse(frame) {
                    Ok(ClientCommand::Join) => {
                        if session_id.is_some() {
                            debug!("Duplicate JOIN from {}", addr);
                            continue;
                        }
                        let joined = {
                            let mut game = state.write().await;
                            game.try_join(addr, Instant::now())
                        };
                        // The lock is released before any reply is written.
                        match joined {
                            Some((id, handle)) => {
                                session_id = Some(id);
                                input = Some(handle);
                                if let Err(e) =
                                    writer.write_all(&ServerFrame::PlayerId(id).encode()).await
                                {
                                    break Err(e.into());
                                }
                            }
                            None => {
                                let _ = writer.write_all(&ServerFrame::ServerFull.encode()).await;
                                break Ok(());
                            }
                        }
                    }
                    Ok(ClientCommand::Start) => {
                        let mut game = state.write().await;
                        game.start(Instant::now());
                    }
                    Ok(ClientCommand::Input { left, right, up }) => {
                        // Written through the worm's own lock; the coarse
                        // game lock is never touched for input traffic.
                        if let Some(handle) = &input {
                            handle.set(left, right, up);
                        }
                    }
                    Err(e) => {
                        debug!("Dropping bad frame from {}: {}", addr, e);
                    }
                }
            }
            frame = state_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if session_id.is_some() {
                            if let Err(e) = writer.write_all(&frame).await {
                                break Err(e.into());
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Full snapshots are self-healing; the next one
                        // resynchronizes this client.
                        debug!("Client {} lagged {} state frames", addr, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break Ok(()),
                }
            }
            control = control_rx.recv() => {
                match control {
                    Ok(msg) => {
                        let deliver = match msg.to {
                            Recipient::All => session_id.is_some(),
                            Recipient::One(id) => session_id == Some(id),
                        };
                        if deliver {
                            if let Err(e) = writer.write_all(&msg.frame).await {
                                break Err(e.into());
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break Ok(()),
                }
            }
            _ = shutdown.changed() => break Ok(()),
        }
    };

    if let Some(id) = session_id {
        let mut game = state.write().await;
        game.remove_session(id);
    }

    result
}
