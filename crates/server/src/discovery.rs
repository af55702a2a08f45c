//! UDP LAN discovery responder.
//!
//! Stateless request/response: clients broadcast a fixed probe payload and
//! get back the server name and TCP port. No coupling to the game state.

use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::config::Config;

/// Answer discovery probes until the task is dropped.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let socket = UdpSocket::bind((config.server.bind.as_str(), config.server.discovery_port)).await?;
    info!(
        "Discovery responder on udp://{}:{}",
        config.server.bind, config.server.discovery_port
    );

    let reply = protocol::discovery::encode_reply(&config.server.name, config.server.port);
    let mut buf = [0u8; 128];

    loop {
        let (n, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                warn!("Discovery receive failed: {}", e);
                continue;
            }
        };
        if &buf[..n] == protocol::discovery::REQUEST.as_bytes() {
            debug!("Discovery probe from {}", peer);
            if let Err(e) = socket.send_to(&reply, peer).await {
                warn!("Discovery reply to {} failed: {}", peer, e);
            }
        }
    }
}
