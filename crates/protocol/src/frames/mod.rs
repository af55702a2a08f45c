//! Frame definitions for the Battle Noodles protocol.
//!
//! This module contains both client->server and server->client frame types.
//! One TCP read is one frame; there is no length prefix or newline framing.

mod client;
mod server;

pub use client::*;
pub use server::*;
