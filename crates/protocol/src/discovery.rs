//! UDP LAN discovery payloads.
//!
//! A client broadcasts [`REQUEST`] to the discovery port; a live server
//! replies unicast with `BATTLE_NOODLES_SERVER <name> <tcpPort>`.

use bytes::Bytes;

use crate::{ProtocolError, TextWriter, TokenReader};

/// The probe payload clients broadcast, byte for byte.
pub const REQUEST: &str = "DISCOVER_BATTLE_NOODLES_SERVER";

/// Reply verb.
const REPLY: &str = "BATTLE_NOODLES_SERVER";

/// Build the unicast reply for a discovery probe. The server name is a
/// single token, so embedded whitespace is collapsed to underscores.
pub fn encode_reply(name: &str, tcp_port: u16) -> Bytes {
    let name = name.split_whitespace().collect::<Vec<_>>().join("_");
    let mut w = TextWriter::new();
    w.put_token(REPLY);
    w.put_token(if name.is_empty() { "server" } else { &name });
    w.put_u32(tcp_port as u32);
    w.finish()
}

/// Parse a discovery reply into `(server_name, tcp_port)`.
pub fn parse_reply(payload: &str) -> Result<(String, u16), ProtocolError> {
    let mut reader = TokenReader::new(payload);
    let verb = reader.get_token()?;
    if verb != REPLY {
        return Err(ProtocolError::UnknownMessage(verb.to_owned()));
    }
    let name = reader.get_token()?.to_owned();
    let port = reader.get_u32()?;
    let port =
        u16::try_from(port).map_err(|_| ProtocolError::InvalidNumber(port.to_string()))?;
    Ok((name, port))
}
