//! Client -> Server command parsing.

use bytes::Bytes;

use crate::{ProtocolError, TextWriter, TokenReader};

/// Parsed client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCommand {
    /// Request a session and worm.
    Join,
    /// Begin the simulation if it has not started yet.
    Start,
    /// Overwrite the session's input snapshot. Flags arrive as integers,
    /// nonzero meaning held.
    Input { left: bool, right: bool, up: bool },
}

impl ClientCommand {
    /// Parse a command frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let mut reader = TokenReader::new(frame);
        match reader.get_token()? {
            "JOIN" => Ok(ClientCommand::Join),
            "START" => Ok(ClientCommand::Start),
            "INPUT" => {
                let left = reader.get_flag()?;
                let right = reader.get_flag()?;
                let up = reader.get_flag()?;
                Ok(ClientCommand::Input { left, right, up })
            }
            verb => Err(ProtocolError::UnknownCommand(verb.to_owned())),
        }
    }

    /// Build the wire frame for this command.
    pub fn encode(&self) -> Bytes {
        let mut w = TextWriter::new();
        match *self {
            ClientCommand::Join => w.put_token("JOIN"),
            ClientCommand::Start => w.put_token("START"),
            ClientCommand::Input { left, right, up } => {
                w.put_token("INPUT");
                w.put_flag(left);
                w.put_flag(right);
                w.put_flag(up);
            }
        }
        w.finish()
    }
}
