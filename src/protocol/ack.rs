//! Server rejections.
//!
//! MPD reports failures as `ACK [<code>@<index>] {<command>} <message>`,
//! where `index` is the position of the failing command in a command list.
//! The raw text is always kept: it is what operators see.

use std::fmt;

/// Error code for "no such object", e.g. a song without cover art.
pub const NO_EXIST: u32 = 50;

/// A decoded `ACK` line.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Ack {
    raw: String,
    code: Option<u32>,
    index: Option<u32>,
    command: Option<String>,
    message: String,
}

impl Ack {
    /// Decodes the text following `ACK `.
    ///
    /// Text that does not follow the usual layout is kept as the message,
    /// with the structured parts left empty.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match Self::decode(raw) {
            Some((code, index, command, message)) => Self {
                raw: raw.to_owned(),
                code: Some(code),
                index: Some(index),
                command: Some(command.to_owned()),
                message: message.to_owned(),
            },
            None => Self {
                raw: raw.to_owned(),
                code: None,
                index: None,
                command: None,
                message: raw.to_owned(),
            },
        }
    }

    fn decode(raw: &str) -> Option<(u32, u32, &str, &str)> {
        let rest = raw.strip_prefix('[')?;
        let (position, rest) = rest.split_once(']')?;
        let (code, index) = position.split_once('@')?;

        let rest = rest.trim_start().strip_prefix('{')?;
        let (command, message) = rest.split_once('}')?;

        Some((
            code.parse().ok()?,
            index.parse().ok()?,
            command,
            message.trim_start(),
        ))
    }

    /// The text as sent by the server.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn code(&self) -> Option<u32> {
        self.code
    }

    #[must_use]
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Name of the command that failed. Empty for failures outside of a
    /// command, such as a malformed request line.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn is_no_exist(&self) -> bool {
        self.code == Some(NO_EXIST)
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::error::Error for Ack {}
