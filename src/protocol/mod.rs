//! Wire-level vocabulary of the MPD control protocol.
//!
//! The protocol is line oriented:
//!
//! * The server greets with `OK MPD <version>`
//! * The client sends one command per line
//! * The server answers with `key: value` lines and ends with either `OK`
//!   or `ACK <message>`
//! * `binary: <n>` is followed by exactly `n` raw bytes and a newline
//!
//! This module holds the pieces that do not touch I/O: the line tokenizer,
//! `ACK` decoding and command construction. Reading and writing lives in
//! [`crate::connection`].

use std::collections::HashMap;

pub mod ack;
pub mod command;
pub mod line;

pub use ack::Ack;
pub use line::Line;

/// Fields of one response, keyed by field name.
///
/// Repeated fields overwrite earlier ones.
pub type ResponseMap = HashMap<String, String>;

/// First token of a valid greeting, and the terminal success line.
pub const OK: &str = "OK";

/// Terminal failure line.
pub const ACK: &str = "ACK";

/// Field announcing an inline binary frame.
pub const BINARY: &str = "binary";

/// Field carrying the total size of a chunked resource.
pub const SIZE: &str = "size";
