//! Client for the Music Player Daemon (MPD) control protocol.
//!
//! Two operations are supported:
//!
//! * Running a command and collecting its `key: value` response fields
//! * Downloading album art, which the server hands out in bounded chunks
//!
//! Each operation opens its own connection and closes it when done. See
//! [`client::Client`] for the entry point and [`connection::Connection`]
//! for the protocol engine underneath.
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod connection;
pub mod cover;
pub mod error;
pub mod protocol;
pub mod signal;
