//! A single MPD control connection.
//!
//! A [`Connection`] owns one bidirectional stream plus the buffer in front
//! of it. Text lines and binary frames are read from the same buffer: a
//! `binary: <n>` line is followed by exactly `n` raw bytes, which must be
//! consumed before the next line is parsed and are never scanned for line
//! breaks.
//!
//! Connections are not shared or reused. Each logical operation opens one,
//! runs its exchange and closes it again, so no state survives between
//! calls.
//!
//! # Example
//!
//! ```no_run
//! use mpdcover::connection::Connection;
//!
//! let mut connection = Connection::open("localhost:6600").await?;
//! let status = connection.execute("status").await?;
//! connection.close().await?;
//! ```

use std::io;

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufStream},
    net::TcpStream,
};

use crate::{
    error::{Error, Result},
    protocol::{Ack, Line, ResponseMap, BINARY, OK},
};

/// Longest response line accepted, terminator included.
pub const MAX_LINE: usize = 1024 * 1024;

/// Largest binary frame accepted.
///
/// MPD sends 8 KiB frames by default and its `binarylimit` command cannot
/// raise that beyond a few megabytes.
pub const MAX_FRAME: usize = 16 * 1024 * 1024;

/// An open connection that passed the handshake.
pub struct Connection<S = TcpStream> {
    stream: BufStream<S>,

    /// Protocol version announced in the greeting, if any.
    version: Option<String>,
}

impl Connection<TcpStream> {
    /// Dials `address` (`host:port`) and performs the handshake.
    ///
    /// No retry is attempted.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::Connection`](crate::error::ErrorKind::Connection) when
    ///   the address cannot be reached
    /// * [`ErrorKind::Handshake`](crate::error::ErrorKind::Handshake) when
    ///   the greeting does not start with `OK`
    pub async fn open(address: &str) -> Result<Self> {
        debug!("connecting to {address}");

        let stream = TcpStream::connect(address)
            .await
            .map_err(|e| io::Error::new(e.kind(), format!("{address}: {e}")))?;

        // Commands are single short lines; do not wait to coalesce them.
        if let Err(e) = stream.set_nodelay(true) {
            trace!("could not disable nagle: {e}");
        }

        Self::handshake(stream).await
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an established stream and validates the server greeting.
    ///
    /// # Errors
    ///
    /// Returns a handshake error carrying the raw greeting when its first
    /// token is not `OK`, or a connection error when the stream fails or
    /// closes before a full line arrives.
    pub async fn handshake(stream: S) -> Result<Self> {
        let mut stream = BufStream::new(stream);

        let mut greeting = String::new();
        Self::read_raw_line(&mut stream, &mut greeting).await?;
        let greeting = greeting.strip_suffix('\n').unwrap_or(&greeting);

        if greeting.split_whitespace().next() != Some(OK) {
            return Err(Error::handshake(greeting.to_owned()));
        }

        let version = greeting
            .strip_prefix("OK MPD ")
            .map(|version| version.trim().to_owned());
        match version {
            Some(ref version) => debug!("connected to mpd {version}"),
            None => debug!("connected to server greeting with \"{greeting}\""),
        }

        Ok(Self { stream, version })
    }

    /// Protocol version from the greeting, e.g. `0.23.5`.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Reads one `\n`-terminated line of at most [`MAX_LINE`] bytes into
    /// `buf`.
    ///
    /// End of stream before the terminator is reported as
    /// [`io::ErrorKind::UnexpectedEof`].
    async fn read_raw_line(stream: &mut BufStream<S>, buf: &mut String) -> Result<()> {
        (&mut *stream).take(MAX_LINE as u64).read_line(buf).await?;
        if !buf.ends_with('\n') {
            if buf.len() >= MAX_LINE {
                return Err(Error::protocol(format!(
                    "response line exceeds {MAX_LINE} bytes"
                )));
            }

            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed in the middle of a response",
            )
            .into());
        }

        Ok(())
    }

    /// Sends one command line.
    ///
    /// Exactly one newline is appended; a newline already ending `command`
    /// is dropped first.
    ///
    /// # Errors
    ///
    /// Returns a connection error when writing or flushing fails.
    pub async fn send(&mut self, command: &str) -> Result<()> {
        let command = command.strip_suffix('\n').unwrap_or(command);
        trace!("> {command}");

        self.stream.write_all(command.as_bytes()).await?;
        self.stream.write_all(b"\n").await?;
        self.stream.flush().await?;

        Ok(())
    }

    /// Reads and tokenizes the next response line.
    ///
    /// # Errors
    ///
    /// Propagates read failures, including end of stream, as connection
    /// errors.
    pub async fn read_line(&mut self) -> Result<Line> {
        let mut buf = String::new();
        Self::read_raw_line(&mut self.stream, &mut buf).await?;

        let line = Line::parse(&buf);
        trace!("< {line}");

        Ok(line)
    }

    /// Reads a binary frame of exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// A stream that ends before `len` bytes arrived yields a connection
    /// error; partial frames are never returned. Lengths above
    /// [`MAX_FRAME`] are a format error and nothing is read.
    pub async fn read_frame(&mut self, len: usize) -> Result<Vec<u8>> {
        Self::check_frame(len)?;

        let mut frame = vec![0; len];
        self.stream.read_exact(&mut frame).await?;
        trace!("< {len} bytes of binary data");

        Ok(frame)
    }

    /// Consumes a binary frame of exactly `len` bytes without keeping it.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::read_frame`].
    pub async fn skip_frame(&mut self, len: usize) -> Result<()> {
        Self::check_frame(len)?;

        let expected = len as u64;
        let mut frame = (&mut self.stream).take(expected);
        let skipped = tokio::io::copy(&mut frame, &mut tokio::io::sink()).await?;

        if skipped < expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("binary frame ended after {skipped} of {len} bytes"),
            )
            .into());
        }

        trace!("< {len} bytes of binary data skipped");
        Ok(())
    }

    fn check_frame(len: usize) -> Result<()> {
        if len > MAX_FRAME {
            return Err(Error::format(format!(
                "binary frame of {len} bytes exceeds the {MAX_FRAME} byte limit"
            )));
        }

        Ok(())
    }

    /// Runs one command and collects its response fields.
    ///
    /// Every `key: value` line before the final `OK` is recorded, later
    /// duplicates overwriting earlier ones. Field names are not validated,
    /// so fields introduced by newer servers come through as well. Binary
    /// frames are consumed and discarded.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::Protocol`](crate::error::ErrorKind::Protocol) with the
    ///   server's [`Ack`] when the command is rejected
    /// * [`ErrorKind::Format`](crate::error::ErrorKind::Format) when a binary
    ///   length does not parse or exceeds [`MAX_FRAME`]
    /// * [`ErrorKind::Connection`](crate::error::ErrorKind::Connection) on
    ///   transport failures
    pub async fn execute(&mut self, command: &str) -> Result<ResponseMap> {
        self.send(command).await?;

        let mut response = ResponseMap::new();
        loop {
            let line = self.read_line().await?;

            if line.is_ok() {
                return Ok(response);
            }

            if line.is_ack() {
                return Err(Ack::parse(&line.value).into());
            }

            if line.key == BINARY {
                let len = line.integer()?;
                self.skip_frame(len).await?;
                continue;
            }

            if line.is_separator() {
                continue;
            }

            response.insert(line.key, line.value);
        }
    }

    /// Shuts the connection down.
    ///
    /// Consumes the connection, so it cannot be closed twice. Dropping a
    /// connection without calling this releases the socket as well.
    ///
    /// # Errors
    ///
    /// Returns a connection error when the shutdown fails.
    pub async fn close(mut self) -> Result<()> {
        self.stream.shutdown().await?;
        trace!("connection closed");

        Ok(())
    }
}
