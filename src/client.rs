//! Connection-per-call client.
//!
//! [`Client`] is the entry point for callers. Every call dials the server,
//! runs one exchange and closes the connection again, so calls never share
//! state and need no locking. The configured timeout bounds each call as a
//! whole, handshake included.
//!
//! # Example
//!
//! ```no_run
//! use mpdcover::{client::Client, config::Config};
//!
//! let client = Client::new(Config::default());
//! let status = client.execute("status").await?;
//!
//! let mut file = tokio::fs::File::create("cover.jpg").await?;
//! client.download_cover("Can/Tago Mago/01 Paperhouse.flac", &mut file).await?;
//! ```

use std::future::Future;

use crate::{
    config::Config,
    connection::Connection,
    cover::{self, CoverSink},
    error::Result,
    protocol::{command, ResponseMap},
};

#[derive(Clone, Debug)]
pub struct Client {
    config: Config,
}

impl Client {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs `command` and returns its response fields.
    ///
    /// # Errors
    ///
    /// Returns an error when the server cannot be reached, rejects the
    /// handshake or the command, sends a malformed response, or the call
    /// exceeds the configured timeout.
    pub async fn execute(&self, command: &str) -> Result<ResponseMap> {
        self.with_deadline(async {
            let mut connection = Connection::open(&self.config.address()).await?;
            let response = connection.execute(command).await?;
            Self::close(connection).await;

            Ok(response)
        })
        .await
    }

    /// Downloads the cover art of `uri` into `sink`, returning its size.
    ///
    /// # Errors
    ///
    /// See [`cover::download`]. The call also fails when it exceeds the
    /// configured timeout; bytes written so far stay in the sink.
    pub async fn download_cover<W>(&self, uri: &str, sink: &mut W) -> Result<usize>
    where
        W: CoverSink,
    {
        self.with_deadline(async {
            let mut connection = Connection::open(&self.config.address()).await?;
            let size = cover::download(&mut connection, uri, sink).await?;
            Self::close(connection).await;

            Ok(size)
        })
        .await
    }

    /// URI of the song currently playing, if any.
    ///
    /// # Errors
    ///
    /// Same as [`Client::execute`].
    pub async fn current_file(&self) -> Result<Option<String>> {
        let mut song = self.execute(command::CURRENT_SONG).await?;
        Ok(song.remove("file"))
    }

    async fn with_deadline<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, call).await?,
            None => call.await,
        }
    }

    /// The exchange already succeeded, so a failing shutdown is not worth
    /// reporting to the caller.
    async fn close(connection: Connection) {
        if let Err(e) = connection.close().await {
            debug!("error closing connection: {e}");
        }
    }
}
