//! Chunked album art download.
//!
//! MPD caps the size of any single binary frame (8 KiB by default), so a
//! picture is fetched with repeated `albumart "<uri>" <offset>` requests.
//! Every response carries the total `size` and one `binary` chunk starting
//! at `offset`:
//!
//! ```text
//! > albumart "Can/Tago Mago/01 Paperhouse.flac" 0
//! < size: 20374
//! < binary: 8192
//! < <8192 bytes>
//! < OK
//! > albumart "Can/Tago Mago/01 Paperhouse.flac" 8192
//! ...
//! ```
//!
//! Chunks are appended to a [`CoverSink`] until `offset` reaches `size`.

use std::{
    future::Future,
    io::{self, Cursor, SeekFrom},
};

use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use crate::{
    connection::Connection,
    error::{Error, Result},
    protocol::{command, Ack, BINARY, SIZE},
};

/// Destination of a cover art download.
///
/// Downloads always overwrite: the sink is reset before the first chunk is
/// written.
pub trait CoverSink: AsyncWrite + Unpin + Send {
    /// Truncates the sink to zero length and rewinds it.
    fn reset(&mut self) -> impl Future<Output = io::Result<()>> + Send;
}

impl CoverSink for tokio::fs::File {
    async fn reset(&mut self) -> io::Result<()> {
        self.set_len(0).await?;
        self.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }
}

impl CoverSink for Cursor<Vec<u8>> {
    fn reset(&mut self) -> impl Future<Output = io::Result<()>> + Send {
        self.get_mut().clear();
        self.set_position(0);
        std::future::ready(Ok(()))
    }
}

/// Downloads the cover art of `uri` into `sink`.
///
/// Returns the number of bytes written. On failure, chunks received
/// before the error stay in the sink; callers that need all or nothing
/// should download into a temporary sink.
///
/// # Errors
///
/// * [`ErrorKind::Protocol`](crate::error::ErrorKind::Protocol) when the
///   server rejects a request, or answers one without making progress
/// * [`ErrorKind::Format`](crate::error::ErrorKind::Format) when `size` or
///   `binary` does not parse, or a chunk runs past the announced `size`
/// * [`ErrorKind::Connection`](crate::error::ErrorKind::Connection) on
///   transport failures, including frames cut short
/// * [`ErrorKind::Sink`](crate::error::ErrorKind::Sink) when the sink
///   cannot be written
pub async fn download<S, W>(connection: &mut Connection<S>, uri: &str, sink: &mut W) -> Result<usize>
where
    S: AsyncRead + AsyncWrite + Unpin,
    W: CoverSink,
{
    sink.reset().await.map_err(Error::sink)?;

    // `size` is learned from the first response; start at 1 to get there.
    let mut offset = 0;
    let mut size = 1;

    while offset < size {
        connection.send(&command::albumart(uri, offset)).await?;

        let mut received = 0;
        loop {
            let line = connection.read_line().await?;

            if line.is_ok() {
                break;
            }

            if line.is_ack() {
                return Err(Ack::parse(&line.value).into());
            }

            match line.key.as_str() {
                SIZE => size = line.integer()?,
                BINARY => {
                    let len = line.integer()?;
                    let remaining = size.saturating_sub(offset + received);
                    if len > remaining {
                        return Err(Error::format(format!(
                            "binary chunk of {len} bytes at offset {} exceeds the {size} byte picture",
                            offset + received
                        )));
                    }

                    let chunk = connection.read_frame(len).await?;
                    sink.write_all(&chunk).await.map_err(Error::sink)?;
                    received += chunk.len();
                }
                _ => {}
            }
        }

        if received == 0 && offset < size {
            return Err(Error::protocol(format!(
                "no data for {uri} at offset {offset} of {size} bytes"
            )));
        }

        offset += received;
        trace!("received {offset} of {size} bytes for {uri}");
    }

    sink.flush().await.map_err(Error::sink)?;
    debug!("downloaded {offset} bytes of cover art for {uri}");

    Ok(offset)
}
