//! Shutdown signal handling.
//!
//! * Unix: SIGTERM and Ctrl-C (SIGINT)
//! * Windows: Ctrl-C only
//!
//! Dropping an in-flight call closes its connection, so the binary
//! cancels by racing its work against [`Handler::recv`].

use std::{fmt, future::Future, io};

use crate::error::Result;

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

/// Signal that asked for a shutdown.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[expect(clippy::module_name_repetitions)]
pub enum ShutdownSignal {
    /// Interrupt signal (Ctrl-C/SIGINT)
    Interrupt,
    /// Termination signal (SIGTERM)
    Terminate,
}

impl ShutdownSignal {
    /// Conventional exit code for a process ended by this signal.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownSignal::Interrupt => 130,
            ShutdownSignal::Terminate => 143,
        }
    }
}

pub struct Handler {
    #[cfg(unix)]
    sigterm: Signal,
}

impl Handler {
    /// Registers the signal handlers.
    ///
    /// # Errors
    ///
    /// Returns error if signal handlers cannot be registered.
    pub fn new() -> Result<Self> {
        #[cfg(unix)]
        {
            Ok(Self {
                sigterm: signal(SignalKind::terminate())?,
            })
        }

        #[cfg(not(unix))]
        Ok(Self {})
    }

    /// Waits for the next shutdown signal.
    pub async fn recv(&mut self) -> ShutdownSignal {
        #[cfg(unix)]
        {
            tokio::select! {
                signal = interrupt(tokio::signal::ctrl_c()) => signal,
                _ = self.sigterm.recv() => ShutdownSignal::Terminate,
            }
        }

        #[cfg(not(unix))]
        interrupt(tokio::signal::ctrl_c()).await
    }
}

/// Resolves once `listener` reports Ctrl-C.
///
/// A listener that fails is logged and never resolves.
async fn interrupt<F>(listener: F) -> ShutdownSignal
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(e) = listener.await {
        error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }

    ShutdownSignal::Interrupt
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "Ctrl+C"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}
