//! Client configuration.
//!
//! Settings come from three layers, in order of precedence from highest to
//! lowest: command line arguments, a TOML configuration file and the hard
//! coded defaults below. A configuration file looks like:
//!
//! ```toml
//! host = "music.local"
//! port = 6600
//! timeout = 10 # seconds, 0 disables the deadline
//! ```

use std::{fs, io, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Config {
    /// Host name or IP address of the server.
    pub host: String,

    /// TCP port of the server.
    pub port: u16,

    /// Deadline for a whole call, from dialing to the final `OK`.
    ///
    /// `None` waits indefinitely on a server that stops responding.
    pub timeout: Option<Duration>,
}

impl Config {
    pub const DEFAULT_HOST: &'static str = "localhost";

    pub const DEFAULT_PORT: u16 = 6600;

    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Configuration files are tiny; refuse anything larger.
    const MAX_FILE_SIZE: u64 = 64 * 1024;

    /// Loads a configuration file, filling in defaults for missing keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is too large, or is
    /// not valid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Prevent out-of-memory condition: the file should be small.
        let file_size = fs::metadata(path).map_err(|e| Self::io_error(path, e))?.len();
        if file_size > Self::MAX_FILE_SIZE {
            return Err(Error::invalid_argument(format!(
                "{} is too large ({file_size} bytes)",
                path.display()
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| Self::io_error(path, e))?;
        let config = contents.parse::<Self>().map_err(|e| {
            Error::invalid_argument(format!("{} format is invalid: {}", path.display(), e.error))
        })?;

        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    fn io_error(path: &Path, e: io::Error) -> Error {
        Error::invalid_argument(io::Error::new(e.kind(), format!("{}: {e}", path.display())))
    }

    /// Sets the deadline in whole seconds, where zero disables it.
    pub fn set_timeout_secs(&mut self, secs: u64) {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    /// Address to dial, in `host:port` form.
    ///
    /// IPv6 literals are put between brackets.
    #[must_use]
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Checks the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns an invalid argument error naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::invalid_argument("host must not be empty"));
        }

        if self.host.starts_with('/') || self.host.starts_with('@') {
            return Err(Error::invalid_argument(format!(
                "{} looks like a local socket, which is not supported",
                self.host
            )));
        }

        if self.port == 0 {
            return Err(Error::invalid_argument("port must not be zero"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_owned(),
            port: Self::DEFAULT_PORT,
            timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }
}

/// On-disk representation; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    host: Option<String>,
    port: Option<u16>,
    timeout: Option<u64>,
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(s)?;

        let mut config = Self::default();
        if let Some(host) = file.host {
            config.host = host;
        }
        if let Some(port) = file.port {
            config.port = port;
        }
        if let Some(secs) = file.timeout {
            config.set_timeout_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.address(), "localhost:6600");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_toml() {
        let config: Config = "host = \"music.local\"\nport = 6601\ntimeout = 5\n"
            .parse()
            .unwrap();
        assert_eq!(config.address(), "music.local:6601");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));

        let config: Config = "timeout = 0".parse().unwrap();
        assert_eq!(config.timeout, None);
        assert_eq!(config.port, Config::DEFAULT_PORT);
    }

    #[test]
    fn rejects_bad_values() {
        let err = "port = 0".parse::<Config>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = "host = \"\"".parse::<Config>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = "host = \"/run/mpd/socket\"".parse::<Config>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);

        let err = "hots = \"typo\"".parse::<Config>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn ipv6_address() {
        let config = Config {
            host: "::1".to_owned(),
            ..Config::default()
        };
        assert_eq!(config.address(), "[::1]:6600");
    }

    #[test]
    fn loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"10.0.0.2\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.address(), "10.0.0.2:6600");
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file("/nonexistent/mpdcover.toml").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("/nonexistent/mpdcover.toml"));
        assert!(err.downcast::<io::Error>().is_some());
    }
}
