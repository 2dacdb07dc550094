use std::{
    error::Error,
    ffi::OsString,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use clap::{command, Parser, Subcommand, ValueHint};
use log::{debug, error, info, warn, LevelFilter};

use mpdcover::{
    client::Client,
    config::Config,
    protocol::{self, Ack},
    signal,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when built in release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// TOML file with `host`, `port` and `timeout` keys. Command line
    /// arguments take precedence over its values.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Server host name or address
    ///
    /// [default: localhost]
    #[arg(long, env = "MPD_HOST", value_hint = ValueHint::Hostname)]
    host: Option<String>,

    /// Server port
    ///
    /// [default: 6600]
    #[arg(short, long, env = "MPD_PORT")]
    port: Option<u16>,

    /// Deadline for each server call in seconds
    ///
    /// Use 0 to wait indefinitely.
    ///
    /// [default: 30]
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging, which includes the protocol
    /// exchange.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Subcommand)]
enum Command {
    /// Send a command and print the response fields
    Request {
        /// Command and its arguments, e.g. `status`
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Download album art
    Cover {
        /// Song URI relative to the music directory
        ///
        /// [default: the song currently playing]
        uri: Option<String>,

        /// Destination file
        #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, default_value = "cover.jpg")]
        output: PathBuf,
    },
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        // Note: if you change the default logging level here, then you should
        // probably also change the verbosity levels below.
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            // Quiet and verbose are mutually exclusive.
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Builds the configuration from the file, if any, and the command line.
fn load_config(args: &Args) -> mpdcover::error::Result<Config> {
    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(ref host) = args.host {
        config.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(secs) = args.timeout {
        config.set_timeout_secs(secs);
    }

    config.validate()?;
    Ok(config)
}

/// Path of the file a download is written to before it is complete.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Removes a leftover partial download, if any.
async fn discard_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => debug!("removed {}", partial.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!("could not remove {}: {e}", partial.display()),
    }
}

/// Prints the response fields sorted by name.
async fn request(client: &Client, words: &[String]) -> Result<(), Box<dyn Error>> {
    let command = protocol::command::join(words);
    let response = client.execute(&command).await?;

    let mut fields: Vec<_> = response.into_iter().collect();
    fields.sort();

    let mut stdout = io::stdout().lock();
    for (key, value) in fields {
        writeln!(stdout, "{key}: {value}")?;
    }

    Ok(())
}

/// Downloads into a partial file and moves it into place on success, so
/// that `output` never holds a truncated picture.
async fn cover(client: &Client, uri: Option<String>, output: &Path) -> Result<(), Box<dyn Error>> {
    let uri = match uri {
        Some(uri) => uri,
        None => client
            .current_file()
            .await?
            .ok_or("no song is playing; specify a song URI")?,
    };

    let partial = partial_path(output);
    let mut file = tokio::fs::File::create(&partial).await?;

    match client.download_cover(&uri, &mut file).await {
        Ok(size) => {
            drop(file);
            tokio::fs::rename(&partial, output).await?;
            info!("saved {size} bytes of cover art to {}", output.display());
            Ok(())
        }
        Err(e) => {
            drop(file);
            discard_partial(&partial).await;

            if e.ack().is_some_and(Ack::is_no_exist) {
                warn!("{uri} has no cover art");
            }
            Err(e.into())
        }
    }
}

/// Runs the selected subcommand.
///
/// # Errors
///
/// Returns an error when the configuration is invalid or the server call
/// fails.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    debug!("using server at {}", config.address());

    let client = Client::new(config);
    match args.command {
        Command::Request { command } => request(&client, &command).await,
        Command::Cover { uri, output } => cover(&client, uri, &output).await,
    }
}

/// Main entry point of the application.
///
/// Initializes the logger facade, parses the command line arguments and
/// runs the subcommand until it completes or a shutdown signal arrives.
#[tokio::main]
async fn main() {
    // `clap` handles our command line arguments and help text.
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    // This aids in debugging of whatever comes next.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    debug!("starting {name}/{version}; {BUILD_PROFILE}");

    let mut signals = match signal::Handler::new() {
        Ok(signals) => signals,
        Err(e) => {
            error!("failed to register signal handlers: {e}");
            process::exit(1);
        }
    };

    // An interrupted download leaves its partial file behind.
    let partial = match args.command {
        Command::Cover { ref output, .. } => Some(partial_path(output)),
        Command::Request { .. } => None,
    };

    tokio::select! {
        // Prioritize shutdown signals.
        biased;

        signal = signals.recv() => {
            info!("received {signal}, shutting down");
            if let Some(partial) = partial {
                discard_partial(&partial).await;
            }
            process::exit(signal.exit_code());
        }

        result = run(args) => {
            if let Err(e) = result {
                error!("{e}");
                process::exit(1);
            }
        }
    }
}
