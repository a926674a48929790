//! Ticket tracker server binary

use eyre::{eyre, Result, WrapErr};
use ticket_tracker_core::Config;
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the ticket tracker
    config: Config,
}

/// A command line option overriding a configuration value
#[derive(Debug)]
enum Override {
    Host(String),
    Port(u16),
    Workers(u16),
    AllowOrigin(String),
    NoSeed,
}

impl Opts {
    fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    /// Build the configuration from defaults, an optional `-config <file>`,
    /// and the remaining options, in increasing precedence
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut config_path = None;
        let mut overrides = Vec::new();
        let mut option: Option<String> = None;
        for arg in args {
            let Some(opt) = option.take() else {
                if arg == "-no-seed" {
                    overrides.push(Override::NoSeed);
                } else {
                    option = Some(arg);
                }
                continue;
            };
            match opt.as_str() {
                "-config" => config_path = Some(arg),
                "-host" => overrides.push(Override::Host(arg)),
                "-port" => overrides.push(Override::Port(
                    arg.parse::<u16>().wrap_err("-port takes a decimal u16")?,
                )),
                "-workers" => overrides.push(Override::Workers(
                    arg.parse::<u16>().wrap_err("-workers takes a decimal u16")?,
                )),
                "-allow-origin" => overrides.push(Override::AllowOrigin(arg)),
                _ => return Err(eyre!("unknown option {opt}")),
            }
        }
        if let Some(opt) = option {
            return Err(eyre!("option {opt} takes a value"));
        }

        let mut config = match config_path {
            Some(path) => Config::load(&path)?,
            None => Config::default(),
        };
        let mut origins_replaced = false;
        for o in overrides {
            match o {
                Override::Host(host) => config.host = host,
                Override::Port(port) => config.port = port,
                Override::Workers(workers) => config.workers = workers,
                Override::AllowOrigin(origin) => {
                    if !origins_replaced {
                        config.allowed_origins.clear();
                        origins_replaced = true;
                    }
                    config.allowed_origins.push(origin);
                }
                Override::NoSeed => config.seed = false,
            }
        }

        Ok(Opts { config })
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let opts = Opts::from_args()?;
    tracing::debug!(?opts, "starting");

    let tracker = ticket_tracker_store::launch(&opts.config);
    let server = ticket_tracker_server::serve(&opts.config, tracker)?;

    tracing::info!("Press Ctrl+C to shutdown");
    server.join();
    Ok(())
}
