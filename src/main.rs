use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use geoloc_util::config::Config;
use geoloc_util::location::{BatchResolver, GeocodeClient};
use geoloc_util::logging;
use geoloc_util::output::{self, ReportOptions};

/// Retrieves geolocation data utilizing Open Weather Geocoding API
///
/// Reads the API key from GEOLOC_API_KEY (a .env file in the working
/// directory is loaded first).
///
/// Examples:
///   geolocutil 'Madison, WI'
///   geolocutil 12345
///   geolocutil -p 'Madison, WI' 12345 'Chicago, IL' 10001
#[derive(Parser)]
#[command(name = "geolocutil", version, arg_required_else_help = true)]
struct Cli {
    /// A list of locations ("City, ST" or zip code in 5 digit format "12345").
    /// US cities and zip codes only.
    #[arg(required = true, num_args = 1..)]
    locations: Vec<String>,

    /// Outputs pretty print to stdout instead of json string
    #[arg(short, long)]
    print: bool,

    /// Converts all strings to ascii in json output
    #[arg(short, long)]
    json: bool,

    /// Prints out Error messages to stdout
    #[arg(short, long)]
    errors: bool,

    /// Increase log verbosity on stderr (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Seconds to wait for a connection (overrides GEOLOC_CONNECT_TIMEOUT).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    connect_timeout: Option<u64>,

    /// Seconds to wait for a response (overrides GEOLOC_READ_TIMEOUT).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    read_timeout: Option<u64>,

    /// Read settings from this env file instead of ./.env.
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(&cli)?;
    let mut resolver = BatchResolver::new(GeocodeClient::from_config(&config));

    // Hard faults end the run here with a non-zero exit.
    let entries = resolver.resolve_all(cli.locations.as_slice())?;

    let options = ReportOptions {
        table: cli.print,
        ascii_only: cli.json,
        errors: cli.errors,
    };
    output::write_report(&mut io::stdout().lock(), &entries, resolver.faults(), options)?;

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.env_file {
        Some(path) => Config::from_env_file(path)?,
        None => {
            // A missing .env is fine.
            dotenvy::dotenv().ok();
            Config::from_env()?
        }
    };

    if let Some(secs) = cli.connect_timeout {
        config.connect_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = cli.read_timeout {
        config.read_timeout = Duration::from_secs(secs);
    }

    Ok(config)
}
