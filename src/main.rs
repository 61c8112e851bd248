mod args;
mod clients;
mod config;
mod error;

use std::error::Error;
use std::time::Duration;

/// User-Agent header value for HTTP requests
pub const USER_AGENT: &str = concat!("freedns-txt/", env!("CARGO_PKG_VERSION"));

fn init_logger(verbose: bool, test: bool, debug: bool, quiet: bool) {
    let log_level = if quiet {
        log::LevelFilter::Error
    } else if debug {
        log::LevelFilter::Debug
    } else if verbose || test {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };

    env_logger::builder()
        .filter(None, log_level)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = args::Args::new();
    let test = args.test;

    init_logger(args.verbose, test, args.debug, args.quiet);

    let config = config::Config::load(&args)?;
    config.validate()?;

    let mut client = clients::create_client("freedns", &config)?;
    client.validate_config()?;
    log::info!("Using provider: {}", client.provider_name());

    let result = match &args.command {
        args::Command::Present { challenge, propagation } => {
            let wait = config::parse_interval(propagation)?;
            let name = challenge.validation_name();
            log::info!("Presenting {} for {}", name, challenge.domain);
            client.present(&challenge.domain, &name, &challenge.content).map(|_| {
                if wait > 0 && !test {
                    log::info!("Waiting {}s for DNS propagation", wait);
                    std::thread::sleep(Duration::from_secs(wait));
                }
            })
        }
        args::Command::Cleanup { challenge } => {
            let name = challenge.validation_name();
            log::info!("Cleaning up {} for {}", name, challenge.domain);
            client.cleanup(&challenge.domain, &name, &challenge.content)
        }
    };

    if let Err(e) = &result {
        if e.is_fatal() {
            log::error!("Unrecoverable configuration error: {}", e);
        } else {
            log::error!("FreeDNS update failed: {}", e);
        }
    }

    Ok(result?)
}
