mod cli;
mod error_fmt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use eyre::WrapErr;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    color_eyre::install().ok();
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    match try_main(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if *JSON_MODE.get().unwrap_or(&false) {
                eprintln!("{}", error_fmt::json_error(&e));
            } else {
                eprintln!("{}", error_fmt::humanize(&e));
            }
            ExitCode::FAILURE
        }
    }
}

fn try_main(args: &Cli) -> eyre::Result<()> {
    let config = load_config(args)?;
    init_tracing(args, &config.logging);
    config.validate().wrap_err("invalid configuration")?;

    match &args.cmd {
        Commands::Run {
            targets,
            listen,
            summary,
        } => run::run_station(&config, targets.as_deref(), listen.as_deref(), *summary),
        Commands::SelfCheck => run::self_check(&config),
    }
}

fn load_config(args: &Cli) -> eyre::Result<gantry_config::Config> {
    if args.config.exists() {
        let text = std::fs::read_to_string(&args.config)
            .wrap_err_with(|| format!("read config {:?}", args.config))?;
        gantry_config::load_toml(&text).wrap_err_with(|| format!("parse config {:?}", args.config))
    } else {
        // Built-in defaults cover the simulated station
        Ok(gantry_config::Config::default())
    }
}

fn init_tracing(args: &Cli, logging: &gantry_config::Logging) {
    let level = logging
        .level
        .clone()
        .unwrap_or_else(|| args.log_level.clone());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = logging.file.as_ref().map(|path| {
        let path = Path::new(path);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let name = path.file_name().unwrap_or_else(|| "gantry.log".as_ref());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer)
    });

    // A second init (tests) is harmless; keep the first subscriber.
    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if args.json {
        registry.with(fmt::layer().json()).try_init().ok();
    } else {
        registry.with(fmt::layer()).try_init().ok();
    }
}
