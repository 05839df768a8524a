use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use mimalloc::MiMalloc;
use tokio::io::BufReader;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cwm_timecard::cli::{Cli, Commands};
use cwm_timecard::config::Config;
use cwm_timecard::handlers;
use cwm_timecard::types::EntryForm;
use cwm_timecard::{SettingsStore, TimeEntryService, TimecardError};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let env_filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()))
    };
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    debug!(
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        request_timeout_secs = cfg.request_timeout_secs,
        "configuration loaded"
    );

    match run(cli, &cfg).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cfg: &Config) -> Result<ExitCode, TimecardError> {
    let store = SettingsStore::new(cfg.settings_file()?);
    let pin = cli.pin.as_deref();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Configure(args) => {
            let outcome = handlers::configure(&store, &args, pin)?;
            let protection = if outcome.encrypted {
                "PIN-encrypted"
            } else {
                "plain text"
            };
            writeln!(
                stdout,
                "Settings saved to {} (keys {protection})",
                outcome.path.display()
            )?;
            if !outcome.missing.is_empty() {
                writeln!(stdout, "Still missing: {}", outcome.missing.join(", "))?;
            }
        }
        Commands::Show => {
            let stored = store.load_stored()?;
            write!(stdout, "{}", handlers::render_settings(&stored, store.path()))?;
        }
        Commands::Submit(args) => {
            let mut service = TimeEntryService::new(cfg, store.load(pin)?)?;
            let form = EntryForm::from(&args);
            if !handlers::submit_once(&mut service, &form, &mut stdout).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Session => {
            let mut service = TimeEntryService::new(cfg, store.load(pin)?)?;
            let input = BufReader::new(tokio::io::stdin());
            handlers::run_session(&mut service, input, &mut stdout).await?;
        }
    }
    Ok(ExitCode::SUCCESS)
}
