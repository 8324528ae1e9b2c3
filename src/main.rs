//! vibbo-feed harness - runs the plugin core outside a hosting platform.
//!
//! Plays the host role for development and manual testing: walks the setup
//! wizard on stdin, persists the credential bundle, then drives the polling
//! coordinator on the configured interval and prints the rendered sensor
//! mapping.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vibbo_feed::api::DEFAULT_LIMIT;
use vibbo_feed::auth::CredentialStore;
use vibbo_feed::config::{StoredConfig, DEFAULT_SCAN_INTERVAL_MINUTES};
use vibbo_feed::setup::{validate_scan_interval, FormError, SetupStep};
use vibbo_feed::{sensor, FeedCoordinator, SetupFlow, VibboClient};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("setup") => run_setup().await,
        Some("set-interval") => set_interval(args.get(2).map(String::as_str)),
        Some("reset") => reset(),
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: vibbo-feed [setup | set-interval <minutes> | reset]");
            Ok(())
        }
        None => run_feed().await,
    }
}

/// Default mode: poll the feed on the configured interval and print the
/// sensor mapping after every cycle.
async fn run_feed() -> Result<()> {
    let Some(config) = StoredConfig::load()? else {
        eprintln!("No configuration found. Run `vibbo-feed setup` first.");
        return Ok(());
    };

    let cookie = CredentialStore::get_cookie(&config.organization_slug)
        .context("No stored session cookie. Run `vibbo-feed setup` again.")?;

    let client = VibboClient::new(cookie)?;
    let mut coordinator =
        FeedCoordinator::new(client, config.organization_id.clone(), DEFAULT_LIMIT);

    info!(
        organization = %config.organization_slug,
        interval_minutes = config.options.scan_interval,
        "Starting feed polling"
    );

    let mut ticker = tokio::time::interval(config.options.update_interval());
    loop {
        ticker.tick().await;

        match coordinator.refresh().await {
            Ok(snapshot) => {
                let state = sensor::state_value(Some(snapshot));
                let attributes = sensor::attributes(Some(snapshot), &config.organization_slug);
                println!("state: {}", state);
                println!("{}", serde_json::to_string_pretty(&attributes)?);
            }
            Err(err) => {
                eprintln!("Update failed: {} - entity unavailable until the next cycle", err);
            }
        }
    }
}

/// Interactive setup wizard on stdin.
async fn run_setup() -> Result<()> {
    let mut flow = SetupFlow::new()?;

    loop {
        match flow.step() {
            SetupStep::Phone => {
                let phone = prompt("Phone number")?;
                if let Err(err) = flow.submit_phone(&phone).await {
                    report_form_error(err);
                }
            }
            SetupStep::VerifyCode => {
                let code = prompt("SMS verification code")?;
                if let Err(err) = flow.submit_code(&code).await {
                    report_form_error(err);
                }
            }
            SetupStep::SelectOrganization => {
                println!("Organizations:");
                for (index, membership) in flow.memberships().iter().enumerate() {
                    println!("  {}. {}", index + 1, membership.display_label());
                }
                let input = prompt("Select organization")?;
                let slug = match input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| flow.memberships().get(i))
                {
                    Some(membership) => membership.slug.clone(),
                    None => {
                        eprintln!("Enter a number between 1 and {}", flow.memberships().len());
                        continue;
                    }
                };
                if let Err(err) = flow.select_organization(&slug) {
                    report_form_error(err);
                }
            }
            SetupStep::Options => {
                let input = prompt(&format!(
                    "Scan interval in minutes (default {})",
                    DEFAULT_SCAN_INTERVAL_MINUTES
                ))?;
                let minutes = if input.is_empty() {
                    DEFAULT_SCAN_INTERVAL_MINUTES
                } else {
                    match input.parse::<u64>() {
                        Ok(minutes) => minutes,
                        Err(_) => {
                            eprintln!("Enter a whole number of minutes");
                            continue;
                        }
                    }
                };
                if let Err(err) = flow.submit_options(minutes).await {
                    report_form_error(err);
                }
            }
            SetupStep::Done => break,
        }
    }

    let outcome = flow
        .take_outcome()
        .context("Setup finished without an outcome")?;

    CredentialStore::store(&outcome.bundle.organization_slug, &outcome.bundle.cookie)?;
    StoredConfig {
        organization_id: outcome.bundle.organization_id.clone(),
        organization_slug: outcome.bundle.organization_slug.clone(),
        organization_name: outcome.title.clone(),
        options: outcome.options,
    }
    .save()?;

    println!("Configured feed for {}", outcome.title);
    Ok(())
}

/// Options editor: change the poll interval of an existing configuration.
fn set_interval(arg: Option<&str>) -> Result<()> {
    let minutes: u64 = arg
        .context("Usage: vibbo-feed set-interval <minutes>")?
        .parse()
        .context("The interval must be a whole number of minutes")?;

    if let Err(err) = validate_scan_interval(minutes) {
        eprintln!("{}", err);
        return Ok(());
    }

    let Some(mut config) = StoredConfig::load()? else {
        eprintln!("No configuration found. Run `vibbo-feed setup` first.");
        return Ok(());
    };

    config.options.scan_interval = minutes;
    config.save()?;
    println!("Scan interval set to {} minutes", minutes);
    Ok(())
}

/// Remove the stored configuration and session cookie.
fn reset() -> Result<()> {
    if let Some(config) = StoredConfig::load()? {
        // A missing keychain entry is fine; the cookie may never have been stored.
        if let Err(err) = CredentialStore::delete(&config.organization_slug) {
            tracing::debug!(error = %err, "No keychain entry to delete");
        }
    }
    StoredConfig::delete()?;
    println!("Configuration removed");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn report_form_error(err: FormError) {
    eprintln!("{} ({})", err, err.code());
}
