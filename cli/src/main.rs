//! Prospect CLI - terminal commands for the scraping dashboard.
//!
//! # Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `status` | One reconciliation pass; print the resulting belief |
//! | `watch` | Keep polling and print every belief change until Ctrl-C |
//! | `login [PROFILE_URL]` | Start the external login flow, then wait for the session to come up |
//! | `scrape PROFILE_URL` | Scrape one profile through the external session |
//! | `force on\|off [MESSAGE]` | Manually override the login status (self-expiring) |
//!
//! The service address comes from `~/.prospect/config.toml` or the
//! `PROSPECT_API_BASE` environment variable.

mod config;

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing_subscriber::EnvFilter;

use prospect_engine::{
    ApiClient, Belief, POST_ACTION_DELAY, Reconciler, ScrapeError, SessionMonitor, can_scrape,
};
use prospect_types::{Lead, ScrapeJob};

use config::Config;

/// How long `login` waits for the operator to finish the external flow.
const LOGIN_WAIT_LIMIT: Duration = Duration::from_secs(300);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::try_new("error").expect("error filter is valid"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::load();
    let client = ApiClient::new(&config.api_base)
        .with_context(|| format!("cannot reach service at {}", config.api_base))?;

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("status") => status(&client).await,
        Some("watch") => watch(client, config.poll_interval).await,
        Some("login") => login(client, config.poll_interval, args.next()).await,
        Some("scrape") => {
            let url = args
                .next()
                .context("usage: prospect scrape <PROFILE_URL>")?;
            scrape(&client, url).await
        }
        Some("force") => {
            let verdict = args
                .next()
                .context("usage: prospect force <on|off> [MESSAGE]")?;
            let message = args.collect::<Vec<_>>().join(" ");
            force(client, &verdict, &message).await
        }
        Some(other) => {
            print_usage();
            bail!("unknown command: {other}");
        }
        None => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    eprintln!("usage: prospect <status|watch|login [PROFILE_URL]|scrape <PROFILE_URL>|force <on|off> [MESSAGE]>");
}

fn describe(belief: &Belief) -> String {
    let verdict = if belief.logged_in() {
        "logged in"
    } else {
        "not logged in"
    };
    format!(
        "{verdict} [{}] {}",
        belief.source().describe(),
        belief.message()
    )
}

async fn status(client: &ApiClient) -> Result<()> {
    let belief = Reconciler::new(client.clone()).pass().await;
    println!("{}", describe(&belief));
    if !can_scrape(&belief) {
        println!("session-gated actions are blocked; run `prospect login` first");
    }
    Ok(())
}

async fn watch(client: ApiClient, interval: Duration) -> Result<()> {
    let monitor = SessionMonitor::spawn(client, interval);
    let mut rx = monitor.subscribe();
    println!("{}", describe(&monitor.current()));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", describe(&rx.borrow_and_update()));
            }
        }
    }

    monitor.shutdown();
    Ok(())
}

async fn login(client: ApiClient, interval: Duration, profile_url: Option<String>) -> Result<()> {
    let monitor = SessionMonitor::spawn(client, interval);
    let message = monitor
        .start_login(profile_url.as_deref())
        .await
        .context("failed to start the external login flow")?;
    println!("{message}");
    println!("complete the login in the opened browser window; waiting for the session...");

    let mut rx = monitor.subscribe();
    let deadline = tokio::time::Instant::now() + LOGIN_WAIT_LIMIT;
    let outcome = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break None,
            () = tokio::time::sleep_until(deadline) => break Some(false),
            changed = rx.changed() => {
                if changed.is_err() {
                    break None;
                }
                let belief = rx.borrow_and_update().clone();
                println!("{}", describe(&belief));
                if belief.logged_in() {
                    break Some(true);
                }
            }
        }
    };
    monitor.shutdown();

    match outcome {
        Some(true) => {
            println!("session is up; you can scrape now");
            Ok(())
        }
        Some(false) => bail!("gave up waiting for the external login to complete"),
        None => Ok(()),
    }
}

async fn scrape(client: &ApiClient, profile_url: String) -> Result<()> {
    let belief = Reconciler::new(client.clone()).pass().await;
    if !can_scrape(&belief) {
        println!("{}", describe(&belief));
        bail!("login required: run `prospect login` first");
    }

    let job = ScrapeJob::new(profile_url);
    match client.scrape_profile(&job).await {
        Ok(lead) => {
            print_lead(&lead);
            Ok(())
        }
        Err(ScrapeError::LoginRequired) => {
            bail!("the service rejected the session; run `prospect login` again")
        }
        Err(error) => Err(error).context("scrape failed"),
    }
}

fn print_lead(lead: &Lead) {
    println!("scraped: {}", lead.display_name());
    if let Some(title) = &lead.title {
        println!("  title:    {title}");
    }
    if let Some(company) = &lead.company {
        println!("  company:  {company}");
    }
    if let Some(location) = &lead.location {
        println!("  location: {location}");
    }
    if !lead.emails.is_empty() {
        println!("  emails:   {}", lead.emails.join(", "));
    }
    if !lead.experiences.is_empty() {
        println!("  experience entries: {}", lead.experiences.len());
    }
    if !lead.educations.is_empty() {
        println!("  education entries:  {}", lead.educations.len());
    }
}

async fn force(client: ApiClient, verdict: &str, message: &str) -> Result<()> {
    let logged_in = match verdict {
        "on" | "true" => true,
        "off" | "false" => false,
        other => bail!("expected `on` or `off`, got {other:?}"),
    };

    let monitor = SessionMonitor::spawn(client, Duration::from_secs(3600));
    let forced = monitor.force(logged_in, message).await;
    println!("{}", describe(&forced));

    // The override self-expires; show what the oracles say once the
    // corroboration pass has run.
    println!("waiting for corroboration...");
    tokio::time::sleep(POST_ACTION_DELAY + Duration::from_secs(1)).await;
    println!("{}", describe(&monitor.current()));
    monitor.shutdown();
    Ok(())
}
