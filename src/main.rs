//! Campus Market CLI - drives a session against the marketplace backend
//!
//! Tokens persist in the configured token file between invocations.

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_market_client::models::Credentials;
use campus_market_client::{ClientConfig, Session};

const USAGE: &str = "usage: campus-market <login <email> <password> | logout | whoami | listings | wishlist | guard <auth|guest>>";

/// Main entry point for the Campus Market CLI.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the session over the persisted token file
/// 4. Run the requested command
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_market_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    info!(
        "Configuration loaded: api={}, stale_time={}s, auth_stale_time={}s, gc_time={}s",
        config.base_url, config.stale_time, config.auth_stale_time, config.gc_time
    );

    let session = Session::from_config(config).context("failed to open session")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run(&session, &args).await
}

async fn run(session: &Session, args: &[&str]) -> anyhow::Result<()> {
    match args {
        ["login", email, password] => {
            session
                .api
                .login(&Credentials::new(*email, *password))
                .await
                .context("login failed")?;
            println!("Signed in as {}", email);
        }
        ["logout"] => {
            session.api.logout().await.context("server logout failed")?;
            println!("Signed out");
        }
        ["whoami"] => {
            let state = session
                .auth
                .current_user()
                .await
                .context("failed to resolve identity")?;
            match state.identity() {
                Some(identity) => println!(
                    "{} <{}> ({})",
                    identity.user.name, identity.user.email, identity.user.university
                ),
                None => println!("Not signed in"),
            }
        }
        ["listings"] => {
            let listings = session.api.listings().await.context("failed to load listings")?;
            for data in listings {
                let marker = if data.is_in_wishlist { "*" } else { " " };
                println!(
                    "{} #{:<5} {:>10.2}  {}",
                    marker, data.listing.id, data.listing.price, data.listing.title
                );
            }
        }
        ["wishlist"] => {
            let listings = session.api.wishlist().await.context("failed to load wishlist")?;
            for listing in listings {
                println!("#{:<5} {:>10.2}  {}", listing.id, listing.price, listing.title);
            }
        }
        ["guard", "auth"] => {
            session.guards.require_authenticated()?;
            println!("ok");
        }
        ["guard", "guest"] => {
            session.guards.require_guest()?;
            println!("ok");
        }
        _ => bail!(USAGE),
    }
    Ok(())
}
