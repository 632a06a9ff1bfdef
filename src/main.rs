use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use tokio::sync::{mpsc, watch};

use canvas::TargetState;
use remote::{auth, control, RedditBackend};
use scheduler::constants::STAGGER_WINDOW;
use scheduler::AccountLoop;

#[derive(Parser, Debug)]
#[command(author, version, about = "Keeps a shared canvas in line with the current target image", long_about = None)]
struct Cli {
    /// Session secrets, one per account. Falls back to the
    /// SESSION_SECRETS environment variable (colon-separated).
    session_secrets: Vec<String>,

    /// Optional brand string announced on the control channel
    #[clap(long)]
    brand: Option<String>,
}

fn session_secrets(cli: &Cli) -> Vec<String> {
    if !cli.session_secrets.is_empty() {
        return cli.session_secrets.clone();
    }

    std::env::var("SESSION_SECRETS")
        .map(|joined| {
            joined
                .split(':')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let secrets = session_secrets(&cli);
    if secrets.is_empty() {
        eprintln!("Missing session secret: pass one per account or set SESSION_SECRETS.");
        std::process::exit(1);
    }

    let http = remote::http_client().context("could not build http client")?;

    let (target_tx, target_rx) = watch::channel::<Option<Arc<TargetState>>>(None);
    let (announce_tx, announce_rx) = mpsc::unbounded_channel();

    tokio::spawn(control::run(
        http.clone(),
        target_tx,
        announce_rx,
        cli.brand.clone(),
    ));

    info!("running {} clients", secrets.len());
    let count = secrets.len() as u32;
    for (id, secret) in secrets.into_iter().enumerate() {
        let (credential_tx, credential_rx) = watch::channel::<Option<String>>(None);
        tokio::spawn(auth::run_refresh_loop(http.clone(), secret, credential_tx));

        let backend = RedditBackend::new(http.clone(), announce_tx.clone());
        let account = AccountLoop::new(id, backend, target_rx.clone(), credential_rx);

        // Spread first attempts across a short window instead of firing
        // every account at once.
        let stagger = STAGGER_WINDOW * id as u32 / count;
        tokio::spawn(async move {
            tokio::time::sleep(stagger).await;
            account.run().await;
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("could not listen for shutdown signal")?;
    info!("shutting down");
    Ok(())
}
