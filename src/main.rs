//! MarkRight License Worker
//!
//! Webhook server plus the operator tools that share its key handling.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use markright_license_worker::config::ENV_PRIVATE_KEY;
use markright_license_worker::license::{encode_verifying_key, generate_keypair, DEFAULT_TIER};
use markright_license_worker::webhook::format_issued_at;
use markright_license_worker::{
    build_issuer, build_router, LicensePayload, LicenseSigner, WorkerConfig,
};

/// MarkRight License Worker
#[derive(Parser, Debug)]
#[command(name = "license-worker")]
#[command(author = "MarkRight Team <license@complitask.com>")]
#[command(version)]
#[command(about = "Issues signed license keys from purchase webhooks")]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the webhook server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8787")]
        port: u16,

        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate a new Ed25519 signing keypair
    Keygen,

    /// Sign a license token by hand using ED25519_PRIVATE_KEY
    Sign {
        /// Licensee email
        email: String,

        /// Issuance timestamp (default: now)
        #[arg(long)]
        issued_at: Option<String>,

        /// Feature tier
        #[arg(long, default_value = DEFAULT_TIER)]
        tier: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Serve { port, host } => serve(&host, port).await,
        Command::Keygen => {
            keygen();
            Ok(())
        }
        Command::Sign {
            email,
            issued_at,
            tier,
        } => sign(email, issued_at, tier),
    }
}

async fn serve(host: &str, port: u16) -> anyhow::Result<()> {
    let config = WorkerConfig::from_env().context("failed to load configuration")?;
    let issuer = Arc::new(build_issuer(config)?);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {host}:{port}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(
        "{} v{} listening on {}",
        markright_license_worker::NAME,
        markright_license_worker::VERSION,
        addr
    );

    axum::serve(listener, build_router(issuer))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn keygen() {
    let keypair = generate_keypair();
    println!("{ENV_PRIVATE_KEY}={}", keypair.private_b64.as_str());
    println!("PUBLIC_KEY={}", keypair.public_b64);
    eprintln!();
    eprintln!("Store the private key as a secret. Embed the public key in the client verifier.");
}

fn sign(email: String, issued_at: Option<String>, tier: String) -> anyhow::Result<()> {
    let encoded = std::env::var(ENV_PRIVATE_KEY)
        .with_context(|| format!("{ENV_PRIVATE_KEY} environment variable not set"))?;
    let signer = LicenseSigner::from_base64(&encoded)
        .with_context(|| format!("{ENV_PRIVATE_KEY} is invalid"))?;

    let issued_at = issued_at.unwrap_or_else(|| format_issued_at(chrono::Utc::now()));
    let payload = LicensePayload::new(email, issued_at, tier);
    let token = signer.sign(&payload)?;

    eprintln!("Email:      {}", payload.email);
    eprintln!("Tier:       {}", payload.tier);
    eprintln!("Issued:     {}", payload.issued_at);
    eprintln!(
        "Public key: {}",
        encode_verifying_key(&signer.verifying_key())
    );

    // Token alone on stdout so it can be piped
    println!("{token}");
    Ok(())
}
