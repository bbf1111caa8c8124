use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, EnvFilter};

use gcs_signer::{types::Environment, GcsSigner, SigningRequest, UrlSigner};

/// Prints a signed GET URL for a Google Cloud Storage object
#[derive(Debug, Parser)]
#[command(name = "sign-url", version)]
struct Args {
    /// Bucket holding the object
    bucket: String,

    /// Object key inside the bucket
    object: String,

    /// Minutes until the URL expires (defaults per environment)
    #[arg(short, long)]
    timeout_minutes: Option<i64>,

    /// Host to serve the URL from instead of storage.googleapis.com (falls back to GCS_CUSTOM_HOST)
    #[arg(long)]
    custom_host: Option<String>,

    /// Print the URL with its expiry as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let environment = Environment::from_env();

    // JSON logs for staging/production, regular format for development
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    // Ctrl+C aborts a slow client setup
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C, aborting");
                signal_cancel.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    let config = environment.signer_config();
    let signer = GcsSigner::connect(&config, &cancel)
        .await
        .with_context(|| {
            format!(
                "Failed to build signer from {}",
                config.credentials_file.display()
            )
        })?;

    let mut request = SigningRequest::new(
        args.bucket,
        args.object,
        args.timeout_minutes
            .unwrap_or_else(|| environment.signed_url_timeout_minutes()),
    );
    if let Some(host) = args.custom_host.or_else(Environment::custom_host) {
        request = request.with_custom_host(host);
    }

    let signed = signer
        .sign(&request)
        .await
        .with_context(|| format!("Failed to sign {}/{}", request.bucket, request.object))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&signed)?);
    } else {
        println!("{}", signed.url);
        info!("Signed URL expires at {}", signed.expires_at.to_rfc3339());
    }

    Ok(())
}
