use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kausal_replay::{run, Config};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            eprintln!("Required: KAUSAL_OWNER_ID=<number>");
            eprintln!(
                "Optional: KAUSAL_JOURNAL_PATH, KAUSAL_OUTPUT_PATH, KAUSAL_MODE, KAUSAL_CHANNEL_CAPACITY"
            );
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Kausal replay");
    tracing::info!("Owner: {}", config.owner);
    tracing::info!("Journal: {}", config.journal_path.display());
    tracing::info!("Mode: {:?}", config.switch_mode);

    match run(&config).await {
        Ok(report) => {
            tracing::info!(
                "Final state {} at {} ({} rejections)",
                report.state,
                report.vector_clock,
                report.rejections.len()
            );
        }
        Err(e) => {
            eprintln!("Replay error: {}", e);
            std::process::exit(1);
        }
    }
}
