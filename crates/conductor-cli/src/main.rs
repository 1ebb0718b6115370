//! Conductor CLI entry point.

use clap::Parser;

use conductor_cli::{commands, dispatch, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // .env.local / .env must be loaded before clap reads its env fallbacks
    let dotenv_files = commands::load_dotenv();

    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conductor_core=info,conductor_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    for path in &dotenv_files {
        tracing::debug!("[CLI] Loaded {}", path.display());
    }

    if let Err(e) = dispatch(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
