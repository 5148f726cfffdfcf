mod serve;

use std::process;

use clap::{Parser, Subcommand};

/// Veriport report-card verification portal.
#[derive(Parser)]
#[command(name = "veriport", version, about = "Report-card upload and verification portal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP JSON API server
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// Maximum accepted report file size in bytes
        #[arg(long, default_value_t = veriport_core::DEFAULT_MAX_FILE_BYTES)]
        max_file_bytes: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            port,
            max_file_bytes,
        } => {
            if let Err(e) = serve::start_server(port, max_file_bytes).await {
                eprintln!("error: {e}");
                process::exit(1);
            }
        }
    }
}
