//! Standalone rollboard server.
//!
//! Serves the dashboard API, change events, uploads and an optional static
//! front-end from a single process. Every flag can also be set through its
//! `ROLLBOARD_*` environment variable.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rollboard_core::{RollboardContext, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "rollboard-daemon", version, about = "Rollboard dashboard server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "ROLLBOARD_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(long, env = "ROLLBOARD_PORT", default_value_t = 3000)]
    port: u16,

    /// Directory holding data.json, draft.json, users.json and tv-urls.json.
    #[arg(long, env = "ROLLBOARD_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Where uploaded files are stored (defaults to <data-dir>/uploads).
    #[arg(long, env = "ROLLBOARD_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Front-end build served for paths outside the API.
    #[arg(long, env = "ROLLBOARD_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    #[arg(long, env = "ROLLBOARD_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,

    /// Accepted upload extensions, comma separated.
    #[arg(
        long,
        env = "ROLLBOARD_UPLOAD_EXTENSIONS",
        value_delimiter = ',',
        default_value = "pdf"
    )]
    upload_extensions: Vec<String>,
}

impl Args {
    fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::new(&self.data_dir)
            .max_upload_bytes(self.max_upload_mb.saturating_mul(1024 * 1024))
            .allowed_upload_extensions(&self.upload_extensions);
        if let Some(dir) = &self.uploads_dir {
            config = config.uploads_dir(dir);
        }
        config
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.store_config();
    log::info!(
        "Data directory: {} (uploads: {})",
        config.data_dir().display(),
        config.uploads_path().display()
    );

    let context = Arc::new(RollboardContext::new(config));
    rollboard_http::serve(context, args.addr(), args.static_dir.clone(), shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// TESTS
// ============================================================================
