//! place - shared packed-bitfield canvas service
//!
//! Reads JSON-line requests on stdin and writes JSON-line responses on stdout.

use std::sync::Arc;

use canvas::{CanvasPhase, CanvasStore};
use tokio::io::BufReader;
use tracing::info;

mod config;
mod error;
mod handler;
mod logging;
mod server;
mod store;

use config::PlaceConfig;
use error::AppError;
use handler::Handler;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing()?;

    // Parse configuration from environment
    let config = PlaceConfig::from_env()?;
    info!(
        "Starting place: canvas '{}' {}x{} at {} bits, reset {:?}, fetch {:?}",
        config.canvas.key,
        config.canvas.width,
        config.canvas.height,
        config.canvas.bits_per_pixel,
        config.canvas.reset_strategy,
        config.canvas.fetch_range
    );

    let store = store::open(&config.store)?;
    let canvas = CanvasStore::new(config.canvas.clone(), store)?;

    let startup = canvas.clone();
    match tokio::task::spawn_blocking(move || startup.phase()).await?? {
        CanvasPhase::Initialized => info!("Canvas '{}' already present", config.canvas.key),
        CanvasPhase::Uninitialized => info!(
            "Canvas '{}' absent; the first Reset or Draw creates it",
            config.canvas.key
        ),
    }

    let handler = Arc::new(Handler::new(canvas, config.op_timeout()));
    server::serve(handler, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
    Ok(())
}
