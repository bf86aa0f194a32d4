//! One-shot CLI: transcode a file or URL into a job directory.
//!
//! Usage: `transcode <input> [output_root]`

use hls_ladder::adapters::local::{events, EventHub};
use hls_ladder::{AppConfig, InputSource};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env();

    hls_ladder::init_tracing();
    config.log_fallbacks();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(input) => InputSource::parse(&input),
        None => {
            eprintln!("Usage: transcode <input> [output_root]");
            std::process::exit(2);
        }
    };
    let output_root = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.streams_dir.clone());

    let event_hub = Arc::new(EventHub::new());
    let listener = events::listener::start(event_hub.clone());
    let orchestrator = hls_ladder::orchestrator_from_config(&config, event_hub);

    let result = orchestrator.run(&input, &output_root, &config.ladder).await;
    // Closing the hub lets the listener drain and exit.
    drop(orchestrator);
    let _ = listener.await;

    match result {
        Ok(job) => {
            println!("{}", job.master_playlist.display());
            println!("Time taken to compress: {} seconds", job.elapsed_seconds);
        }
        Err(e) => {
            eprintln!("Transcode failed: {}", e);
            std::process::exit(1);
        }
    }
}
