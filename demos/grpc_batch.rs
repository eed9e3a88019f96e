//! gRPC batch example.
//!
//! This example shows how to:
//! - Create a gRPC client with a custom chunk size
//! - Stream a large payload in chunks
//! - Scan a whole directory over one bidirectional stream
//!
//! Start a ClamAV API server with gRPC on localhost:9000, then run with:
//! cargo run --example grpc_batch -- <directory>

use clamav_api_sdk::prelude::*;
use futures::StreamExt;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== ClamAV API gRPC Batch Example ===\n");

    let target = std::env::var("CLAMAV_GRPC_ADDR").unwrap_or_else(|_| "localhost:9000".to_string());
    let config = GrpcClientConfig::new()
        .with_chunk_size(256 * 1024)
        .with_connect_timeout(Duration::from_secs(5));
    let client = GrpcClient::new(&target, config)?;

    let health = client.health_check(&ScanContext::new()).await?;
    println!("Healthy: {} ({})", health.healthy, health.message);

    // Stream an 8 MiB payload in 256 KiB chunks
    let payload = vec![b'A'; 8 * 1024 * 1024];
    let result = client
        .scan_stream(&ScanContext::new(), &payload, "large.bin")
        .await?;
    println!("large.bin -> {} in {:.4}s\n", result.status, result.scan_time);

    // Scan every regular file in a directory
    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(FileInput::from_path(path));
        }
    }
    println!("Scanning {} files from {}", files.len(), dir);

    let ctx = ScanContext::new().with_timeout(Duration::from_secs(120));
    let mut results = client.scan_multiple(&ctx, files).await?;

    let (mut clean, mut infected, mut failed) = (0, 0, 0);
    while let Some(result) = results.next().await {
        let name = result.filename.as_deref().unwrap_or("<session>");
        match result.status {
            ScanStatus::Clean => clean += 1,
            ScanStatus::Infected => {
                infected += 1;
                println!("  INFECTED {}: {}", name, result.message);
            }
            _ => {
                failed += 1;
                println!("  ERROR    {}: {}", name, result.message);
            }
        }
    }

    println!("\nClean: {}, infected: {}, errors: {}", clean, infected, failed);
    client.close();
    Ok(())
}
