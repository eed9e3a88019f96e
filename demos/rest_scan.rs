//! REST scan example.
//!
//! This example shows how to:
//! - Create a REST client with default headers
//! - Check health and version
//! - Scan bytes, a file on disk and a raw stream
//! - Classify errors by kind
//!
//! Start a ClamAV API server on localhost:6000, then run with:
//! cargo run --example rest_scan -- [path-to-file]

use clamav_api_sdk::prelude::*;
use std::path::PathBuf;
use std::time::Duration;

const EICAR: &[u8] = br"X5O!P%@AP[4\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== ClamAV API REST Example ===\n");

    let base_url =
        std::env::var("CLAMAV_API_URL").unwrap_or_else(|_| "http://localhost:6000".to_string());
    let config = RestClientConfig::new()
        .with_timeout(Duration::from_secs(60))
        .with_header("X-Request-Source", "rest-scan-demo");
    let client = RestClient::new(&base_url, config)?;

    let ctx = ScanContext::new().with_timeout(Duration::from_secs(10));

    match client.health_check(&ctx).await {
        Ok(health) => println!("Healthy: {} ({})", health.healthy, health.message),
        Err(e) if e.is_connection() => {
            println!("Cannot reach {}: {}", base_url, e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let version = client.version(&ctx).await?;
    println!(
        "Server version: {} (commit {}, built {})\n",
        version.version, version.commit, version.build_timestamp
    );

    // Test 1: clean bytes
    let result = client
        .scan_file(&ScanContext::new(), b"This is a perfectly safe file.", "safe.txt")
        .await?;
    println!("safe.txt -> {} in {:.4}s", result.status, result.scan_time);

    // Test 2: the EICAR test signature over the raw stream endpoint
    let result = client
        .stream_scan_bytes(&ScanContext::new(), EICAR.to_vec())
        .await?;
    if result.is_infected() {
        println!("eicar    -> {} ({})", result.status, result.message);
    }

    // Test 3: a file from the command line
    if let Some(path) = std::env::args().nth(1).map(PathBuf::from) {
        match client.stream_scan_file(&ScanContext::new(), &path).await {
            Ok(result) => println!("{} -> {}", path.display(), result.status),
            Err(e) => match e.kind() {
                ErrorKind::Validation => println!("Rejected {}: {}", path.display(), e.message()),
                ErrorKind::Timeout => println!("Timed out scanning {}", path.display()),
                _ => return Err(e.into()),
            },
        }
    }

    client.close();
    println!("\n=== Example Complete ===");
    Ok(())
}
