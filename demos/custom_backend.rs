//! Custom backend example demonstrating the `Scanner` trait.
//!
//! This example shows how to:
//! - Implement the Scanner trait for an in-process backend
//! - Write application code against `ArcScanner`, independent of transport
//! - Report failures with the SDK error taxonomy
//!
//! Run with: cargo run --example custom_backend

use async_trait::async_trait;
use clamav_api_sdk::prelude::*;
use clamav_api_sdk::ArcScanner;
use std::path::Path;
use std::sync::Arc;

/// A scanner that flags payloads containing any blocked byte pattern.
///
/// Useful as a stand-in for the real service in local development.
#[derive(Debug)]
struct PatternScanner {
    patterns: Vec<(String, Vec<u8>)>,
    max_size: usize,
}

impl PatternScanner {
    fn new(max_size: usize) -> Self {
        Self {
            patterns: Vec::new(),
            max_size,
        }
    }

    fn with_pattern(mut self, signature: impl Into<String>, pattern: &[u8]) -> Self {
        self.patterns.push((signature.into(), pattern.to_vec()));
        self
    }
}

#[async_trait]
impl Scanner for PatternScanner {
    fn name(&self) -> &str {
        "pattern"
    }

    async fn health_check(&self, _ctx: &ScanContext) -> Result<HealthCheckResult, SdkError> {
        Ok(HealthCheckResult {
            healthy: true,
            message: "ok".to_string(),
        })
    }

    async fn scan_file(
        &self,
        ctx: &ScanContext,
        data: &[u8],
        filename: &str,
    ) -> Result<ScanResult, SdkError> {
        if ctx.is_cancelled() {
            return Err(SdkError::timeout("request canceled"));
        }
        if data.len() > self.max_size {
            return Err(SdkError::validation(format!(
                "{} exceeds {} bytes",
                filename, self.max_size
            )));
        }

        let start = std::time::Instant::now();
        let hit = self
            .patterns
            .iter()
            .find(|(_, pattern)| data.windows(pattern.len()).any(|w| w == pattern.as_slice()));

        let result = match hit {
            Some((signature, _)) => {
                tracing::warn!(scanner = self.name(), filename, signature = %signature, "Pattern matched");
                ScanResult::new(ScanStatus::Infected, signature.clone())
            }
            None => ScanResult::new(ScanStatus::Clean, ""),
        };

        Ok(result
            .with_filename(filename)
            .with_scan_time(start.elapsed().as_secs_f64()))
    }

    async fn scan_file_path(&self, ctx: &ScanContext, path: &Path) -> Result<ScanResult, SdkError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            SdkError::validation(format!("failed to read file: {}", path.display())).with_source(e)
        })?;
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        self.scan_file(ctx, &data, filename).await
    }
}

/// Application code only sees the trait object.
async fn accept_upload(scanner: &ArcScanner, data: &[u8], filename: &str) -> bool {
    match scanner.scan_file(&ScanContext::new(), data, filename).await {
        Ok(result) => {
            println!("[{}] {} -> {}", scanner.name(), filename, result.status);
            result.is_clean()
        }
        Err(e) => {
            println!("[{}] {} -> rejected ({})", scanner.name(), filename, e.kind());
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Custom Backend Example ===\n");

    let scanner: ArcScanner = Arc::new(
        PatternScanner::new(1024).with_pattern("Demo.Blocked.Pattern", b"malicious"),
    );

    let health = scanner.health_check(&ScanContext::new()).await?;
    println!("Healthy: {}\n", health.healthy);

    accept_upload(&scanner, b"This is a perfectly safe file.", "safe.txt").await;
    accept_upload(&scanner, b"This content is known to be malicious!", "malware.bin").await;
    accept_upload(&scanner, &vec![0u8; 4096], "too-big.bin").await;

    println!("\n=== Example Complete ===");
    Ok(())
}
