//! Health command implementation
//!
//! This module implements the `health` command: probe every configured NER
//! backend and report the extraction mode the pipeline would run in.

use crate::anonymization::SubstitutionStore;
use crate::cli::{EXIT_BACKEND, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::resolve_config;
use crate::detection::EntityExtractor;
use clap::Args;

/// Arguments for the health command
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Exit with an error when running on the lexical tagger, even if no
    /// backend is configured
    #[arg(long)]
    pub strict: bool,
}

impl HealthArgs {
    /// Execute the health command
    pub async fn execute(&self, config_path: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!("Checking NER backends");

        println!("🩺 Health Check");
        println!();

        let mut config = match resolve_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        config.ner.probe_on_startup = true;

        let extractor = match EntityExtractor::from_config(&config.ner, &config.detection).await {
            Ok(e) => e,
            Err(e) => {
                println!("❌ Failed to build NER backends");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let available = extractor.backend_names();
        let mut unreachable = 0;

        println!("{:<24} {:<10} {:<40} Status", "Backend", "Role", "Endpoint");
        println!("{}", "-".repeat(90));
        for backend in &config.ner.backends {
            let up = !extractor.is_degraded() && available.contains(&backend.name.as_str());
            if !up {
                unreachable += 1;
            }
            println!(
                "{:<24} {:<10} {:<40} {}",
                backend.name,
                backend.role.to_string(),
                backend.endpoint,
                if up { "✅ available" } else { "❌ unreachable" }
            );
        }
        if config.ner.backends.is_empty() {
            println!("(no backend configured)");
        }
        println!();

        let store = SubstitutionStore::new(config.anonymization.cache_capacity);
        println!("  Mode:            {}", extractor.mode());
        println!("  Active backends: {}", available.join(", "));
        println!("  Store:           {} / {} entries", store.len(), store.capacity());
        println!();

        if unreachable > 0 || (self.strict && extractor.is_degraded()) {
            println!("⚠️  Running with reduced NER coverage");
            return Ok(EXIT_BACKEND);
        }

        println!("✅ All configured backends available");
        Ok(EXIT_SUCCESS)
    }
}
