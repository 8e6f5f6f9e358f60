//! `deskpilot doctor` — Diagnose system health.

use std::path::Path;

use deskpilot_config::AppConfig;
use deskpilot_guardrails::GuardRailEngine;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 DeskPilot Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    println!("  ✅ Rust binary running");

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if !path.exists() {
        println!("  ⚠️  No config file — using defaults (run `deskpilot config --init`)");
        issues += 1;
    }

    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  {} issue(s) found. See above for details.", issues + 1);
            return Ok(());
        }
    };

    match GuardRailEngine::new(&config.guardrails) {
        Ok(_) => println!("  ✅ Guard-rail patterns compile"),
        Err(e) => {
            println!("  ❌ Guard rails: {e}");
            issues += 1;
        }
    }

    if config.has_api_key() {
        println!("  ✅ API key configured");

        let router = deskpilot_providers::router::build_from_config(&config);
        match router.default() {
            Some(provider) => match provider.health_check().await {
                Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                Ok(false) => {
                    println!("  ⚠️  Provider '{}' responded but is unhealthy", provider.name());
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Provider '{}' unreachable: {e}", provider.name());
                    issues += 1;
                }
            },
            None => {
                println!("  ❌ Provider '{}' is not supported", config.default_provider);
                issues += 1;
            }
        }
    } else {
        println!("  ⚠️  No API key configured — set DESKPILOT_API_KEY or add api_key to config.toml");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
