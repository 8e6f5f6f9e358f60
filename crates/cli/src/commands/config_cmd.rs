//! `deskpilot config` — Configuration management.

use std::path::Path;

use deskpilot_config::AppConfig;

pub async fn run(config_path: Option<&Path>, init: bool) -> Result<(), Box<dyn std::error::Error>> {
    if init {
        return write_default(config_path);
    }

    println!("🔍 Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            if !config.has_api_key() {
                warnings.push("No API key set (set DESKPILOT_API_KEY or ANTHROPIC_API_KEY)");
            }
            if config.default_provider != "anthropic" {
                warnings.push("Only the 'anthropic' provider is supported");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Provider:        {}", config.default_provider);
            println!("   Model:           {}", config.default_model);
            println!("   Max iterations:  {}", config.agent.max_iterations);
            println!("   Timeout:         {}s", config.agent.timeout_secs);
            println!(
                "   Response cap:    {}",
                config.guardrails.max_automated_responses
            );
            println!(
                "   Extra patterns:  {} human, {} blocked",
                config.guardrails.extra_human_patterns.len(),
                config.guardrails.extra_blocked_patterns.len()
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e);
        }
    }

    Ok(())
}

fn write_default(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    if path.exists() {
        println!("   Config already exists at {}", path.display());
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("   ✅ Wrote default config to {}", path.display());
    Ok(())
}
