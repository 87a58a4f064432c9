//! `talespin config` — Configuration management commands.

use std::path::Path;

use anyhow::Context;
use talespin_config::AppConfig;

pub fn validate(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("🔍 Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = config.warnings();
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            let instruct = config
                .resolve_instruct()
                .map(|t| t.name)
                .unwrap_or_else(|| "none (simple formatting)".into());
            let budget = config
                .token_budget
                .map(|b| b.to_string())
                .unwrap_or_else(|| "unset".into());

            println!();
            println!("   User:        {}", config.user_name);
            println!("   Instruct:    {instruct}");
            println!("   Persona:     {:?}", config.persona.position);
            println!("   World info:  {} entries", config.world_info.entries.len());
            println!("   Scan depth:  {}", config.world_info.depth);
            println!("   Budget:      {budget}");
        }
        Err(e) => {
            println!("   ❌ Config error: {e:#}");
            return Err(e);
        }
    }

    Ok(())
}

pub fn show(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(config_path: Option<&Path>) -> anyhow::Result<()> {
    println!("{}", super::config_path(config_path).display());
    Ok(())
}

pub fn init(config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = super::config_path(config_path);
    if path.exists() && !force {
        println!("  Config file exists: {}", path.display());
        println!("  Use --force to overwrite it.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    std::fs::write(&path, AppConfig::default_toml())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Created config file: {}", path.display());
    Ok(())
}
