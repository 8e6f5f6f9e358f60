//! `deskpilot tools` — List the support tool catalogue.

use std::sync::Arc;

use deskpilot_tools::{StubBackend, support_registry};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let registry = support_registry(Arc::new(StubBackend::new()));

    println!("🔧 Support tools ({})", registry.len());
    println!("====================\n");

    for def in registry.definitions() {
        println!("  {}", def.name);
        println!("    {}", def.description);
        for param in &def.parameters.params {
            let marker = if param.required { "required" } else { "optional" };
            println!(
                "      - {} ({:?}, {marker}): {}",
                param.name, param.kind, param.description
            );
        }
        println!();
    }

    Ok(())
}
