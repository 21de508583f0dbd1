use eyre::Result;
use retold_engine::{Provider, default_registry};

pub fn handle_providers_command() -> Result<()> {
    let registry = default_registry();

    println!("🤖 Known providers:");
    for id in registry.ids() {
        // Ids come from the registry, so the lookup cannot miss.
        let Some(provider) = registry.get(id) else {
            continue;
        };
        let status = if provider.is_configured() {
            "✅"
        } else {
            "⬜"
        };
        match provider.key_var() {
            Some(var) => println!("  {} {:<10} key: {}", status, id, var),
            None => println!("  {} {:<10} no key required", status, id),
        }
    }

    println!();
    println!("💡 An http(s) URL also works as a provider: it is treated as an");
    println!("   OpenAI-compatible chat completions endpoint (e.g. a local server).");

    Ok(())
}
