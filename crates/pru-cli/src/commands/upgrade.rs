use super::{display_source, json_pretty, output_sink, EXIT_SUCCESS};
use pru_core::Engine;
use pru_schema::ManifestSource;

pub fn run(engine: &Engine, source: &ManifestSource, json: bool) -> Result<u8, String> {
    let mut sink = output_sink(json);
    let outcome = engine
        .upgrade_installed(source, &mut *sink)
        .map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "status": if outcome.is_some() { "upgraded" } else { "skipped" },
            "manifest": source.path(),
            "upgrade": outcome,
        });
        println!("{}", json_pretty(&payload)?);
    } else if outcome.is_none() {
        println!("no packages in {}; nothing to upgrade", display_source(source));
    }
    Ok(EXIT_SUCCESS)
}
