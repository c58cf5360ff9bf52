use super::replace_versions::print_changes;
use super::{display_source, json_pretty, output_sink, EXIT_SUCCESS};
use pru_core::{Engine, PinOptions};
use pru_schema::ManifestSource;

pub fn run(
    engine: &Engine,
    source: &ManifestSource,
    options: &PinOptions,
    json: bool,
) -> Result<u8, String> {
    let mut sink = output_sink(json);
    let result = engine
        .upgrade_requirements(source, options, &mut *sink)
        .map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "status": if source.path().is_some() { "upgraded" } else { "skipped" },
            "manifest": source.path(),
            "output": result.pin.written_to,
            "upgrade": result.upgrade,
            "changed": result.pin.changed,
            "report": result.pin.report,
        });
        println!("{}", json_pretty(&payload)?);
    } else if source.path().is_none() {
        println!("no requirements file given; nothing to upgrade");
    } else {
        print_changes(&result.pin);
        println!("Upgraded packages in {}", display_source(source));
    }
    Ok(EXIT_SUCCESS)
}
