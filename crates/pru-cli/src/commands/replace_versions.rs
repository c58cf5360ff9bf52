use super::{display_source, json_pretty, with_spinner, EXIT_SUCCESS};
use pru_core::{Engine, PinOptions, PinResult};
use pru_schema::ManifestSource;

pub fn run(
    engine: &Engine,
    source: &ManifestSource,
    options: &PinOptions,
    json: bool,
) -> Result<u8, String> {
    let result = with_spinner(json, "pinning installed versions...", "versions resolved", || {
        engine.replace_versions(source, options)
    })
    .map_err(|e| e.to_string())?;

    if options.check {
        return check(source, &result, json);
    }

    if json {
        let payload = serde_json::json!({
            "status": if source.path().is_some() { "pinned" } else { "skipped" },
            "manifest": source.path(),
            "output": result.written_to,
            "changed": result.changed,
            "report": result.report,
        });
        println!("{}", json_pretty(&payload)?);
    } else if source.path().is_none() {
        println!("no requirements file given; nothing to pin");
    } else {
        print_changes(&result);
        println!("Replaced versions in {}", display_source(source));
    }
    Ok(EXIT_SUCCESS)
}

fn check(source: &ManifestSource, result: &PinResult, json: bool) -> Result<u8, String> {
    let stale = result.report.updated().count();
    if result.changed {
        return Err(format!(
            "{} is not pinned: {stale} requirement(s) would change (run 'pru replace-versions')",
            display_source(source)
        ));
    }
    if json {
        let payload = serde_json::json!({
            "status": "pinned",
            "manifest": source.path(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{} is pinned", display_source(source));
    }
    Ok(EXIT_SUCCESS)
}

pub fn print_changes(result: &PinResult) {
    for entry in result.report.updated() {
        println!(
            "  {}: {} -> =={}",
            entry.name,
            entry.previous.as_deref().unwrap_or("(any)"),
            entry.version
        );
    }
    for name in &result.report.unresolved {
        println!("  {name}: not installed, left unchanged");
    }
}
