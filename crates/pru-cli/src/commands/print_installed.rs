use super::{colorize_version, json_pretty, with_spinner, EXIT_SUCCESS};
use pru_core::Engine;
use pru_schema::ManifestSource;

pub fn run(engine: &Engine, source: &ManifestSource, json: bool) -> Result<u8, String> {
    let report = with_spinner(json, "reading installed packages...", "installed packages read", || {
        engine.installed_report(source)
    })
    .map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    if source.path().is_some() {
        if report.requirements.is_empty() {
            println!("no requirements found");
        } else {
            println!("{:<32} INSTALLED", "REQUIREMENT");
            for req in &report.requirements {
                println!(
                    "{:<32} {}",
                    req.name,
                    colorize_version(req.installed.as_deref())
                );
            }
        }
        println!();
    }

    println!("{:<32} VERSION", "PACKAGE");
    for pkg in &report.installed {
        println!("{:<32} {}", pkg.name, colorize_version(pkg.version.as_deref()));
    }
    Ok(EXIT_SUCCESS)
}
