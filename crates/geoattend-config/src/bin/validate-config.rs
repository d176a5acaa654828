//! Config validation CLI tool
//!
//! Validates a geoattendd configuration file and reports any errors.

use geoattend_api::ZoneShape;
use geoattend_util::{default_config_path, format_time_of_day};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a geoattendd configuration file.");
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match geoattend_config::load_config(&config_path) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", geoattend_config::CURRENT_CONFIG_VERSION);
            println!("  Zones: {}", config.zones.len());
            println!("  Teams: {}", config.teams.len());

            if !config.zones.is_empty() {
                println!();
                println!("Zones:");
                for zone in &config.zones {
                    let shape = match &zone.shape {
                        ZoneShape::Circle { radius_meters, .. } => format!("circle r={}m", radius_meters),
                        ZoneShape::Polygon { vertices } => format!("polygon {} vertices", vertices.len()),
                    };
                    let state = if zone.active { "" } else { " (inactive)" };
                    println!("  - {} [{}]: {}{}", zone.id, shape, zone.name, state);
                }
            }

            if !config.teams.is_empty() {
                println!();
                println!("Teams:");
                for team in &config.teams {
                    let hours = match (team.work_hours.start, team.work_hours.end) {
                        (Some(start), Some(end)) => {
                            format!("{}-{}", format_time_of_day(start), format_time_of_day(end))
                        }
                        (Some(start), None) => format!("from {}", format_time_of_day(start)),
                        _ => "no policy".to_string(),
                    };
                    println!(
                        "  - {} [{}]: {} ({} employees)",
                        team.id,
                        hours,
                        team.name,
                        team.employee_ids.len()
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                geoattend_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                geoattend_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                geoattend_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                geoattend_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        geoattend_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
