use clap::ValueEnum;
use colored::Colorize;

use crate::error::Result;
use crate::model::EffectiveReservation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

/// Write guard diagnostics to stderr, one line each.
pub fn print_diagnostics(lines: &[String]) {
    for line in lines {
        eprintln!("{line}");
    }
}

pub fn print_reservations(reservations: &[EffectiveReservation], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(reservations)?),
        Format::Pretty => {
            if reservations.is_empty() {
                println!("{}", "No active exclusive reservations.".dimmed());
            }
            for r in reservations {
                println!("{} {}", r.pattern.green(), format!("[{}]", r.holder).cyan());
                if let Some(ref id) = r.id {
                    println!("  {} {}", "id:".dimmed(), id);
                }
                match r.expires_at {
                    Some(at) => println!("  {} {}", "expires:".dimmed(), at.to_rfc3339()),
                    None => println!("  {} never", "expires:".dimmed()),
                }
            }
        }
        Format::Minimal => {
            for r in reservations {
                println!("{}\t{}", r.pattern, r.holder);
            }
        }
    }
    Ok(())
}
