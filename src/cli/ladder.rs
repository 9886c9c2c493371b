//! Payout ladder command implementation.

use super::{CliError, OutputFormat};
use coderace::Cents;
use coderace::tournament::{PayoutBand, describe_ladder, paid_positions, pool_size};
use serde::Serialize;

/// JSON-serializable ladder description.
#[derive(Debug, Serialize)]
struct JsonLadder {
    /// Field size.
    entrants: u32,
    /// Pool after the rake carve-out.
    pool: Cents,
    /// In-the-money positions.
    paid_positions: u32,
    /// Bands of equal prizes.
    bands: Vec<PayoutBand>,
}

/// Execute the ladder command.
///
/// # Errors
///
/// Returns an error for an empty field or a rake above the buy-in.
pub(crate) fn execute(
    entrants: u32,
    buy_in: Cents,
    rake: Cents,
    format: OutputFormat,
) -> Result<(), CliError> {
    if entrants == 0 {
        return Err(CliError::new("field must have at least one entrant"));
    }
    if rake > buy_in {
        return Err(CliError::new(format!(
            "rake {rake} exceeds buy-in {buy_in}"
        )));
    }

    let pool = pool_size(buy_in, rake, entrants);
    let bands = describe_ladder(entrants, pool);

    match format {
        OutputFormat::Text => {
            println!(
                "Payout ladder: {entrants} entrants, pool {} ({} paid)",
                dollars(pool),
                paid_positions(entrants)
            );
            println!("----------------------------------------");
            for band in &bands {
                let ranks = if band.first_rank == band.last_rank {
                    format!("#{}", band.first_rank)
                } else {
                    format!("#{}-#{}", band.first_rank, band.last_rank)
                };
                println!("  {ranks:<10} {}", dollars(band.prize_each));
            }
        }
        OutputFormat::Json => {
            let ladder = JsonLadder {
                entrants,
                pool,
                paid_positions: paid_positions(entrants),
                bands,
            };
            let json = serde_json::to_string_pretty(&ladder)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Render cents as a dollar string.
fn dollars(cents: Cents) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}
