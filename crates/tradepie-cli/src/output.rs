use std::fmt::Write as _;

use tradepie_core::Snapshot;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render(envelope: &Envelope, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(envelope)?,
    }

    Ok(())
}

fn render_table(envelope: &Envelope) -> Result<(), CliError> {
    println!("request_id  : {}", envelope.meta.request_id);
    println!("generated_at: {}", envelope.meta.generated_at);
    println!("latency_ms  : {}", envelope.meta.latency_ms);
    println!("cache_hit   : {}", envelope.meta.cache_hit);

    if !envelope.meta.warnings.is_empty() {
        println!("warnings:");
        for warning in &envelope.meta.warnings {
            println!("  - {warning}");
        }
    }

    println!("data:");
    let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
    for line in pretty_data.lines() {
        println!("  {line}");
    }

    Ok(())
}

/// Fixed-width table of a snapshot, one row per record, in snapshot order.
pub fn snapshot_table(snapshot: &Snapshot) -> String {
    let total = snapshot.total_price();
    let mut table = String::new();

    let _ = writeln!(
        table,
        "{:<15} {:>14} {:<10} {:>9} {:>7}",
        "SYMBOL", "PRICE", "CURRENCY", "CHANGE%", "SHARE%"
    );
    for record in snapshot {
        let share = if total > 0.0 {
            record.price / total * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            table,
            "{:<15} {:>14} {:<10} {:>+9.2} {:>7.1}",
            record.symbol.as_str(),
            record.price,
            record.currency,
            record.change_pct,
            share
        );
    }
    if snapshot.is_empty() {
        table.push_str("(no records)\n");
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepie_core::{Symbol, TradeRecord};

    fn record(symbol: &str, price: f64, change_pct: f64) -> TradeRecord {
        TradeRecord::new(Symbol::parse(symbol).expect("symbol"), price, "usd", change_pct)
            .expect("record")
    }

    #[test]
    fn table_keeps_snapshot_order_and_shares() {
        let snapshot = Snapshot::new(vec![record("ZZZ", 30.0, -1.5), record("AAA", 10.0, 4.0)]);

        let table = snapshot_table(&snapshot);
        let lines: Vec<_> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("SYMBOL"));
        assert!(lines[1].starts_with("ZZZ"));
        assert!(lines[1].contains("-1.50"));
        assert!(lines[1].ends_with("75.0"));
        assert!(lines[2].contains("+4.00"));
        assert!(lines[2].contains("usd"));
    }

    #[test]
    fn empty_snapshot_is_marked() {
        let table = snapshot_table(&Snapshot::default());
        assert!(table.ends_with("(no records)\n"));
    }
}
