//! redb table definitions for the metric store.
//!
//! Records live in `metrics` under an order-preserving key so that a
//! reverse scan yields newest-first. `metric_ids` maps the public id back
//! to that key for deletion.

use redb::TableDefinition;

/// Metric records (JSON) keyed by `{timestamp}:{sequence}`, see [`order_key`].
pub const METRICS: TableDefinition<&str, &[u8]> = TableDefinition::new("metrics");

/// Ordering key keyed by metric id.
pub const METRIC_IDS: TableDefinition<&str, &str> = TableDefinition::new("metric_ids");

/// Store-wide counters.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Key in [`META`] holding the last assigned insertion sequence.
pub const SEQUENCE_KEY: &str = "sequence";

/// Build the ordering key for a record.
///
/// The timestamp is stored as microseconds with the sign bit flipped so
/// pre-epoch times still sort before post-epoch ones, zero-padded to a
/// fixed width. The insertion sequence breaks ties between equal
/// timestamps.
pub fn order_key(timestamp_micros: i64, sequence: u64) -> String {
    let sortable = (timestamp_micros as u64) ^ (1 << 63);
    format!("{sortable:020}:{sequence:020}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_key_sorts_by_time_then_sequence() {
        let mut keys = vec![
            order_key(2_000, 1),
            order_key(-5, 7),
            order_key(1_000, 9),
            order_key(1_000, 3),
            order_key(0, 2),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                order_key(-5, 7),
                order_key(0, 2),
                order_key(1_000, 3),
                order_key(1_000, 9),
                order_key(2_000, 1),
            ]
        );
    }
}
