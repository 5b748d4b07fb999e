//! Per-session deduplication of aggregation rows

use super::{AggregationRow, SeenKey};
use std::collections::{HashSet, VecDeque};

/// Drops rows whose (stock, timestamp) key was already forwarded
///
/// Matching is on the key alone: a later row with the same key but different
/// prices is dropped. The seen set lives as long as the session that owns it
/// and is unbounded unless `with_max_keys` is used.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<SeenKey>,
    /// Insertion order, only tracked when bounded
    order: VecDeque<SeenKey>,
    max_keys: Option<usize>,
    evicted: u64,
}

impl Deduplicator {
    /// Create an unbounded deduplicator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a deduplicator that evicts its oldest keys beyond `max_keys`
    ///
    /// An evicted key that shows up again is forwarded again.
    pub fn with_max_keys(max_keys: usize) -> Self {
        Self {
            max_keys: Some(max_keys.max(1)),
            ..Self::default()
        }
    }

    /// Keep only rows not seen before, in input order
    pub fn filter(&mut self, rows: Vec<AggregationRow>) -> Vec<AggregationRow> {
        rows.into_iter().filter(|row| self.insert(row.key())).collect()
    }

    /// Record a key, returning false if it was already present
    fn insert(&mut self, key: SeenKey) -> bool {
        let Some(max_keys) = self.max_keys else {
            return self.seen.insert(key);
        };

        if !self.seen.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);

        while self.seen.len() > max_keys {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.seen.remove(&oldest);
                    self.evicted += 1;
                }
                None => break,
            }
        }
        true
    }

    /// Whether a key has been forwarded (and not evicted)
    pub fn contains(&self, key: &SeenKey) -> bool {
        self.seen.contains(key)
    }

    /// Number of keys currently tracked
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Keys dropped by the eviction bound so far
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn max_keys(&self) -> Option<usize> {
        self.max_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 2, 11, 22, 6, secs).unwrap()
    }

    fn row(stock: &str, secs: u32, ask: f64) -> AggregationRow {
        AggregationRow {
            stock: stock.to_string(),
            top_ask_price: ask,
            top_bid_price: 0.0,
            timestamp: ts(secs),
        }
    }

    #[test]
    fn test_first_batch_passes_through() {
        let mut dedup = Deduplicator::new();
        let rows = vec![row("ABC", 1, 10.0), row("DEF", 1, 20.0)];
        assert_eq!(dedup.filter(rows.clone()), rows);
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_repeated_batch_is_dropped() {
        let mut dedup = Deduplicator::new();
        let rows = vec![row("BB", 1, 10.0)];
        assert_eq!(dedup.filter(rows.clone()).len(), 1);
        assert!(dedup.filter(rows).is_empty());
    }

    #[test]
    fn test_same_key_different_price_is_dropped() {
        let mut dedup = Deduplicator::new();
        dedup.filter(vec![row("BB", 1, 10.0)]);
        assert!(dedup.filter(vec![row("BB", 1, 99.0)]).is_empty());
    }

    #[test]
    fn test_duplicates_within_one_batch() {
        let mut dedup = Deduplicator::new();
        let out = dedup.filter(vec![row("BB", 1, 10.0), row("BB", 1, 11.0), row("CC", 1, 5.0)]);
        assert_eq!(out, vec![row("BB", 1, 10.0), row("CC", 1, 5.0)]);
    }

    #[test]
    fn test_order_preserved_with_mixed_batch() {
        let mut dedup = Deduplicator::new();
        dedup.filter(vec![row("ABC", 1, 10.0)]);

        let out = dedup.filter(vec![row("DEF", 2, 1.0), row("ABC", 1, 10.0), row("ABC", 2, 11.0)]);
        assert_eq!(out, vec![row("DEF", 2, 1.0), row("ABC", 2, 11.0)]);
    }

    #[test]
    fn test_each_key_emitted_once_across_sequence() {
        let mut dedup = Deduplicator::new();
        let mut emitted = Vec::new();

        for tick in 0..50u32 {
            // Overlapping windows: every key is reported by several ticks
            let batch: Vec<_> = (tick..tick + 5)
                .map(|s| row(if s % 2 == 0 { "ABC" } else { "DEF" }, s % 60, s as f64))
                .collect();
            emitted.extend(dedup.filter(batch).into_iter().map(|r| r.key()));
        }

        let unique: HashSet<_> = emitted.iter().cloned().collect();
        assert_eq!(unique.len(), emitted.len());
        assert_eq!(emitted.len(), 54);
    }

    #[test]
    fn test_contains() {
        let mut dedup = Deduplicator::new();
        dedup.filter(vec![row("ABC", 1, 10.0)]);
        assert!(dedup.contains(&row("ABC", 1, 0.0).key()));
        assert!(!dedup.contains(&row("ABC", 2, 0.0).key()));
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.max_keys().is_none());
        dedup.filter((0..60).map(|s| row("ABC", s, 1.0)).collect());
        assert_eq!(dedup.len(), 60);
        assert_eq!(dedup.evicted(), 0);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut dedup = Deduplicator::with_max_keys(2);
        dedup.filter(vec![row("ABC", 1, 1.0), row("ABC", 2, 1.0), row("ABC", 3, 1.0)]);

        assert_eq!(dedup.len(), 2);
        assert_eq!(dedup.evicted(), 1);
        assert!(!dedup.contains(&row("ABC", 1, 0.0).key()));
        assert!(dedup.contains(&row("ABC", 3, 0.0).key()));

        // Evicted key is forwarded again
        assert_eq!(dedup.filter(vec![row("ABC", 1, 1.0)]).len(), 1);
    }
}
