//! Per-watcher memory of listings already notified.
//!
//! The price is part of a listing's identity here: a listing that comes back
//! at a different price is announced again.
//!
//! Entries are never pruned, growth is bounded only by the number of distinct
//! `(id, price)` pairs a watcher announces during the process lifetime.

use crate::types::TokenId;

/// Listing that has already been announced at a given crypto price.
#[derive(Clone, Debug, PartialEq)]
pub struct SeenEntry {
    pub id: TokenId,
    pub price: f64,
}

/// Append-only collection of [`SeenEntry`].
///
/// Owned by a single watcher loop, no internal synchronization.
#[derive(Clone, Debug, Default)]
pub struct SeenLedger {
    entries: Vec<SeenEntry>,
}

impl SeenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact match on both the id and the price.
    pub fn has_seen(&self, id: &str, price: f64) -> bool {
        self.entries.iter().any(|e| e.id == id && e.price == price)
    }

    /// Appends unconditionally, callers check [`SeenLedger::has_seen`] first.
    pub fn record(&mut self, id: impl Into<TokenId>, price: f64) {
        self.entries.push(SeenEntry {
            id: id.into(),
            price,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SeenEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_then_seen() {
        let mut ledger = SeenLedger::new();
        assert!(!ledger.has_seen("42", 0.2));

        ledger.record("42", 0.2);
        assert!(ledger.has_seen("42", 0.2));
        assert!(!ledger.has_seen("42", 0.19));
        assert!(!ledger.has_seen("43", 0.2));
    }

    #[test]
    fn test_record_does_not_deduplicate() {
        let mut ledger = SeenLedger::new();
        ledger.record("42", 0.2);
        ledger.record("42", 0.2);
        assert_eq!(ledger.len(), 2);
        assert_eq!(
            ledger.entries()[0],
            SeenEntry {
                id: "42".to_string(),
                price: 0.2
            }
        );
    }

    #[test]
    fn test_same_id_multiple_prices() {
        let mut ledger = SeenLedger::new();
        ledger.record("42", 0.2);
        ledger.record("42", 0.15);
        assert!(ledger.has_seen("42", 0.2));
        assert!(ledger.has_seen("42", 0.15));
        assert!(!ledger.is_empty());
    }
}
