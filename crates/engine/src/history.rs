//! Sorting and pagination of an account's transaction history.

use crate::Transaction;

/// Order applied to a transaction set before it is paginated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryOrder {
    /// Order returned by the ledger store.
    #[default]
    Store,
    /// Ascending by the magnitude of `change`.
    Change,
    /// Ascending by `change_time`.
    Time,
}

impl HistoryOrder {
    /// `change_sort` takes precedence over `time_sort`.
    #[must_use]
    pub fn from_flags(change_sort: bool, time_sort: bool) -> Self {
        if change_sort {
            Self::Change
        } else if time_sort {
            Self::Time
        } else {
            Self::Store
        }
    }
}

/// Sort in place. The sort is stable, so ties keep store order.
///
/// [`HistoryOrder::Change`] compares magnitudes, not signed values: a
/// withdrawal of 200 sorts after a deposit of 100 and ties with a deposit
/// of 200.
pub fn sort_transactions(transactions: &mut [Transaction], order: HistoryOrder) {
    match order {
        HistoryOrder::Store => {}
        HistoryOrder::Change => transactions.sort_by_key(|tx| tx.change.unsigned_abs()),
        HistoryOrder::Time => transactions.sort_by_key(|tx| tx.change_time),
    }
}

/// Slice page `page` (1-based) of `per_page` items out of `items`.
///
/// A page past the end is clamped to the last page instead of coming back
/// empty, and the last page may be shorter than `per_page`. Callers validate
/// `page >= 1` and `per_page >= 1`.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if items.is_empty() || per_page == 0 {
        return &[];
    }

    let mut start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= items.len() {
        let pages = items.len().div_ceil(per_page);
        start = (pages - 1) * per_page;
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn numbered(len: usize) -> Vec<usize> {
        (0..len).collect()
    }

    #[test]
    fn first_page() {
        let items = numbered(5);
        assert_eq!(paginate(&items, 1, 3), &items[0..3]);
    }

    #[test]
    fn short_last_page() {
        let items = numbered(5);
        assert_eq!(paginate(&items, 2, 3), &items[3..5]);
    }

    #[test]
    fn out_of_range_page_clamps_to_last_page() {
        let items = numbered(6);
        assert_eq!(paginate(&items, 999, 3), &items[3..6]);
        // Exactly one page past the end.
        assert_eq!(paginate(&items, 3, 3), &items[3..6]);

        let items = numbered(7);
        assert_eq!(paginate(&items, 999, 3), &items[6..7]);
    }

    #[test]
    fn empty_history() {
        let items: Vec<usize> = Vec::new();
        assert!(paginate(&items, 1, 3).is_empty());
        assert!(paginate(&items, 5, 3).is_empty());
    }

    #[test]
    fn page_larger_than_history() {
        let items = numbered(2);
        assert_eq!(paginate(&items, 1, 10), &items[..]);
    }

    fn tx(change: i64, second: u32) -> Transaction {
        Transaction::new(
            1,
            0,
            change,
            Utc.with_ymd_and_hms(2009, 11, 17, 20, 34, second).unwrap(),
            "",
            format!("{change}@{second}"),
        )
    }

    fn comments(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|tx| tx.comment.as_str()).collect()
    }

    #[test]
    fn change_sort_wins_and_uses_magnitude() {
        assert_eq!(HistoryOrder::from_flags(true, true), HistoryOrder::Change);
        assert_eq!(HistoryOrder::from_flags(false, true), HistoryOrder::Time);
        assert_eq!(HistoryOrder::from_flags(false, false), HistoryOrder::Store);

        let mut txs = vec![tx(300, 1), tx(-200, 2), tx(100, 3), tx(200, 4)];
        sort_transactions(&mut txs, HistoryOrder::Change);
        assert_eq!(comments(&txs), ["100@3", "-200@2", "200@4", "300@1"]);
    }

    #[test]
    fn time_sort_is_ascending() {
        let mut txs = vec![tx(1, 30), tx(2, 10), tx(3, 20)];
        sort_transactions(&mut txs, HistoryOrder::Time);
        assert_eq!(comments(&txs), ["2@10", "3@20", "1@30"]);
    }

    #[test]
    fn store_order_is_untouched() {
        let mut txs = vec![tx(3, 3), tx(1, 1), tx(2, 2)];
        sort_transactions(&mut txs, HistoryOrder::Store);
        assert_eq!(comments(&txs), ["3@3", "1@1", "2@2"]);
    }
}
