//! Per-source timestamp rebasing

/// Records carrying an absolute timestamp
pub trait Timestamped {
    fn timestamp(&self) -> i64;
}

/// A record with its timestamp rebased to the source's earliest observation
#[derive(Debug, Clone, PartialEq)]
pub struct Rebased<T> {
    pub relative_timestamp: i64,
    pub record: T,
}

/// Earliest timestamp of a source, `None` when the source is empty
pub fn time_origin<T: Timestamped>(rows: &[T]) -> Option<i64> {
    rows.iter().map(Timestamped::timestamp).min()
}

/// Rebase every row of one source onto its own origin.
///
/// Each source must be rebased independently before any cross-source join;
/// the join then matches on the relative timestamps exactly.
pub fn rebase<T: Timestamped>(rows: Vec<T>) -> Vec<Rebased<T>> {
    let Some(t0) = time_origin(&rows) else {
        return Vec::new();
    };
    rows.into_iter()
        .map(|record| Rebased {
            relative_timestamp: record.timestamp() - t0,
            record,
        })
        .collect()
}
