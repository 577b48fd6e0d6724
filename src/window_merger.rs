//! Merge of per-customer purchase windows into one network window

use crate::purchase_ledger::{PurchaseLedger, PurchaseRecord};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Heap entry ordered by recency only
struct ByRecency<'a>(&'a PurchaseRecord);

impl PartialEq for ByRecency<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.sequence == other.0.sequence
    }
}

impl Eq for ByRecency<'_> {}

impl PartialOrd for ByRecency<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByRecency<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.sequence.cmp(&other.0.sequence)
    }
}

/// The `limit` most recent purchases made by any of `customers`, newest first.
///
/// Keeps a min-heap of at most `limit` entries keyed by sequence number, so
/// the merge costs O(N log limit) over N candidate records.
pub fn merge_latest<'a, I>(ledger: &'a PurchaseLedger, customers: I, limit: usize) -> Vec<&'a PurchaseRecord>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut heap: BinaryHeap<Reverse<ByRecency<'a>>> = BinaryHeap::with_capacity(limit);

    for customer in customers {
        for record in ledger.window(customer.as_ref()) {
            if heap.len() < limit {
                heap.push(Reverse(ByRecency(record)));
            } else if let Some(mut oldest) = heap.peek_mut() {
                if record.sequence > oldest.0 .0.sequence {
                    *oldest = Reverse(ByRecency(record));
                }
            }
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(ByRecency(record))| record)
        .collect()
}
