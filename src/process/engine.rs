use std::sync::{Arc, Mutex};

use linya::Progress;
use log::info;
use rustc_hash::FxHashSet;
use threadpool::ThreadPool;

use crate::index::read_index::{ReadId, ReadIndex};
use crate::process::ambiguity;
use crate::process::cluster::{self, AbCountRow, UmiCountRow};
use crate::process::results::Results;

///////////////////////////////
/// Final output of the deduplication engine
pub struct ProcessOutput {
    pub umi_rows: Vec<UmiCountRow>,
    pub ab_rows: Vec<AbCountRow>,
    pub removed_reads: u64,
}

///////////////////////////////
/// Run the two-phase deduplication over a fully loaded read index.
///
/// Phase 1 resolves UMI ambiguity: one task per unique UMI, each
/// appending its noise reads to the shared deletion set. The pool is
/// joined before phase 2 starts; clustering needs the complete
/// deletion set. Phase 2 clusters UMIs into molecules: one task per
/// unique (antibody, single-cell) bucket, reading the frozen deletion
/// set. Partition-local state is never shared between tasks; only the
/// deletion set, the results sink and the progress bar are, each
/// behind its own lock or atomic.
pub fn process_barcode_mapping(
    index: &Arc<ReadIndex>,
    umi_mismatches: usize,
    threads: usize,
) -> ProcessOutput {
    let results = Arc::new(Results::new());
    let progress = Arc::new(Mutex::new(Progress::new()));

    // phase 1: UMI ambiguity filter
    let deleted = Arc::new(Mutex::new(FxHashSet::<ReadId>::default()));
    let umi_keys = index.umi_keys();
    info!("resolving UMI identity over {} unique UMIs", umi_keys.len());
    let bar = Arc::new(
        progress
            .lock()
            .unwrap()
            .bar(umi_keys.len(), "resolving UMIs"),
    );
    let pool = ThreadPool::new(threads);
    for umi in umi_keys {
        let index = Arc::clone(index);
        let results = Arc::clone(&results);
        let deleted = Arc::clone(&deleted);
        let progress = Arc::clone(&progress);
        let bar = Arc::clone(&bar);
        pool.execute(move || {
            let outcome = ambiguity::resolve_umi_bucket(&index, index.umi_bucket(umi));
            if outcome.removed > 0 {
                results.add_removed_reads(outcome.removed as u64);
            }
            if !outcome.to_delete.is_empty() {
                deleted.lock().unwrap().extend(outcome.to_delete);
            }
            progress.lock().unwrap().inc_and_draw(&bar, 1);
        });
    }
    pool.join();

    // the deletion set is complete and read-only from here on
    let deleted: Arc<FxHashSet<ReadId>> =
        Arc::new(std::mem::take(&mut *deleted.lock().unwrap()));
    info!(
        "{} reads marked as UMI noise ({} removed in total)",
        deleted.len(),
        results.removed_reads()
    );

    // phase 2: UMI clustering per (antibody, single-cell) bucket
    let ab_cell_keys = index.ab_cell_keys();
    info!(
        "clustering UMIs over {} (antibody, single-cell) groups",
        ab_cell_keys.len()
    );
    let bar = Arc::new(
        progress
            .lock()
            .unwrap()
            .bar(ab_cell_keys.len(), "clustering UMIs"),
    );
    let pool = ThreadPool::new(threads);
    for key in ab_cell_keys {
        let index = Arc::clone(index);
        let results = Arc::clone(&results);
        let deleted = Arc::clone(&deleted);
        let progress = Arc::clone(&progress);
        let bar = Arc::clone(&bar);
        pool.execute(move || {
            let (umi_rows, ab_row) = cluster::count_bucket(
                &index,
                index.ab_cell_bucket(key),
                &deleted,
                umi_mismatches,
            );
            results.add_umi_counts(umi_rows);
            if let Some(row) = ab_row {
                results.add_ab_count(row);
            }
            progress.lock().unwrap().inc_and_draw(&bar, 1);
        });
    }
    pool.join();

    let (umi_rows, ab_rows) = results.take_rows();
    ProcessOutput {
        umi_rows,
        ab_rows,
        removed_reads: results.removed_reads(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_key(index: &ReadIndex, row: &UmiCountRow) -> (String, String, u64) {
        (
            index.resolve(row.umi).to_string(),
            index.resolve(row.cell).to_string(),
            row.count,
        )
    }

    #[test]
    fn ambiguous_umi_is_removed_and_survivors_collapse() {
        // two reads with the same UMI, cell and antibody, plus one read
        // with the same UMI in another cell. The third read is noise:
        // its identity reaches only 1/2 distinct against 2/2 for "0.1"
        let mut index = ReadIndex::new();
        index.insert("AAAACCCC", "CD3", "0.1", "");
        index.insert("AAAACCCC", "CD3", "0.1", "");
        index.insert("AAAACCCC", "CD3", "0.2", "");
        let index = Arc::new(index);

        let output = process_barcode_mapping(&index, 1, 2);

        assert_eq!(output.removed_reads, 1);
        assert_eq!(output.umi_rows.len(), 1);
        assert_eq!(
            row_key(&index, &output.umi_rows[0]),
            ("AAAACCCC".to_string(), "0.1".to_string(), 2)
        );
        assert_eq!(output.ab_rows.len(), 1);
        assert_eq!(output.ab_rows[0].count, 1);
        assert_eq!(index.resolve(output.ab_rows[0].cell), "0.1");
    }

    #[test]
    fn independent_groups_are_counted_separately() {
        let mut index = ReadIndex::new();
        // cell 0.1: two molecules (one with a 1-mismatch duplicate)
        index.insert("AAAACCCC", "CD3", "0.1", "");
        index.insert("AAAACCCT", "CD3", "0.1", "");
        index.insert("GGGGTTTT", "CD3", "0.1", "");
        // cell 0.2: one molecule
        index.insert("TTTTAAAA", "CD3", "0.2", "");
        let index = Arc::new(index);

        let output = process_barcode_mapping(&index, 1, 4);

        assert_eq!(output.removed_reads, 0);
        let mut keys: Vec<(String, String, u64)> = output
            .umi_rows
            .iter()
            .map(|row| row_key(&index, row))
            .collect();
        keys.sort();
        // representatives are chosen from the back of each bucket
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().any(|(_, cell, count)| cell == "0.1" && *count == 2));
        assert!(keys.iter().any(|(_, cell, count)| cell == "0.2" && *count == 1));

        let mut ab_counts: Vec<(String, u64)> = output
            .ab_rows
            .iter()
            .map(|row| (index.resolve(row.cell).to_string(), row.count))
            .collect();
        ab_counts.sort();
        assert_eq!(
            ab_counts,
            vec![("0.1".to_string(), 2), ("0.2".to_string(), 1)]
        );
    }

    #[test]
    fn fully_unresolvable_umi_leaves_no_counts() {
        // one shared UMI across two distinct identities, one read each:
        // no identity reaches the threshold, everything is removed
        let mut index = ReadIndex::new();
        index.insert("AAAACCCC", "CD3", "0.1", "");
        index.insert("AAAACCCC", "CD8", "0.2", "");
        let index = Arc::new(index);

        let output = process_barcode_mapping(&index, 1, 2);

        assert_eq!(output.removed_reads, 2);
        assert!(output.umi_rows.is_empty());
        assert!(output.ab_rows.is_empty());
    }
}
