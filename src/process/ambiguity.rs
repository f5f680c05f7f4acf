use itertools::Itertools;

use crate::index::read_index::{ReadId, ReadIndex};

/// Threshold for the majority vote over one UMI bucket
const MAJORITY_RATIO: f64 = 0.9;

///////////////////////////////
/// Decision for one UMI bucket: which reads are noise and how many
/// reads were removed
pub struct UmiBucketOutcome {
    pub to_delete: Vec<ReadId>,
    pub removed: usize,
}

///////////////////////////////
/// Decide which reads sharing one UMI sequence are real.
///
/// Reads are grouped by their (cell, antibody, treatment) identity. A
/// group qualifies as the real identity when its occurrence count
/// divided by the number of distinct identities reaches 0.9. Note the
/// denominator: distinct identities, not bucket size. This matches the
/// reference behavior and is flagged as a product question; see
/// DESIGN.md before changing it.
///
/// With a qualifying identity, only the reads of other identities are
/// removed. Without one, the UMI is unresolvable and the whole bucket
/// is removed. A bucket of size 1 always qualifies (ratio 1/1).
pub fn resolve_umi_bucket(index: &ReadIndex, bucket: &[ReadId]) -> UmiBucketOutcome {
    let counts = bucket
        .iter()
        .map(|&id| {
            let read = index.read(id);
            (read.cell, read.ab, read.treatment)
        })
        .counts();

    let distinct = counts.len();
    let real_identity = counts
        .iter()
        .find(|(_, &count)| count as f64 / distinct as f64 >= MAJORITY_RATIO)
        .map(|(&identity, _)| identity);

    match real_identity {
        Some(real) => {
            let to_delete: Vec<ReadId> = bucket
                .iter()
                .copied()
                .filter(|&id| {
                    let read = index.read(id);
                    (read.cell, read.ab, read.treatment) != real
                })
                .collect();
            let removed = to_delete.len();
            UmiBucketOutcome { to_delete, removed }
        }
        None => UmiBucketOutcome {
            to_delete: bucket.to_vec(),
            removed: bucket.len(),
        },
    }
}
