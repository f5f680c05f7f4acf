use rustc_hash::FxHashSet;

use crate::index::intern::Symbol;
use crate::index::read_index::{ReadId, ReadIndex};

///////////////////////////////
/// One molecule: a cluster of near-identical UMIs within one
/// (antibody, single-cell) context
#[derive(Clone, Copy, Debug)]
pub struct UmiCountRow {
    pub umi: Symbol,
    pub ab: Symbol,
    pub cell: Symbol,
    pub treatment: Symbol,
    pub count: u64,
}

///////////////////////////////
/// Total molecule count for one (antibody, single-cell) context
#[derive(Clone, Copy, Debug)]
pub struct AbCountRow {
    pub ab: Symbol,
    pub cell: Symbol,
    pub treatment: Symbol,
    pub count: u64,
}

///////////////////////////////
/// Single-pass mismatch comparison of two UMIs.
///
/// Positional substitution count over the common prefix, with a length
/// difference contributing its absolute value. Not a full edit
/// distance: an indel shifts every following position into a mismatch.
/// Early exit once the budget is spent
pub fn umis_within(a: &str, b: &str, max_mismatches: usize) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut mismatches = a.len().abs_diff(b.len());
    if mismatches > max_mismatches {
        return false;
    }
    for (x, y) in a.iter().zip(b.iter()) {
        if x != y {
            mismatches += 1;
            if mismatches > max_mismatches {
                return false;
            }
        }
    }
    true
}

///////////////////////////////
/// Cluster the UMIs of one (antibody, single-cell) bucket into
/// molecules and count them.
///
/// Works from the back of the bucket: the last remaining read becomes
/// the representative of a new molecule, unless it was marked deleted
/// by the ambiguity filter, in which case it is dropped. Every other
/// remaining read whose UMI is within the mismatch threshold of the
/// representative folds into the molecule. The order in which
/// representatives are chosen is not a semantic invariant.
pub fn count_bucket(
    index: &ReadIndex,
    bucket: &[ReadId],
    deleted: &FxHashSet<ReadId>,
    max_mismatches: usize,
) -> (Vec<UmiCountRow>, Option<AbCountRow>) {
    let first = index.read(bucket[0]);
    let mut umi_rows = Vec::new();
    let mut molecules = 0u64;

    let mut working: Vec<ReadId> = bucket.to_vec();
    while let Some(rep) = working.pop() {
        if deleted.contains(&rep) {
            continue;
        }
        let rep_read = index.read(rep);
        let rep_umi = index.resolve(rep_read.umi);

        let mut count = 1u64;
        working.retain(|&other| {
            let other_umi = index.resolve(index.read(other).umi);
            if umis_within(rep_umi, other_umi, max_mismatches) {
                count += 1;
                false
            } else {
                true
            }
        });

        umi_rows.push(UmiCountRow {
            umi: rep_read.umi,
            ab: first.ab,
            cell: first.cell,
            treatment: first.treatment,
            count,
        });
        molecules += 1;
    }

    let ab_row = (molecules > 0).then_some(AbCountRow {
        ab: first.ab,
        cell: first.cell,
        treatment: first.treatment,
        count: molecules,
    });
    (umi_rows, ab_row)
}
