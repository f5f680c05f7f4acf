use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::process::cluster::{AbCountRow, UmiCountRow};

///////////////////////////////
/// Thread-safe sink for counts and deletion statistics. Workers of
/// both phases append concurrently; rows are taken out once the pools
/// have drained
#[derive(Default)]
pub struct Results {
    umi_rows: Mutex<Vec<UmiCountRow>>,
    ab_rows: Mutex<Vec<AbCountRow>>,
    removed_reads: AtomicU64,
}

impl Results {
    pub fn new() -> Results {
        Results::default()
    }

    pub fn add_umi_counts(&self, mut rows: Vec<UmiCountRow>) {
        if rows.is_empty() {
            return;
        }
        self.umi_rows.lock().unwrap().append(&mut rows);
    }

    pub fn add_ab_count(&self, row: AbCountRow) {
        self.ab_rows.lock().unwrap().push(row);
    }

    pub fn add_removed_reads(&self, n: u64) {
        self.removed_reads.fetch_add(n, Ordering::Relaxed);
    }

    pub fn removed_reads(&self) -> u64 {
        self.removed_reads.load(Ordering::Relaxed)
    }

    ///////////////////////////////
    /// Take ownership of the accumulated rows. Only meaningful after
    /// all workers have joined
    pub fn take_rows(&self) -> (Vec<UmiCountRow>, Vec<AbCountRow>) {
        let umi_rows = std::mem::take(&mut *self.umi_rows.lock().unwrap());
        let ab_rows = std::mem::take(&mut *self.ab_rows.lock().unwrap());
        (umi_rows, ab_rows)
    }
}
