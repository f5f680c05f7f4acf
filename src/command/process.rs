use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{bail, Result};
use clap::Args;
use log::info;

use crate::barcode::dict::BarcodeDicts;
use crate::io::{input, output};
use crate::process::engine;

///////////////////////////////
/// Demultiplex a read-fields file into deduplicated per-cell,
/// per-antibody count tables
#[derive(Args)]
pub struct ProcessCMD {
    #[arg(short = 'i', long = "in", help = "Gzip-compressed tab-separated read-fields file")]
    pub path_in: PathBuf,
    #[arg(short = 'o', long = "out", help = "Output path; tables are written next to it with UMI/AB prefixes")]
    pub path_out: PathBuf,
    #[arg(short = 'b', long = "barcodes", help = "Comma-separated barcode dictionary file")]
    pub path_barcodes: PathBuf,
    #[arg(
        long = "ci-rounds",
        help = "Comma-separated indices of the combinatorial-indexing rounds within the barcode file"
    )]
    pub ci_rounds: String,
    #[arg(long = "ab-round", help = "Index of the antibody round within the barcode file")]
    pub ab_round: usize,
    #[arg(long = "treatment-round", help = "Index of the treatment round within the barcode file")]
    pub treatment_round: Option<usize>,
    #[arg(
        short = 'u',
        long = "umi-mismatches",
        default_value_t = 1,
        help = "Maximum mismatches for two UMIs to count as the same molecule"
    )]
    pub umi_mismatches: usize,
    #[arg(short = 't', long = "threads", help = "Worker threads. Defaults to available parallelism")]
    threads: Option<usize>,
}

impl ProcessCMD {
    pub fn try_execute(&mut self) -> Result<()> {
        let threads = self.resolve_thread_config()?;

        let dicts = BarcodeDicts::from_file(
            &self.path_barcodes,
            &self.ci_rounds,
            self.ab_round,
            self.treatment_round,
        )?;

        let (_schema, index) = input::load_reads(&self.path_in, &dicts)?;
        let total_reads = index.n_reads();
        let index = Arc::new(index);

        let result = engine::process_barcode_mapping(&index, self.umi_mismatches, threads);

        output::write_umi_counts(
            &output::prefixed_path(&self.path_out, "UMI"),
            &index,
            &result.umi_rows,
        )?;
        output::write_ab_counts(
            &output::prefixed_path(&self.path_out, "AB"),
            &index,
            &result.ab_rows,
        )?;

        info!(
            "done: {} reads in, {} removed as UMI noise, {} molecules across {} (antibody, single-cell) groups",
            total_reads,
            result.removed_reads,
            result.umi_rows.len(),
            result.ab_rows.len()
        );
        Ok(())
    }

    fn resolve_thread_config(&self) -> Result<usize> {
        if let Some(threads) = self.threads {
            if threads == 0 {
                bail!("at least one worker thread is required");
            }
            return Ok(threads);
        }
        let available = thread::available_parallelism()
            .map_err(|e| anyhow::anyhow!("Failed to get available threads: {}", e))?
            .get();
        Ok(available.max(1))
    }
}
