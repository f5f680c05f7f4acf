use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::index::read_index::ReadIndex;
use crate::process::cluster::{AbCountRow, UmiCountRow};

///////////////////////////////
/// Derive an output file next to the configured output path by
/// prefixing the file name, e.g. counts.tsv -> UMIcounts.tsv
pub fn prefixed_path(output: &Path, prefix: &str) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{}{}", prefix, name))
}

///////////////////////////////
/// Write the molecule-level table:
/// UMI, AB, SingleCell_ID, TREATMENT, UMI_COUNT
pub fn write_umi_counts(path: &Path, index: &ReadIndex, rows: &[UmiCountRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("could not create output file {}", path.display()))?;

    writer.write_record(["UMI", "AB", "SingleCell_ID", "TREATMENT", "UMI_COUNT"])?;
    for row in rows {
        let count = row.count.to_string();
        writer.write_record([
            index.resolve(row.umi),
            index.resolve(row.ab),
            index.resolve(row.cell),
            index.resolve(row.treatment),
            count.as_str(),
        ])?;
    }
    writer.flush()?;
    info!("wrote {} molecule rows to {}", rows.len(), path.display());
    Ok(())
}

///////////////////////////////
/// Write the antibody-per-cell table:
/// AB_BARCODE, SingleCell_BARCODE, AB_COUNT, TREATMENT
pub fn write_ab_counts(path: &Path, index: &ReadIndex, rows: &[AbCountRow]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("could not create output file {}", path.display()))?;

    writer.write_record(["AB_BARCODE", "SingleCell_BARCODE", "AB_COUNT", "TREATMENT"])?;
    for row in rows {
        let count = row.count.to_string();
        writer.write_record([
            index.resolve(row.ab),
            index.resolve(row.cell),
            count.as_str(),
            index.resolve(row.treatment),
        ])?;
    }
    writer.flush()?;
    info!(
        "wrote {} (antibody, single-cell) rows to {}",
        rows.len(),
        path.display()
    );
    Ok(())
}
