use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use flate2::read::MultiGzDecoder;
use log::info;

use crate::barcode::dict::BarcodeDicts;
use crate::barcode::schema::BarcodeSchema;
use crate::index::read_index::ReadIndex;

///////////////////////////////
/// Read the gzip-compressed tab-separated read-fields file into
/// memory. The first row is the template row and resolves the column
/// schema; every following row is a data row with the same field
/// count. All input is loaded before any parallel processing starts
pub fn load_reads(path: &Path, dicts: &BarcodeDicts) -> Result<(BarcodeSchema, ReadIndex)> {
    let is_gz = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(".gz"));
    if !is_gz {
        bail!("input file must be gzip compressed (.gz): {}", path.display());
    }

    let file = File::open(path)
        .with_context(|| format!("could not open input file {}", path.display()))?;
    let reader = BufReader::new(MultiGzDecoder::new(file));
    let mut lines = reader.lines();

    let template = match lines.next() {
        Some(line) => line.context("could not read template row")?,
        None => bail!("input file is empty: {}", path.display()),
    };
    let schema = BarcodeSchema::from_template_row(&template, dicts)?;

    let mut index = ReadIndex::new();
    for line in lines {
        let line = line.context("could not read input file")?;
        index.add_row(&line, &schema, dicts)?;
        if index.n_reads() % 1_000_000 == 0 {
            info!("loaded {} reads", index.n_reads());
        }
    }
    info!(
        "loaded {} reads: {} unique UMIs, {} (antibody, single-cell) groups",
        index.n_reads(),
        index.n_umis(),
        index.n_ab_cells()
    );

    Ok((schema, index))
}
