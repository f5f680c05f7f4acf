use anyhow::{bail, Result};
use log::debug;

use crate::barcode::dict::BarcodeDicts;

///////////////////////////////
/// Column layout of the tab-separated read-fields file, resolved once
/// from the template row.
///
/// The template row marks variable barcode columns with all-N fields
/// and the UMI column with an all-X field. Variable columns are counted
/// by occurrence, and that occurrence count (not the raw column index)
/// is what the configured round indices refer to.
#[derive(Debug)]
pub struct BarcodeSchema {
    /// Real column indices of the CI barcodes, in round order
    pub ci_cols: Vec<usize>,
    pub umi_col: usize,
    pub ab_col: usize,
    pub treatment_col: Option<usize>,
    /// Length of the all-X template field
    pub umi_length: usize,
    /// Non-empty field count of the template row; every data row must
    /// have exactly this many fields
    pub n_columns: usize,
}

impl BarcodeSchema {
    pub fn from_template_row(line: &str, dicts: &BarcodeDicts) -> Result<BarcodeSchema> {
        let mut ci_cols = Vec::new();
        let mut umi_col = None;
        let mut ab_col = None;
        let mut treatment_col = None;
        let mut umi_length = 0;

        let mut col = 0;
        let mut variable_count = 0;
        for field in line.split('\t') {
            if field.is_empty() {
                continue;
            }
            if field.bytes().all(|b| b == b'N') {
                if Some(variable_count) == dicts.treatment_round {
                    treatment_col = Some(col);
                }
                if dicts.ci_rounds.contains(&variable_count) {
                    ci_cols.push(col);
                }
                if variable_count == dicts.ab_round {
                    ab_col = Some(col);
                }
                variable_count += 1;
            } else if field.bytes().all(|b| b == b'X') {
                umi_col = Some(col);
                umi_length = field.len();
            }
            col += 1;
        }

        if ci_cols.len() != dicts.num_ci_rounds() {
            bail!(
                "template row marks {} combinatorial-indexing columns but {} rounds are configured",
                ci_cols.len(),
                dicts.num_ci_rounds()
            );
        }
        let Some(umi_col) = umi_col else {
            bail!("template row has no UMI column (all-X field)");
        };
        let Some(ab_col) = ab_col else {
            bail!("template row has no antibody column");
        };

        debug!(
            "schema: {} columns, UMI at {} (length {}), antibody at {}, CI at {:?}, treatment at {:?}",
            col, umi_col, umi_length, ab_col, ci_cols, treatment_col
        );

        Ok(BarcodeSchema {
            ci_cols,
            umi_col,
            ab_col,
            treatment_col,
            umi_length,
            n_columns: col,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dicts(ci: &str, ab: usize, treatment: Option<usize>) -> BarcodeDicts {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barcodes.txt");
        // four rows: two CI rounds, antibody, treatment
        std::fs::write(&path, "AAAA,CCCC\nGGGG,TTTT\nACGT,TGCA\nAATT,CCGG\n").unwrap();
        BarcodeDicts::from_file(&path, ci, ab, treatment).unwrap()
    }

    #[test]
    fn resolves_all_columns() {
        let dicts = test_dicts("0,1", 2, Some(3));
        // constant anchor, CI, CI, UMI, antibody, treatment
        let schema =
            BarcodeSchema::from_template_row("GTACGTAC\tNNNN\tNNNN\tXXXXXXXX\tNNNN\tNNNN", &dicts)
                .unwrap();

        assert_eq!(schema.ci_cols, vec![1, 2]);
        assert_eq!(schema.umi_col, 3);
        assert_eq!(schema.umi_length, 8);
        assert_eq!(schema.ab_col, 4);
        assert_eq!(schema.treatment_col, Some(5));
        assert_eq!(schema.n_columns, 6);
    }

    #[test]
    fn empty_fields_do_not_count_as_columns() {
        let dicts = test_dicts("0", 1, None);
        let schema =
            BarcodeSchema::from_template_row("NNNN\t\tXXXX\tNNNN", &dicts).unwrap();
        assert_eq!(schema.ci_cols, vec![0]);
        assert_eq!(schema.umi_col, 1);
        assert_eq!(schema.ab_col, 2);
        assert_eq!(schema.n_columns, 3);
    }

    #[test]
    fn missing_umi_column_is_fatal() {
        let dicts = test_dicts("0", 1, None);
        let err = BarcodeSchema::from_template_row("NNNN\tNNNN", &dicts).unwrap_err();
        assert!(err.to_string().contains("UMI"));
    }

    #[test]
    fn missing_antibody_column_is_fatal() {
        let dicts = test_dicts("0", 1, None);
        // only one variable column: the CI round; antibody round never occurs
        let err = BarcodeSchema::from_template_row("NNNN\tXXXX", &dicts).unwrap_err();
        assert!(err.to_string().contains("antibody"));
    }

    #[test]
    fn ci_column_count_mismatch_is_fatal() {
        let dicts = test_dicts("0,1", 2, None);
        let err = BarcodeSchema::from_template_row("NNNN\tXXXX", &dicts).unwrap_err();
        assert!(err.to_string().contains("combinatorial-indexing"));
    }
}
