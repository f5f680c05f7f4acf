use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::debug;
use rustc_hash::FxHashMap;

///////////////////////////////
/// Barcode dictionaries derived from the barcode definition file.
///
/// The file is comma-separated, one row per bracket position of the
/// read template. The rows named by the combinatorial-indexing round
/// indices become per-round barcode-to-code maps; the antibody row and
/// the optional treatment row become lookup dictionaries.
pub struct BarcodeDicts {
    /// Indices of the CI rounds within the barcode file, in the order
    /// the rounds occur in a read
    pub ci_rounds: Vec<usize>,
    pub ab_round: usize,
    pub treatment_round: Option<usize>,

    /// One barcode-to-code map per CI round, same order as ci_rounds.
    /// Codes are 0-based, in order of occurrence within the row
    ci_codes: Vec<FxHashMap<String, usize>>,
    antibody: FxHashMap<String, usize>,
    treatment: FxHashMap<String, usize>,
}

impl BarcodeDicts {
    pub fn from_file(
        path: &Path,
        ci_round_list: &str,
        ab_round: usize,
        treatment_round: Option<usize>,
    ) -> Result<BarcodeDicts> {
        let file = File::open(path)
            .with_context(|| format!("could not open barcode file {}", path.display()))?;
        let rows = parse_barcode_rows(BufReader::new(file))?;

        let ci_rounds = parse_round_list(ci_round_list)?;

        let mut ci_codes = Vec::with_capacity(ci_rounds.len());
        for &round in &ci_rounds {
            ci_codes.push(seq_to_code_map(&rows, round)?);
        }

        let antibody = seq_to_code_map(&rows, ab_round)?;
        let treatment = match treatment_round {
            Some(round) => seq_to_code_map(&rows, round)?,
            None => FxHashMap::default(),
        };

        debug!(
            "barcode file has {} rows; {} CI rounds configured",
            rows.len(),
            ci_rounds.len()
        );

        Ok(BarcodeDicts {
            ci_rounds,
            ab_round,
            treatment_round,
            ci_codes,
            antibody,
            treatment,
        })
    }

    pub fn num_ci_rounds(&self) -> usize {
        self.ci_rounds.len()
    }

    ///////////////////////////////
    /// Canonical antibody name for an observed antibody barcode.
    /// The upstream splitter only emits dictionary sequences, so a miss
    /// means the input file does not belong to this barcode file
    pub fn antibody_name<'a>(&'a self, seq: &str) -> Result<&'a str> {
        match self.antibody.get_key_value(seq) {
            Some((name, _)) => Ok(name),
            None => bail!("antibody barcode {} is not in the barcode file", seq),
        }
    }

    pub fn treatment_name<'a>(&'a self, seq: &str) -> Result<&'a str> {
        match self.treatment.get_key_value(seq) {
            Some((name, _)) => Ok(name),
            None => bail!("treatment barcode {} is not in the barcode file", seq),
        }
    }

    ///////////////////////////////
    /// Build the single-cell identifier from per-round CI barcode
    /// values, in schema order: the integer code of each value, joined
    /// by '.'. Deterministic for a fixed barcode file
    pub fn single_cell_id(&self, ci_values: &[&str]) -> Result<String> {
        let mut codes = Vec::with_capacity(ci_values.len());
        for (round, value) in self.ci_codes.iter().zip(ci_values.iter()) {
            match round.get(*value) {
                Some(code) => codes.push(code.to_string()),
                None => bail!(
                    "combinatorial-indexing barcode {} is not in the barcode file",
                    value
                ),
            }
        }
        Ok(codes.join("."))
    }
}

///////////////////////////////
/// Read all rows of the barcode file, validating that every sequence
/// is plain A/C/G/T (case insensitive). Whitespace gets its own
/// diagnostic since it is the most common way these files break
fn parse_barcode_rows(reader: impl BufRead) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line.context("could not read barcode file")?;
        let line = line.trim_end_matches('\r');
        let mut row = Vec::new();
        for seq in line.split(',') {
            validate_sequence(seq)?;
            row.push(seq.to_string());
        }
        rows.push(row);
    }
    if rows.is_empty() {
        bail!("barcode file is empty");
    }
    Ok(rows)
}

fn validate_sequence(seq: &str) -> Result<()> {
    for c in seq.chars() {
        if !matches!(c, 'A' | 'C' | 'G' | 'T' | 'a' | 'c' | 'g' | 't') {
            if c.is_whitespace() {
                bail!(
                    "detected a whitespace in barcode sequence {:?}; remove it to continue",
                    seq
                );
            }
            bail!(
                "barcode sequence {:?} contains a character that is not a base (A,C,G,T)",
                seq
            );
        }
    }
    Ok(())
}

fn parse_round_list(list: &str) -> Result<Vec<usize>> {
    let mut rounds = Vec::new();
    for part in list.split(',') {
        let round = part
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid round index {:?} in round list {:?}", part, list))?;
        rounds.push(round);
    }
    Ok(rounds)
}

fn seq_to_code_map(rows: &[Vec<String>], round: usize) -> Result<FxHashMap<String, usize>> {
    let Some(row) = rows.get(round) else {
        bail!(
            "round index {} is out of range; barcode file has {} rows",
            round,
            rows.len()
        );
    };
    let mut map = FxHashMap::default();
    for (code, seq) in row.iter().enumerate() {
        map.entry(seq.clone()).or_insert(code);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn dicts_from_str(content: &str, ci: &str, ab: usize, treatment: Option<usize>) -> Result<BarcodeDicts> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("barcodes.txt");
        std::fs::write(&path, content).unwrap();
        BarcodeDicts::from_file(&path, ci, ab, treatment)
    }

    #[test]
    fn codes_follow_order_of_occurrence() {
        let dicts = dicts_from_str("ACGT,TTTT,GGGG\nAAAA,CCCC\nACTG,GTCA\n", "0,2", 1, None).unwrap();

        assert_eq!(dicts.num_ci_rounds(), 2);
        assert_eq!(dicts.single_cell_id(&["ACGT", "ACTG"]).unwrap(), "0.0");
        assert_eq!(dicts.single_cell_id(&["GGGG", "GTCA"]).unwrap(), "2.1");
    }

    #[test]
    fn single_cell_id_is_deterministic() {
        let dicts = dicts_from_str("ACGT,TTTT\nAAAA,CCCC\n", "0,1", 1, None).unwrap();
        let a = dicts.single_cell_id(&["TTTT", "CCCC"]).unwrap();
        let b = dicts.single_cell_id(&["TTTT", "CCCC"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "1.1");
    }

    #[test]
    fn unknown_ci_barcode_is_fatal() {
        let dicts = dicts_from_str("ACGT,TTTT\nAAAA\n", "0", 1, None).unwrap();
        assert!(dicts.single_cell_id(&["CCCC"]).is_err());
    }

    #[test]
    fn antibody_lookup_returns_dictionary_entry() {
        let dicts = dicts_from_str("ACGT\nAAAA,CCCC\n", "0", 1, None).unwrap();
        assert_eq!(dicts.antibody_name("CCCC").unwrap(), "CCCC");
        assert!(dicts.antibody_name("GGGG").is_err());
    }

    #[test]
    fn whitespace_in_sequence_has_its_own_diagnostic() {
        let err = parse_barcode_rows(Cursor::new("ACGT,TT TT\n")).unwrap_err();
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn non_base_character_is_fatal() {
        let err = parse_barcode_rows(Cursor::new("ACGT,TTXT\n")).unwrap_err();
        assert!(err.to_string().contains("not a base"));
    }

    #[test]
    fn lowercase_bases_are_accepted() {
        assert!(parse_barcode_rows(Cursor::new("acgt,ACGT\n")).is_ok());
    }

    #[test]
    fn round_index_out_of_range_is_fatal() {
        let res = dicts_from_str("ACGT\n", "0", 5, None);
        assert!(res.is_err());
    }
}
