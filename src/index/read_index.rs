use anyhow::{bail, Result};
use rustc_hash::FxHashMap;

use crate::barcode::dict::BarcodeDicts;
use crate::barcode::schema::BarcodeSchema;
use crate::index::intern::{Interner, Symbol};

/// Identity of one read: its position in the append-only read list
pub type ReadId = u32;

///////////////////////////////
/// One parsed read, fully interned. Immutable after creation
#[derive(Clone, Copy, Debug)]
pub struct ReadRecord {
    pub umi: Symbol,
    pub ab: Symbol,
    pub cell: Symbol,
    pub treatment: Symbol,
}

///////////////////////////////
/// In-memory index of all parsed reads.
///
/// Append-only: reads are never removed, and bucket membership never
/// changes after insertion. Downstream stages exclude reads through a
/// side deletion set of ReadIds, never by mutating this index.
#[derive(Debug)]
pub struct ReadIndex {
    interner: Interner,
    reads: Vec<ReadRecord>,
    by_umi: FxHashMap<Symbol, Vec<ReadId>>,
    by_ab_cell: FxHashMap<(Symbol, Symbol), Vec<ReadId>>,
}

impl ReadIndex {
    pub fn new() -> ReadIndex {
        ReadIndex {
            interner: Interner::new(),
            reads: Vec::new(),
            by_umi: FxHashMap::default(),
            by_ab_cell: FxHashMap::default(),
        }
    }

    ///////////////////////////////
    /// Parse one tab-separated data row and insert it.
    /// Fatal if the non-empty field count differs from the template row
    pub fn add_row(
        &mut self,
        line: &str,
        schema: &BarcodeSchema,
        dicts: &BarcodeDicts,
    ) -> Result<()> {
        let fields: Vec<&str> = line.split('\t').filter(|f| !f.is_empty()).collect();
        if fields.len() != schema.n_columns {
            bail!(
                "row has {} fields, expected {}: {}",
                fields.len(),
                schema.n_columns,
                line
            );
        }

        let umi = fields[schema.umi_col];
        let ab = dicts.antibody_name(fields[schema.ab_col])?;
        let treatment = match schema.treatment_col {
            Some(col) => dicts.treatment_name(fields[col])?,
            None => "",
        };

        let ci_values: Vec<&str> = schema.ci_cols.iter().map(|&col| fields[col]).collect();
        let cell = dicts.single_cell_id(&ci_values)?;

        self.insert(umi, ab, &cell, treatment);
        Ok(())
    }

    ///////////////////////////////
    /// Intern the four strings and insert the read into the read list
    /// and both bucket maps
    pub fn insert(&mut self, umi: &str, ab: &str, cell: &str, treatment: &str) -> ReadId {
        let record = ReadRecord {
            umi: self.interner.intern(umi),
            ab: self.interner.intern(ab),
            cell: self.interner.intern(cell),
            treatment: self.interner.intern(treatment),
        };
        let id = self.reads.len() as ReadId;
        self.reads.push(record);
        self.by_umi.entry(record.umi).or_default().push(id);
        self.by_ab_cell
            .entry((record.ab, record.cell))
            .or_default()
            .push(id);
        id
    }

    pub fn read(&self, id: ReadId) -> ReadRecord {
        self.reads[id as usize]
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn n_reads(&self) -> usize {
        self.reads.len()
    }

    pub fn n_umis(&self) -> usize {
        self.by_umi.len()
    }

    pub fn n_ab_cells(&self) -> usize {
        self.by_ab_cell.len()
    }

    pub fn umi_keys(&self) -> Vec<Symbol> {
        self.by_umi.keys().copied().collect()
    }

    pub fn ab_cell_keys(&self) -> Vec<(Symbol, Symbol)> {
        self.by_ab_cell.keys().copied().collect()
    }

    pub fn umi_bucket(&self, umi: Symbol) -> &[ReadId] {
        &self.by_umi[&umi]
    }

    pub fn ab_cell_bucket(&self, key: (Symbol, Symbol)) -> &[ReadId] {
        &self.by_ab_cell[&key]
    }
}

impl Default for ReadIndex {
    fn default() -> Self {
        ReadIndex::new()
    }
}
