//! Typed table definitions for everything the pipeline persists.
//!
//! Each stored record type declares its table name and ordered columns, and
//! converts itself to and from a row of [`Cell`]s. Stores only ever see cells.

use crate::domain::{InteractionEdge, ProteinRecord, SemanticRow, TargetRecord};
use crate::error::KiraError;

pub const CLEAN_UNIPROT: &str = "clean_uniprot";
pub const CLEAN_STRING: &str = "clean_string";
pub const CLEAN_TARGETS: &str = "clean_targets";
pub const SEMANTIC_LAYER: &str = "semantic_layer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
}

impl ColumnKind {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnKind::Text => "TEXT",
            ColumnKind::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Text,
    }
}

const fn integer(name: &'static str) -> Column {
    Column {
        name,
        kind: ColumnKind::Integer,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Integer(i64),
}

pub trait Table: Sized {
    const SCHEMA: TableSchema;

    fn to_cells(&self) -> Vec<Cell>;

    fn from_cells(cells: Vec<Cell>) -> Result<Self, KiraError>;
}

/// Every table the pipeline owns, in write order.
pub const ALL_TABLES: [TableSchema; 4] = [
    ProteinRecord::SCHEMA,
    InteractionEdge::SCHEMA,
    TargetRecord::SCHEMA,
    SemanticRow::SCHEMA,
];

/// Pulls typed values out of a row in column order.
struct CellReader {
    table: &'static str,
    columns: &'static [Column],
    cells: std::vec::IntoIter<Cell>,
    position: usize,
}

impl CellReader {
    fn new(schema: TableSchema, cells: Vec<Cell>) -> Result<Self, KiraError> {
        if cells.len() != schema.columns.len() {
            return Err(KiraError::InvalidRow {
                table: schema.name,
                message: format!(
                    "expected {} columns, found {}",
                    schema.columns.len(),
                    cells.len()
                ),
            });
        }
        Ok(Self {
            table: schema.name,
            columns: schema.columns,
            cells: cells.into_iter(),
            position: 0,
        })
    }

    fn next(&mut self) -> (Option<Cell>, &'static str) {
        let column = self.columns[self.position].name;
        self.position += 1;
        (self.cells.next(), column)
    }

    fn text(&mut self) -> Result<String, KiraError> {
        match self.next() {
            (Some(Cell::Text(value)), _) => Ok(value),
            (other, column) => Err(self.mismatch(column, "text", other)),
        }
    }

    fn unsigned<T: TryFrom<i64>>(&mut self) -> Result<T, KiraError> {
        match self.next() {
            (Some(Cell::Integer(value)), column) => T::try_from(value).map_err(|_| {
                KiraError::InvalidRow {
                    table: self.table,
                    message: format!("column {column} out of range: {value}"),
                }
            }),
            (other, column) => Err(self.mismatch(column, "integer", other)),
        }
    }

    fn mismatch(&self, column: &str, expected: &str, found: Option<Cell>) -> KiraError {
        KiraError::InvalidRow {
            table: self.table,
            message: format!("column {column} expected {expected}, found {found:?}"),
        }
    }
}

impl Table for ProteinRecord {
    const SCHEMA: TableSchema = TableSchema {
        name: CLEAN_UNIPROT,
        columns: &[
            text("primary_accession"),
            text("recommended_protein_name"),
            text("primary_gene_name"),
            text("species_common_name"),
            text("string_dbReference"),
            text("opentargets_dbReference"),
            integer("sequence_length"),
            integer("sequence_mass"),
        ],
    };

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.primary_accession.clone()),
            Cell::Text(self.recommended_protein_name.clone()),
            Cell::Text(self.primary_gene_name.clone()),
            Cell::Text(self.species_common_name.clone()),
            Cell::Text(self.string_db_reference.clone()),
            Cell::Text(self.opentargets_db_reference.clone()),
            Cell::Integer(clamp_i64(self.sequence_length)),
            Cell::Integer(clamp_i64(self.sequence_mass)),
        ]
    }

    fn from_cells(cells: Vec<Cell>) -> Result<Self, KiraError> {
        let mut row = CellReader::new(Self::SCHEMA, cells)?;
        Ok(Self {
            primary_accession: row.text()?,
            recommended_protein_name: row.text()?,
            primary_gene_name: row.text()?,
            species_common_name: row.text()?,
            string_db_reference: row.text()?,
            opentargets_db_reference: row.text()?,
            sequence_length: row.unsigned()?,
            sequence_mass: row.unsigned()?,
        })
    }
}

impl Table for InteractionEdge {
    const SCHEMA: TableSchema = TableSchema {
        name: CLEAN_STRING,
        columns: &[
            text("protein1"),
            text("protein2"),
            integer("combined_score"),
        ],
    };

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.protein1.clone()),
            Cell::Text(self.protein2.clone()),
            Cell::Integer(i64::from(self.combined_score)),
        ]
    }

    fn from_cells(cells: Vec<Cell>) -> Result<Self, KiraError> {
        let mut row = CellReader::new(Self::SCHEMA, cells)?;
        Ok(Self {
            protein1: row.text()?,
            protein2: row.text()?,
            combined_score: row.unsigned()?,
        })
    }
}

impl Table for TargetRecord {
    const SCHEMA: TableSchema = TableSchema {
        name: CLEAN_TARGETS,
        columns: &[text("id"), text("approvedSymbol"), text("biotype")],
    };

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.id.clone()),
            Cell::Text(self.approved_symbol.clone()),
            Cell::Text(self.biotype.clone()),
        ]
    }

    fn from_cells(cells: Vec<Cell>) -> Result<Self, KiraError> {
        let mut row = CellReader::new(Self::SCHEMA, cells)?;
        Ok(Self {
            id: row.text()?,
            approved_symbol: row.text()?,
            biotype: row.text()?,
        })
    }
}

impl Table for SemanticRow {
    const SCHEMA: TableSchema = TableSchema {
        name: SEMANTIC_LAYER,
        columns: &[
            text("primary_accession"),
            text("recommended_protein_name"),
            text("primary_gene_name"),
            text("species_common_name"),
            text("disease"),
            text("associated_proteins"),
        ],
    };

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.primary_accession.clone()),
            Cell::Text(self.recommended_protein_name.clone()),
            Cell::Text(self.primary_gene_name.clone()),
            Cell::Text(self.species_common_name.clone()),
            Cell::Text(self.disease.clone()),
            Cell::Text(self.associated_proteins.clone()),
        ]
    }

    fn from_cells(cells: Vec<Cell>) -> Result<Self, KiraError> {
        let mut row = CellReader::new(Self::SCHEMA, cells)?;
        Ok(Self {
            primary_accession: row.text()?,
            recommended_protein_name: row.text()?,
            primary_gene_name: row.text()?,
            species_common_name: row.text()?,
            disease: row.text()?,
            associated_proteins: row.text()?,
        })
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
