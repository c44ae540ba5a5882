use std::collections::HashMap;

use camino::Utf8Path;
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{Connection, ToSql, params_from_iter};

use crate::error::{KiraError, db_err};
use crate::schema::{ALL_TABLES, Cell, Table, TableSchema};

/// Relational sink for the pipeline's tables.
///
/// `write` replaces the whole table, column layout included; it never
/// appends. `read` of a table that was never written returns no rows.
pub trait TableStore {
    fn ensure_table(&mut self, schema: &TableSchema) -> Result<(), KiraError>;

    fn write<T: Table>(&mut self, rows: &[T]) -> Result<(), KiraError>;

    fn read<T: Table>(&self) -> Result<Vec<T>, KiraError>;

    fn row_count(&self, schema: &TableSchema) -> Result<usize, KiraError>;

    fn create_tables(&mut self) -> Result<(), KiraError> {
        for schema in &ALL_TABLES {
            self.ensure_table(schema)?;
        }
        Ok(())
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Utf8Path) -> Result<Self, KiraError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        }
        let conn = Connection::open(path.as_std_path()).map_err(db_err)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, KiraError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Ok(Self { conn })
    }

    pub fn table_names(&self) -> Result<Vec<String>, KiraError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(db_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(names)
    }

    fn create_sql(schema: &TableSchema) -> String {
        let columns = schema
            .columns
            .iter()
            .map(|column| format!("\"{}\" {}", column.name, column.kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE IF NOT EXISTS \"{}\" ({columns})", schema.name)
    }

    fn column_list(schema: &TableSchema) -> String {
        schema
            .columns
            .iter()
            .map(|column| format!("\"{}\"", column.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TableStore for SqliteStore {
    fn ensure_table(&mut self, schema: &TableSchema) -> Result<(), KiraError> {
        self.conn
            .execute(&Self::create_sql(schema), [])
            .map_err(db_err)?;
        Ok(())
    }

    fn write<T: Table>(&mut self, rows: &[T]) -> Result<(), KiraError> {
        let schema = T::SCHEMA;
        let placeholders = (1..=schema.columns.len())
            .map(|idx| format!("?{idx}"))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({placeholders})",
            schema.name,
            Self::column_list(&schema)
        );

        // Drop first so a table left by an older layout gets the current columns.
        let tx = self.conn.transaction().map_err(db_err)?;
        tx.execute(&format!("DROP TABLE IF EXISTS \"{}\"", schema.name), [])
            .map_err(db_err)?;
        tx.execute(&Self::create_sql(&schema), []).map_err(db_err)?;
        {
            let mut stmt = tx.prepare(&insert).map_err(db_err)?;
            for row in rows {
                let cells = row.to_cells();
                stmt.execute(params_from_iter(cells.iter()))
                    .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;
        tracing::debug!(table = schema.name, rows = rows.len(), "table replaced");
        Ok(())
    }

    fn read<T: Table>(&self) -> Result<Vec<T>, KiraError> {
        let schema = T::SCHEMA;
        self.conn
            .execute(&Self::create_sql(&schema), [])
            .map_err(db_err)?;
        let query = format!(
            "SELECT {} FROM \"{}\"",
            Self::column_list(&schema),
            schema.name
        );
        let mut stmt = self.conn.prepare(&query).map_err(db_err)?;
        let width = schema.columns.len();
        let raw_rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|idx| row.get::<_, Value>(idx))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })
            .map_err(db_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err)?;

        raw_rows
            .into_iter()
            .map(|values| {
                let cells = values
                    .into_iter()
                    .map(|value| cell_from_value(schema.name, value))
                    .collect::<Result<Vec<_>, _>>()?;
                T::from_cells(cells)
            })
            .collect()
    }

    fn row_count(&self, schema: &TableSchema) -> Result<usize, KiraError> {
        self.conn
            .execute(&Self::create_sql(schema), [])
            .map_err(db_err)?;
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM \"{}\"", schema.name),
                [],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Cell::Text(value) => value.to_sql(),
            Cell::Integer(value) => value.to_sql(),
        }
    }
}

fn cell_from_value(table: &'static str, value: Value) -> Result<Cell, KiraError> {
    match value {
        Value::Text(text) => Ok(Cell::Text(text)),
        Value::Integer(number) => Ok(Cell::Integer(number)),
        Value::Real(number) if number.fract() == 0.0 => Ok(Cell::Integer(number as i64)),
        other => Err(KiraError::InvalidRow {
            table,
            message: format!("unsupported stored value {other:?}"),
        }),
    }
}

/// In-process store keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: HashMap<&'static str, Vec<Vec<Cell>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

impl TableStore for MemoryStore {
    fn ensure_table(&mut self, schema: &TableSchema) -> Result<(), KiraError> {
        self.tables.entry(schema.name).or_default();
        Ok(())
    }

    fn write<T: Table>(&mut self, rows: &[T]) -> Result<(), KiraError> {
        let cells = rows.iter().map(T::to_cells).collect();
        self.tables.insert(T::SCHEMA.name, cells);
        Ok(())
    }

    fn read<T: Table>(&self) -> Result<Vec<T>, KiraError> {
        self.tables
            .get(T::SCHEMA.name)
            .map(|rows| rows.iter().cloned().map(T::from_cells).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    fn row_count(&self, schema: &TableSchema) -> Result<usize, KiraError> {
        Ok(self.tables.get(schema.name).map(Vec::len).unwrap_or(0))
    }
}
