use bytes::Bytes;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::Field;
use parquet::schema::types::Type;

use crate::domain::RawTarget;
use crate::error::KiraError;

/// OpenTargets platform 24.09 target index, parquet export.
pub const DEFAULT_URL: &str = "https://ftp.ebi.ac.uk/pub/databases/opentargets/platform/24.09/output/etl/parquet/targets/part-00000-b2a23987-7e43-4651-a89c-1eb34ec9f9f5-c000.snappy.parquet";

const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

const COLUMNS: [&str; 3] = ["id", "approvedSymbol", "biotype"];

pub fn is_parquet(content: &[u8]) -> bool {
    content.starts_with(PARQUET_MAGIC)
}

/// Decodes target records from a parquet file, a JSON-lines file or a single
/// JSON array, picked by content. Only `id`, `approvedSymbol` and `biotype`
/// are read; absent columns or keys and nulls decode as missing.
pub fn decode_targets(content: &[u8]) -> Result<Vec<RawTarget>, KiraError> {
    if is_parquet(content) {
        decode_parquet(content)
    } else {
        decode_json(content)
    }
}

fn decode_parquet(content: &[u8]) -> Result<Vec<RawTarget>, KiraError> {
    let reader = SerializedFileReader::new(Bytes::copy_from_slice(content))
        .map_err(|err| KiraError::TargetsParquet(err.to_string()))?;

    let file_schema = reader.metadata().file_metadata().schema();
    let fields = file_schema
        .get_fields()
        .iter()
        .filter(|field| COLUMNS.contains(&field.name()))
        .cloned()
        .collect::<Vec<_>>();
    if fields.is_empty() {
        return Err(KiraError::TargetsParquet(format!(
            "none of the columns {COLUMNS:?} present"
        )));
    }
    let projection = Type::group_type_builder(file_schema.name())
        .with_fields(fields)
        .build()
        .map_err(|err| KiraError::TargetsParquet(err.to_string()))?;

    let rows = reader
        .get_row_iter(Some(projection))
        .map_err(|err| KiraError::TargetsParquet(err.to_string()))?;

    let mut targets = Vec::new();
    for (idx, row) in rows.enumerate() {
        let row =
            row.map_err(|err| KiraError::TargetsParquet(format!("row {}: {err}", idx + 1)))?;
        let mut target = RawTarget::default();
        for (name, field) in row.get_column_iter() {
            let value = text_value(name, field)?;
            match name.as_str() {
                "id" => target.id = value,
                "approvedSymbol" => target.approved_symbol = value,
                "biotype" => target.biotype = value,
                _ => {}
            }
        }
        targets.push(target);
    }
    Ok(targets)
}

fn text_value(column: &str, field: &Field) -> Result<Option<String>, KiraError> {
    match field {
        Field::Null => Ok(None),
        Field::Str(value) => Ok(Some(value.clone())),
        Field::Bytes(value) => std::str::from_utf8(value.data())
            .map(|value| Some(value.to_string()))
            .map_err(|err| KiraError::TargetsParquet(format!("column {column}: {err}"))),
        other => Err(KiraError::TargetsParquet(format!(
            "column {column} is not text: {other}"
        ))),
    }
}

fn decode_json(content: &[u8]) -> Result<Vec<RawTarget>, KiraError> {
    let text = std::str::from_utf8(content)
        .map_err(|err| KiraError::TargetsJson(format!("not UTF-8: {err}")))?;

    if text.trim_start().starts_with('[') {
        return serde_json::from_str::<Vec<RawTarget>>(text)
            .map_err(|err| KiraError::TargetsJson(err.to_string()));
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<RawTarget>(line)
                .map_err(|err| KiraError::TargetsJson(format!("line {}: {err}", idx + 1)))
        })
        .collect()
}
