use crate::domain::RawInteraction;
use crate::error::KiraError;

/// Human protein links from STRING v12. Space-delimited, gzip-compressed.
pub const DEFAULT_URL: &str =
    "https://stringdb-downloads.org/download/protein.links.v12.0/9606.protein.links.v12.0.txt.gz";

pub const DEFAULT_DELIMITER: u8 = b' ';

/// Decodes a delimited links table with a header row. Only `protein1`,
/// `protein2` and `combined_score` are kept; empty fields decode as missing.
pub fn decode_links(content: &[u8], delimiter: u8) -> Result<Vec<RawInteraction>, KiraError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|err| KiraError::StringTsv(err.to_string()))?
        .clone();
    for required in ["protein1", "protein2", "combined_score"] {
        if !headers.iter().any(|header| header == required) {
            return Err(KiraError::StringTsv(format!(
                "missing column {required} in header {:?}",
                headers.iter().collect::<Vec<_>>()
            )));
        }
    }

    let mut links = Vec::new();
    for (idx, record) in reader.deserialize::<RawInteraction>().enumerate() {
        let link = record
            .map_err(|err| KiraError::StringTsv(format!("row {}: {err}", idx + 1)))?;
        links.push(link);
    }
    Ok(links)
}

pub fn parse_delimiter(value: &str) -> Result<u8, KiraError> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        "space" => Ok(b' '),
        _ => {
            let bytes = value.as_bytes();
            if bytes.len() == 1 && bytes[0].is_ascii() {
                Ok(bytes[0])
            } else {
                Err(KiraError::InvalidDelimiter(value.to_string()))
            }
        }
    }
}
