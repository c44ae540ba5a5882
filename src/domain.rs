use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::KiraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Uniprot,
    String,
    Opentargets,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [
        SourceKind::Uniprot,
        SourceKind::String,
        SourceKind::Opentargets,
    ];

    /// File name used for the raw CSV snapshot of this source.
    pub fn snapshot_file(&self) -> &'static str {
        match self {
            SourceKind::Uniprot => "uniprot_data.csv",
            SourceKind::String => "string_data.csv",
            SourceKind::Opentargets => "targets_data.csv",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Uniprot => write!(f, "UniProt"),
            SourceKind::String => write!(f, "STRING"),
            SourceKind::Opentargets => write!(f, "OpenTargets"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "uniprot" => Ok(SourceKind::Uniprot),
            "string" => Ok(SourceKind::String),
            "opentargets" | "targets" => Ok(SourceKind::Opentargets),
            _ => Err(KiraError::InvalidSource(value.to_string())),
        }
    }
}

/// Where a source's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    Path(camino::Utf8PathBuf),
}

impl SourceLocation {
    /// Last path segment, used to name cached downloads.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            SourceLocation::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().filter(|name| !name.is_empty())
            }
            SourceLocation::Path(path) => path.file_name(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(url) => write!(f, "{url}"),
            SourceLocation::Path(path) => write!(f, "{path}"),
        }
    }
}

impl FromStr for SourceLocation {
    type Err = KiraError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(KiraError::InvalidSource(value.to_string()));
        }
        if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
            return Ok(SourceLocation::Url(trimmed.to_string()));
        }
        if trimmed.contains("://") {
            return Err(KiraError::InvalidSource(value.to_string()));
        }
        Ok(SourceLocation::Path(camino::Utf8PathBuf::from(trimmed)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub kind: SourceKind,
    pub location: SourceLocation,
}

/// A UniProt entry as decoded, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawProtein {
    pub primary_accession: Option<String>,
    pub recommended_protein_name: Option<String>,
    pub primary_gene_name: Option<String>,
    pub species_common_name: Option<String>,
    #[serde(rename = "string_dbReference")]
    pub string_db_reference: Option<String>,
    #[serde(rename = "opentargets_dbReference")]
    pub opentargets_db_reference: Option<String>,
    pub sequence_length: Option<u64>,
    pub sequence_mass: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInteraction {
    pub protein1: Option<String>,
    pub protein2: Option<String>,
    pub combined_score: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTarget {
    pub id: Option<String>,
    #[serde(rename = "approvedSymbol")]
    pub approved_symbol: Option<String>,
    pub biotype: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProteinRecord {
    pub primary_accession: String,
    pub recommended_protein_name: String,
    pub primary_gene_name: String,
    pub species_common_name: String,
    #[serde(rename = "string_dbReference")]
    pub string_db_reference: String,
    #[serde(rename = "opentargets_dbReference")]
    pub opentargets_db_reference: String,
    pub sequence_length: u64,
    pub sequence_mass: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InteractionEdge {
    pub protein1: String,
    pub protein2: String,
    pub combined_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TargetRecord {
    pub id: String,
    #[serde(rename = "approvedSymbol")]
    pub approved_symbol: String,
    pub biotype: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SemanticRow {
    pub primary_accession: String,
    pub recommended_protein_name: String,
    pub primary_gene_name: String,
    pub species_common_name: String,
    pub disease: String,
    pub associated_proteins: String,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_source_kind() {
        assert_eq!("UniProt".parse::<SourceKind>().unwrap(), SourceKind::Uniprot);
        assert_eq!("targets".parse::<SourceKind>().unwrap(), SourceKind::Opentargets);
        let err = "pdb".parse::<SourceKind>().unwrap_err();
        assert_matches!(err, KiraError::InvalidSource(_));
    }

    #[test]
    fn parse_source_location() {
        let url: SourceLocation = "https://example.org/data/links.txt.gz?x=1".parse().unwrap();
        assert_eq!(url.file_name(), Some("links.txt.gz"));

        let path: SourceLocation = "data/targets.jsonl".parse().unwrap();
        assert_matches!(path, SourceLocation::Path(_));
        assert_eq!(path.file_name(), Some("targets.jsonl"));

        let err = "ftp://example.org/file".parse::<SourceLocation>().unwrap_err();
        assert_matches!(err, KiraError::InvalidSource(_));
    }
}
