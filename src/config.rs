use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{SourceKind, SourceLocation, SourceSpec};
use crate::error::KiraError;
use crate::normalize::MissingValuePolicy;
use crate::{opentargets, string_db, uniprot};

pub const DEFAULT_CONFIG_FILE: &str = "kira-sl.json";
pub const DEFAULT_DATABASE: &str = "etl_pipeline.db";
pub const DEFAULT_WORK_DIR: &str = ".kira-sl";
pub const DEFAULT_RECORD_LIMIT: usize = 1000;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub work_dir: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub missing_values: Option<MissingValuePolicy>,
    #[serde(default)]
    pub snapshots: Option<bool>,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub uniprot: Option<SourceEntry>,
    #[serde(default)]
    pub string: Option<SourceEntry>,
    #[serde(default)]
    pub opentargets: Option<SourceEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Shorthand(String),
    Detailed(SourceEntryObject),
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SourceEntryObject {
    #[serde(default)]
    pub location: Option<String>,
    /// UniProt only. `0` means no limit.
    #[serde(default)]
    pub record_limit: Option<usize>,
    /// STRING only.
    #[serde(default)]
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniprotSource {
    pub spec: SourceSpec,
    pub record_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSource {
    pub spec: SourceSpec,
    pub delimiter: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetsSource {
    pub spec: SourceSpec,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub database: Utf8PathBuf,
    pub work_dir: Utf8PathBuf,
    pub cache_dir: Option<Utf8PathBuf>,
    pub missing_values: MissingValuePolicy,
    pub snapshots: bool,
    pub uniprot: UniprotSource,
    pub string: StringSource,
    pub opentargets: TargetsSource,
}

impl ResolvedConfig {
    pub fn source_spec(&self, kind: SourceKind) -> &SourceSpec {
        match kind {
            SourceKind::Uniprot => &self.uniprot.spec,
            SourceKind::String => &self.string.spec,
            SourceKind::Opentargets => &self.opentargets.spec,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `kira-sl.json` from the current directory when it
    /// exists. Without either, built-in defaults are used.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KiraError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            tracing::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KiraError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| KiraError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KiraError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let SourcesConfig {
            uniprot,
            string,
            opentargets,
        } = config.sources;

        let uniprot = {
            let entry = SourceEntryObject::from(uniprot);
            let record_limit = match entry.record_limit {
                Some(0) => None,
                Some(limit) => Some(limit),
                None => Some(DEFAULT_RECORD_LIMIT),
            };
            UniprotSource {
                spec: source_spec(SourceKind::Uniprot, entry.location, uniprot::DEFAULT_URL)?,
                record_limit,
            }
        };

        let string = {
            let entry = SourceEntryObject::from(string);
            let delimiter = entry
                .delimiter
                .as_deref()
                .map(string_db::parse_delimiter)
                .transpose()?
                .unwrap_or(string_db::DEFAULT_DELIMITER);
            StringSource {
                spec: source_spec(SourceKind::String, entry.location, string_db::DEFAULT_URL)?,
                delimiter,
            }
        };

        let opentargets = {
            let entry = SourceEntryObject::from(opentargets);
            TargetsSource {
                spec: source_spec(
                    SourceKind::Opentargets,
                    entry.location,
                    opentargets::DEFAULT_URL,
                )?,
            }
        };

        Ok(ResolvedConfig {
            schema_version,
            database: Utf8PathBuf::from(
                config.database.as_deref().unwrap_or(DEFAULT_DATABASE),
            ),
            work_dir: Utf8PathBuf::from(
                config.work_dir.as_deref().unwrap_or(DEFAULT_WORK_DIR),
            ),
            cache_dir: config.cache_dir.map(Utf8PathBuf::from),
            missing_values: config.missing_values.unwrap_or_default(),
            snapshots: config.snapshots.unwrap_or(true),
            uniprot,
            string,
            opentargets,
        })
    }
}

impl From<Option<SourceEntry>> for SourceEntryObject {
    fn from(entry: Option<SourceEntry>) -> Self {
        match entry {
            None => SourceEntryObject::default(),
            Some(SourceEntry::Shorthand(location)) => SourceEntryObject {
                location: Some(location),
                ..SourceEntryObject::default()
            },
            Some(SourceEntry::Detailed(obj)) => obj,
        }
    }
}

fn source_spec(
    kind: SourceKind,
    location: Option<String>,
    default_url: &str,
) -> Result<SourceSpec, KiraError> {
    let location: SourceLocation = location.as_deref().unwrap_or(default_url).parse()?;
    Ok(SourceSpec { kind, location })
}
