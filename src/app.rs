use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::domain::{RawInteraction, RawProtein, RawTarget, SourceKind};
use crate::error::KiraError;
use crate::fetch::Fetcher;
use crate::normalize::{Normalize, NormalizeReport, normalize};
use crate::schema::{ALL_TABLES, Table};
use crate::semantic::{self, LayerReport};
use crate::store::TableStore;
use crate::{fs_util, opentargets, string_db, uniprot};

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub built_at: String,
    pub sources: Vec<SourceResult>,
    pub semantic_layer: LayerReport,
    pub tables: Vec<TableResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    pub source: SourceKind,
    pub location: String,
    pub table: &'static str,
    pub normalize: NormalizeReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableResult {
    pub table: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub built_at: String,
    pub semantic_layer: LayerReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub items: Vec<FetchItemResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub source: SourceKind,
    pub location: String,
    pub bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoResult {
    pub tables: Vec<TableResult>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Forwards progress events to the tracing log.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => tracing::info!(
                elapsed_ms = elapsed.as_millis() as u64,
                "{}",
                event.message
            ),
            None => tracing::info!("{}", event.message),
        }
    }
}

fn phase(sink: &dyn ProgressSink, message: String) {
    sink.event(ProgressEvent {
        message,
        elapsed: None,
    });
}

pub struct App<F: Fetcher> {
    config: ResolvedConfig,
    fetcher: F,
}

impl<F: Fetcher> App<F> {
    pub fn new(config: ResolvedConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Runs the whole pipeline against `store`: fetch and decode the three
    /// sources, normalize them, replace the clean tables, then rebuild the
    /// semantic layer from what was stored.
    pub fn run<S: TableStore>(
        &self,
        store: &mut S,
        sink: &dyn ProgressSink,
    ) -> Result<RunResult, KiraError> {
        let start = Instant::now();

        let proteins = self.load_proteins(sink)?;
        let edges = self.load_edges(sink)?;
        let targets = self.load_targets(sink)?;

        phase(sink, "phase=Store; creating tables".to_string());
        store.create_tables()?;

        let sources = vec![
            self.store_clean(store, SourceKind::Uniprot, proteins, sink)?,
            self.store_clean(store, SourceKind::String, edges, sink)?,
            self.store_clean(store, SourceKind::Opentargets, targets, sink)?,
        ];

        phase(sink, "phase=Build; building semantic layer".to_string());
        let semantic_layer = semantic::refresh(store)?;

        let tables = table_counts(store)?;
        sink.event(ProgressEvent {
            message: "phase=Done; pipeline finished".to_string(),
            elapsed: Some(start.elapsed()),
        });

        Ok(RunResult {
            built_at: chrono::Utc::now().to_rfc3339(),
            sources,
            semantic_layer,
            tables,
        })
    }

    /// Downloads the requested sources (all of them when `only` is `None`)
    /// without decoding or storing anything.
    pub fn fetch(
        &self,
        only: Option<SourceKind>,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, KiraError> {
        let kinds = match only {
            Some(kind) => vec![kind],
            None => SourceKind::ALL.to_vec(),
        };
        let mut items = Vec::new();
        for kind in kinds {
            let spec = self.config.source_spec(kind);
            phase(sink, format!("phase=Fetch; {kind} from {}", spec.location));
            let bytes = self.fetcher.fetch(spec)?;
            items.push(FetchItemResult {
                source: kind,
                location: spec.location.to_string(),
                bytes: bytes.len(),
            });
        }
        Ok(FetchResult { items })
    }

    fn fetch_payload(
        &self,
        kind: SourceKind,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<u8>, KiraError> {
        let spec = self.config.source_spec(kind);
        phase(sink, format!("phase=Fetch; {kind} from {}", spec.location));
        let bytes = self.fetcher.fetch(spec)?;
        fs_util::decompress(bytes)
    }

    fn load_proteins(&self, sink: &dyn ProgressSink) -> Result<Vec<RawProtein>, KiraError> {
        let payload = self.fetch_payload(SourceKind::Uniprot, sink)?;
        phase(sink, "phase=Decode; UniProt XML".to_string());
        let records = uniprot::decode_entries(&payload, self.config.uniprot.record_limit)?;
        self.snapshot(SourceKind::Uniprot, &records)?;
        Ok(records)
    }

    fn load_edges(&self, sink: &dyn ProgressSink) -> Result<Vec<RawInteraction>, KiraError> {
        let payload = self.fetch_payload(SourceKind::String, sink)?;
        phase(sink, "phase=Decode; STRING links".to_string());
        let records = string_db::decode_links(&payload, self.config.string.delimiter)?;
        self.snapshot(SourceKind::String, &records)?;
        Ok(records)
    }

    fn load_targets(&self, sink: &dyn ProgressSink) -> Result<Vec<RawTarget>, KiraError> {
        let payload = self.fetch_payload(SourceKind::Opentargets, sink)?;
        phase(sink, "phase=Decode; OpenTargets targets".to_string());
        let records = opentargets::decode_targets(&payload)?;
        self.snapshot(SourceKind::Opentargets, &records)?;
        Ok(records)
    }

    fn snapshot<T: Serialize>(&self, kind: SourceKind, records: &[T]) -> Result<(), KiraError> {
        if !self.config.snapshots {
            return Ok(());
        }
        let path = self.config.work_dir.join(kind.snapshot_file());
        fs_util::write_csv_atomic(&path, records)?;
        tracing::debug!(%kind, %path, rows = records.len(), "raw snapshot written");
        Ok(())
    }

    fn store_clean<S, R>(
        &self,
        store: &mut S,
        kind: SourceKind,
        records: Vec<R>,
        sink: &dyn ProgressSink,
    ) -> Result<SourceResult, KiraError>
    where
        S: TableStore,
        R: Normalize,
        R::Clean: Table,
    {
        let normalized = normalize(records, self.config.missing_values);
        let report = normalized.report;
        tracing::info!(
            %kind,
            input = report.input,
            dropped_incomplete = report.dropped_incomplete,
            duplicates = report.duplicates,
            output = report.output,
            "{kind} cleaned and normalized"
        );

        let table = R::Clean::SCHEMA.name;
        phase(sink, format!("phase=Store; writing {table}"));
        store.write(&normalized.rows)?;

        Ok(SourceResult {
            source: kind,
            location: self.config.source_spec(kind).location.to_string(),
            table,
            normalize: report,
        })
    }
}

/// Rebuilds only the semantic layer from the tables already in `store`.
pub fn build<S: TableStore>(
    store: &mut S,
    sink: &dyn ProgressSink,
) -> Result<BuildResult, KiraError> {
    phase(sink, "phase=Build; building semantic layer".to_string());
    store.create_tables()?;
    let semantic_layer = semantic::refresh(store)?;
    Ok(BuildResult {
        built_at: chrono::Utc::now().to_rfc3339(),
        semantic_layer,
    })
}

pub fn table_counts<S: TableStore>(store: &S) -> Result<Vec<TableResult>, KiraError> {
    ALL_TABLES
        .iter()
        .map(|schema| {
            Ok(TableResult {
                table: schema.name,
                rows: store.row_count(schema)?,
            })
        })
        .collect()
}

pub fn info<S: TableStore>(store: &S) -> Result<InfoResult, KiraError> {
    Ok(InfoResult {
        tables: table_counts(store)?,
    })
}

