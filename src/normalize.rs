use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::domain::{
    InteractionEdge, ProteinRecord, RawInteraction, RawProtein, RawTarget, TargetRecord,
};

/// What to do with a record that has a missing field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// Drop the whole record.
    #[default]
    Drop,
    /// Fill missing text with `""` and missing numbers with `0`.
    Impute,
}

impl MissingValuePolicy {
    fn text(&self, value: Option<String>) -> Option<String> {
        match (value, self) {
            (Some(value), _) => Some(canonical(&value)),
            (None, MissingValuePolicy::Drop) => None,
            (None, MissingValuePolicy::Impute) => Some(String::new()),
        }
    }

    fn number<T: Default>(&self, value: Option<T>) -> Option<T> {
        match (value, self) {
            (Some(value), _) => Some(value),
            (None, MissingValuePolicy::Drop) => None,
            (None, MissingValuePolicy::Impute) => Some(T::default()),
        }
    }
}

/// Trimmed, lowercased form of a text field.
pub fn canonical(value: &str) -> String {
    value.trim().to_lowercase()
}

/// A raw record that can be turned into its clean counterpart.
pub trait Normalize {
    type Clean: Clone + Eq + Hash;

    /// Returns `None` when the policy rejects the record.
    fn normalize(self, policy: MissingValuePolicy) -> Option<Self::Clean>;
}

impl Normalize for RawProtein {
    type Clean = ProteinRecord;

    fn normalize(self, policy: MissingValuePolicy) -> Option<ProteinRecord> {
        Some(ProteinRecord {
            primary_accession: policy.text(self.primary_accession)?,
            recommended_protein_name: policy.text(self.recommended_protein_name)?,
            primary_gene_name: policy.text(self.primary_gene_name)?,
            species_common_name: policy.text(self.species_common_name)?,
            string_db_reference: policy.text(self.string_db_reference)?,
            opentargets_db_reference: policy.text(self.opentargets_db_reference)?,
            sequence_length: policy.number(self.sequence_length)?,
            sequence_mass: policy.number(self.sequence_mass)?,
        })
    }
}

impl Normalize for RawInteraction {
    type Clean = InteractionEdge;

    fn normalize(self, policy: MissingValuePolicy) -> Option<InteractionEdge> {
        Some(InteractionEdge {
            protein1: policy.text(self.protein1)?,
            protein2: policy.text(self.protein2)?,
            combined_score: policy.number(self.combined_score)?,
        })
    }
}

impl Normalize for RawTarget {
    type Clean = TargetRecord;

    fn normalize(self, policy: MissingValuePolicy) -> Option<TargetRecord> {
        Some(TargetRecord {
            id: policy.text(self.id)?,
            approved_symbol: policy.text(self.approved_symbol)?,
            biotype: policy.text(self.biotype)?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub input: usize,
    pub dropped_incomplete: usize,
    pub duplicates: usize,
    pub output: usize,
}

#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub rows: Vec<T>,
    pub report: NormalizeReport,
}

/// Cleans a record set: drops incomplete rows per `policy`, canonicalizes text,
/// and collapses rows that are equal after canonicalization. First-seen order
/// is kept.
pub fn normalize<R: Normalize>(
    records: Vec<R>,
    policy: MissingValuePolicy,
) -> Normalized<R::Clean> {
    let mut report = NormalizeReport {
        input: records.len(),
        ..NormalizeReport::default()
    };
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for record in records {
        let Some(clean) = record.normalize(policy) else {
            report.dropped_incomplete += 1;
            continue;
        };
        if seen.insert(clean.clone()) {
            rows.push(clean);
        } else {
            report.duplicates += 1;
        }
    }

    report.output = rows.len();
    Normalized { rows, report }
}
