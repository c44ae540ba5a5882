//! Semantic layer construction.
//!
//! Proteins are left-joined to confident interaction edges on
//! `string_dbReference = protein1` and to targets on
//! `opentargets_dbReference = id`, then grouped by protein identity. Each group
//! renders its distinct partners and target symbols, in first-seen order, as
//! `", "`-joined strings. An empty reference never matches anything.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::domain::{InteractionEdge, ProteinRecord, SemanticRow, TargetRecord};
use crate::error::KiraError;
use crate::store::TableStore;

/// Edges must score strictly above this to count as an association.
pub const CONFIDENCE_THRESHOLD: u32 = 200;

const SEPARATOR: &str = ", ";

type GroupKey<'a> = (&'a str, &'a str, &'a str, &'a str);

#[derive(Default)]
struct DistinctList<'a> {
    seen: HashSet<&'a str>,
    items: Vec<&'a str>,
}

impl<'a> DistinctList<'a> {
    fn push(&mut self, value: &'a str) {
        if !value.is_empty() && self.seen.insert(value) {
            self.items.push(value);
        }
    }

    fn render(&self) -> String {
        self.items.join(SEPARATOR)
    }
}

#[derive(Default)]
struct Aggregate<'a> {
    diseases: DistinctList<'a>,
    partners: DistinctList<'a>,
}

/// Index of non-empty join keys to their matched values, in input order.
fn index_by<'a, T>(
    rows: impl Iterator<Item = &'a T>,
    key: impl Fn(&'a T) -> &'a str,
    value: impl Fn(&'a T) -> &'a str,
) -> HashMap<&'a str, Vec<&'a str>>
where
    T: 'a,
{
    let mut index: HashMap<&str, Vec<&str>> = HashMap::new();
    for row in rows {
        let key = key(row);
        if key.is_empty() {
            continue;
        }
        index.entry(key).or_default().push(value(row));
    }
    index
}

pub fn build(
    proteins: &[ProteinRecord],
    edges: &[InteractionEdge],
    targets: &[TargetRecord],
) -> Vec<SemanticRow> {
    let partners = index_by(
        edges
            .iter()
            .filter(|edge| edge.combined_score > CONFIDENCE_THRESHOLD),
        |edge| edge.protein1.as_str(),
        |edge| edge.protein2.as_str(),
    );
    let symbols = index_by(
        targets.iter(),
        |target| target.id.as_str(),
        |target| target.approved_symbol.as_str(),
    );

    let mut groups: BTreeMap<GroupKey<'_>, Aggregate<'_>> = BTreeMap::new();
    for protein in proteins {
        let key = (
            protein.primary_accession.as_str(),
            protein.recommended_protein_name.as_str(),
            protein.primary_gene_name.as_str(),
            protein.species_common_name.as_str(),
        );
        let aggregate = groups.entry(key).or_default();
        if let Some(matched) = partners.get(protein.string_db_reference.as_str()) {
            for &partner in matched {
                aggregate.partners.push(partner);
            }
        }
        if let Some(matched) = symbols.get(protein.opentargets_db_reference.as_str()) {
            for &symbol in matched {
                aggregate.diseases.push(symbol);
            }
        }
    }

    groups
        .into_iter()
        .map(
            |((accession, name, gene, species), aggregate)| SemanticRow {
                primary_accession: accession.to_string(),
                recommended_protein_name: name.to_string(),
                primary_gene_name: gene.to_string(),
                species_common_name: species.to_string(),
                disease: aggregate.diseases.render(),
                associated_proteins: aggregate.partners.render(),
            },
        )
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayerReport {
    pub proteins: usize,
    pub edges: usize,
    pub targets: usize,
    pub rows: usize,
}

/// Rebuilds `semantic_layer` from the clean tables currently in `store`.
pub fn refresh<S: TableStore>(store: &mut S) -> Result<LayerReport, KiraError> {
    let proteins = store.read::<ProteinRecord>()?;
    let edges = store.read::<InteractionEdge>()?;
    let targets = store.read::<TargetRecord>()?;

    let rows = build(&proteins, &edges, &targets);
    store.write(&rows)?;

    let report = LayerReport {
        proteins: proteins.len(),
        edges: edges.len(),
        targets: targets.len(),
        rows: rows.len(),
    };
    tracing::info!(
        proteins = report.proteins,
        edges = report.edges,
        targets = report.targets,
        rows = report.rows,
        "semantic layer rebuilt"
    );
    Ok(report)
}
