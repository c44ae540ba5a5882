use kira_semantic_layer::domain::{InteractionEdge, ProteinRecord, SemanticRow, TargetRecord};
use kira_semantic_layer::semantic::{self, CONFIDENCE_THRESHOLD};
use kira_semantic_layer::store::{MemoryStore, SqliteStore, TableStore};

fn protein(accession: &str, string_ref: &str, targets_ref: &str) -> ProteinRecord {
    ProteinRecord {
        primary_accession: accession.to_string(),
        recommended_protein_name: format!("{accession} protein"),
        primary_gene_name: format!("{accession}g"),
        species_common_name: "human".to_string(),
        string_db_reference: string_ref.to_string(),
        opentargets_db_reference: targets_ref.to_string(),
        sequence_length: 100,
        sequence_mass: 11000,
    }
}

fn edge(protein1: &str, protein2: &str, score: u32) -> InteractionEdge {
    InteractionEdge {
        protein1: protein1.to_string(),
        protein2: protein2.to_string(),
        combined_score: score,
    }
}

fn target(id: &str, symbol: &str) -> TargetRecord {
    TargetRecord {
        id: id.to_string(),
        approved_symbol: symbol.to_string(),
        biotype: "protein_coding".to_string(),
    }
}

fn row<'a>(rows: &'a [SemanticRow], accession: &str) -> &'a SemanticRow {
    rows.iter()
        .find(|row| row.primary_accession == accession)
        .unwrap()
}

#[test]
fn joins_confident_partners_and_targets() {
    let rows = semantic::build(
        &[protein("p1", "s1", "o1"), protein("p2", "", "")],
        &[edge("s1", "s2", 900), edge("s1", "s3", 100)],
        &[target("o1", "brca1")],
    );

    assert_eq!(rows.len(), 2);
    let p1 = row(&rows, "p1");
    assert_eq!(p1.associated_proteins, "s2");
    assert_eq!(p1.disease, "brca1");
    assert_eq!(p1.recommended_protein_name, "p1 protein");
    assert_eq!(p1.primary_gene_name, "p1g");
    assert_eq!(p1.species_common_name, "human");

    let p2 = row(&rows, "p2");
    assert_eq!(p2.associated_proteins, "");
    assert_eq!(p2.disease, "");
}

#[test]
fn edges_at_or_below_threshold_never_contribute() {
    let rows = semantic::build(
        &[protein("p1", "s1", "")],
        &[
            edge("s1", "s2", CONFIDENCE_THRESHOLD),
            edge("s1", "s3", 0),
            edge("s1", "s4", CONFIDENCE_THRESHOLD - 1),
        ],
        &[],
    );
    assert_eq!(rows[0].associated_proteins, "");
}

#[test]
fn excluded_partner_still_listed_via_another_qualifying_edge() {
    let rows = semantic::build(
        &[protein("p1", "s1", ""), protein("p9", "s9", "")],
        &[edge("s1", "s2", 100), edge("s9", "s2", 900)],
        &[],
    );
    assert_eq!(row(&rows, "p1").associated_proteins, "");
    assert_eq!(row(&rows, "p9").associated_proteins, "s2");
}

#[test]
fn duplicate_partners_and_symbols_are_listed_once() {
    let rows = semantic::build(
        &[protein("p1", "s1", "o1")],
        &[
            edge("s1", "s2", 900),
            edge("s1", "s3", 400),
            edge("s1", "s2", 500),
        ],
        &[target("o1", "brca1"), target("o1", "brca1"), target("o1", "tp53")],
    );
    assert_eq!(rows[0].associated_proteins, "s2, s3");
    assert_eq!(rows[0].disease, "brca1, tp53");
}

#[test]
fn proteins_with_same_identity_share_one_row() {
    let mut second = protein("p1", "s9", "o2");
    second.sequence_length = 5;
    let rows = semantic::build(
        &[protein("p1", "s1", "o1"), second],
        &[edge("s1", "s2", 900), edge("s9", "s8", 900)],
        &[target("o1", "brca1"), target("o2", "atm")],
    );
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].associated_proteins, "s2, s8");
    assert_eq!(rows[0].disease, "brca1, atm");
}

#[test]
fn empty_references_never_match_empty_keys() {
    let rows = semantic::build(
        &[protein("p1", "", "")],
        &[edge("", "s2", 900)],
        &[target("", "brca1")],
    );
    assert_eq!(rows[0].associated_proteins, "");
    assert_eq!(rows[0].disease, "");
}

#[test]
fn no_proteins_means_no_rows() {
    let rows = semantic::build(&[], &[edge("s1", "s2", 900)], &[target("o1", "brca1")]);
    assert!(rows.is_empty());
}

#[test]
fn refresh_replaces_semantic_layer_in_store() {
    let mut store = MemoryStore::new();
    store
        .write(&[protein("p1", "s1", "o1"), protein("p2", "", "")])
        .unwrap();
    store
        .write(&[edge("s1", "s2", 900), edge("s1", "s3", 100)])
        .unwrap();
    store.write(&[target("o1", "brca1")]).unwrap();

    let report = semantic::refresh(&mut store).unwrap();
    assert_eq!(report.proteins, 2);
    assert_eq!(report.edges, 2);
    assert_eq!(report.targets, 1);
    assert_eq!(report.rows, 2);

    let stored = store.read::<SemanticRow>().unwrap();
    let expected = semantic::build(
        &store.read::<ProteinRecord>().unwrap(),
        &store.read::<InteractionEdge>().unwrap(),
        &store.read::<TargetRecord>().unwrap(),
    );
    assert_eq!(stored, expected);
}

#[test]
fn refresh_is_idempotent_over_unchanged_tables() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.create_tables().unwrap();
    store
        .write(&[protein("p2", "s1", ""), protein("p1", "s1", "o1")])
        .unwrap();
    store
        .write(&[edge("s1", "s3", 300), edge("s1", "s2", 900)])
        .unwrap();
    store.write(&[target("o1", "brca1")]).unwrap();

    semantic::refresh(&mut store).unwrap();
    let first = store.read::<SemanticRow>().unwrap();
    semantic::refresh(&mut store).unwrap();
    let second = store.read::<SemanticRow>().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].primary_accession, "p1");
    assert_eq!(first[0].associated_proteins, "s3, s2");
}

#[test]
fn refresh_over_empty_store_yields_empty_layer() {
    let mut store = MemoryStore::new();
    let report = semantic::refresh(&mut store).unwrap();
    assert_eq!(report.rows, 0);
    assert!(store.has_table("semantic_layer"));
    assert!(store.read::<SemanticRow>().unwrap().is_empty());
}
