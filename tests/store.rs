use camino::Utf8PathBuf;

use kira_semantic_layer::domain::{InteractionEdge, ProteinRecord, SemanticRow, TargetRecord};
use kira_semantic_layer::schema::{ALL_TABLES, CLEAN_STRING, CLEAN_TARGETS, Table};
use kira_semantic_layer::store::{MemoryStore, SqliteStore, TableStore};

fn edges() -> Vec<InteractionEdge> {
    vec![
        InteractionEdge {
            protein1: "s1".to_string(),
            protein2: "s2".to_string(),
            combined_score: 900,
        },
        InteractionEdge {
            protein1: "s1".to_string(),
            protein2: "s3".to_string(),
            combined_score: 150,
        },
    ]
}

fn protein() -> ProteinRecord {
    ProteinRecord {
        primary_accession: "p38398".to_string(),
        recommended_protein_name: "breast cancer type 1 susceptibility protein".to_string(),
        primary_gene_name: "brca1".to_string(),
        species_common_name: "human".to_string(),
        string_db_reference: "9606.ensp00000350283".to_string(),
        opentargets_db_reference: "ensg00000012048".to_string(),
        sequence_length: 1863,
        sequence_mass: 207721,
    }
}

#[test]
fn sqlite_write_then_read_returns_rows() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.write(&edges()).unwrap();
    store.write(&[protein()]).unwrap();

    assert_eq!(store.read::<InteractionEdge>().unwrap(), edges());
    assert_eq!(store.read::<ProteinRecord>().unwrap(), vec![protein()]);
    assert_eq!(store.row_count(&InteractionEdge::SCHEMA).unwrap(), 2);
}

#[test]
fn sqlite_second_write_replaces_contents() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.write(&edges()).unwrap();
    let replacement = vec![InteractionEdge {
        protein1: "s9".to_string(),
        protein2: "s8".to_string(),
        combined_score: 700,
    }];
    store.write(&replacement).unwrap();

    assert_eq!(store.read::<InteractionEdge>().unwrap(), replacement);

    store.write::<InteractionEdge>(&[]).unwrap();
    assert!(store.read::<InteractionEdge>().unwrap().is_empty());
}

#[test]
fn sqlite_absent_table_reads_empty() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert!(store.read::<TargetRecord>().unwrap().is_empty());
    assert_eq!(store.row_count(&SemanticRow::SCHEMA).unwrap(), 0);
}

#[test]
fn sqlite_create_tables_creates_all_four() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.create_tables().unwrap();
    store.create_tables().unwrap();

    let names = store.table_names().unwrap();
    for schema in &ALL_TABLES {
        assert!(names.iter().any(|name| name == schema.name), "{}", schema.name);
    }
    assert_eq!(ProteinRecord::SCHEMA.name, "clean_uniprot");
}

#[test]
fn sqlite_file_database_persists_between_opens() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("nested").join("etl.db")).unwrap();

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store
            .write(&[SemanticRow {
                primary_accession: "p1".to_string(),
                recommended_protein_name: "name".to_string(),
                primary_gene_name: "gene".to_string(),
                species_common_name: "human".to_string(),
                disease: "brca1".to_string(),
                associated_proteins: "s2, s3".to_string(),
            }])
            .unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let rows = store.read::<SemanticRow>().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].associated_proteins, "s2, s3");
}

#[test]
fn memory_store_replaces_and_counts() {
    let mut store = MemoryStore::new();
    assert!(!store.has_table(CLEAN_STRING));
    assert!(store.read::<InteractionEdge>().unwrap().is_empty());

    store.write(&edges()).unwrap();
    store.write(&edges()[..1]).unwrap();
    assert_eq!(store.row_count(&InteractionEdge::SCHEMA).unwrap(), 1);
    assert_eq!(store.read::<InteractionEdge>().unwrap(), edges()[..1].to_vec());

    store.create_tables().unwrap();
    assert!(store.has_table(CLEAN_TARGETS));
    assert_eq!(store.row_count(&TargetRecord::SCHEMA).unwrap(), 0);
}

#[test]
fn sqlite_write_replaces_a_legacy_table_layout() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("etl_pipeline.db")).unwrap();
    {
        let conn = rusqlite::Connection::open(path.as_std_path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE clean_uniprot (
                primary_accession TEXT, recommended_protein_name TEXT,
                primary_gene_name TEXT, species_common_name TEXT,
                string_dbReference TEXT, opentargets_dbReference TEXT,
                sequence_length TEXT, sequence_mass TEXT
            );
            INSERT INTO clean_uniprot VALUES ('p0', 'old', 'g', 'human', '', '', '10', '');
            CREATE TABLE clean_string (protein1 TEXT, protein2 TEXT);
            INSERT INTO clean_string VALUES ('s1', 's2');",
        )
        .unwrap();
    }

    let mut store = SqliteStore::open(&path).unwrap();
    store.write(&[protein()]).unwrap();
    store.write(&edges()).unwrap();

    assert_eq!(store.read::<ProteinRecord>().unwrap(), vec![protein()]);
    assert_eq!(store.read::<InteractionEdge>().unwrap(), edges());
}
