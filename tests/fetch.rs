use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_semantic_layer::domain::{SourceKind, SourceLocation, SourceSpec};
use kira_semantic_layer::error::KiraError;
use kira_semantic_layer::fetch::{Fetcher, HttpFetcher};

fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(path).unwrap()
}

#[test]
fn local_path_is_read_directly() {
    let temp = tempfile::tempdir().unwrap();
    let source = utf8(temp.path().join("links.txt"));
    fs::write(&source, b"protein1 protein2 combined_score\n").unwrap();

    let fetcher = HttpFetcher::new(utf8(temp.path().join("cache")), false).unwrap();
    let spec = SourceSpec {
        kind: SourceKind::String,
        location: SourceLocation::Path(source),
    };

    let bytes = fetcher.fetch(&spec).unwrap();
    assert_eq!(bytes, b"protein1 protein2 combined_score\n");
    assert!(!temp.path().join("cache").exists());
}

#[test]
fn missing_local_path_is_filesystem_error() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(utf8(temp.path().join("cache")), false).unwrap();
    let spec = SourceSpec {
        kind: SourceKind::Opentargets,
        location: SourceLocation::Path(utf8(temp.path().join("absent.jsonl"))),
    };

    let err = fetcher.fetch(&spec).unwrap_err();
    assert_matches!(err, KiraError::Filesystem(_));
    assert!(!err.is_fetch_error());
}

#[test]
fn cached_download_is_reused() {
    let temp = tempfile::tempdir().unwrap();
    let fetcher = HttpFetcher::new(utf8(temp.path().join("cache")), false).unwrap();
    // Unroutable host: only the cache can satisfy this request.
    let spec = SourceSpec {
        kind: SourceKind::Uniprot,
        location: SourceLocation::Url("http://127.0.0.1:9/uniprot_sprot.xml.gz".to_string()),
    };

    let cache_path = fetcher.cache_path(&spec);
    assert_eq!(
        cache_path,
        fetcher.cache_dir().join("uniprot").join("uniprot_sprot.xml.gz")
    );
    fs::create_dir_all(cache_path.parent().unwrap()).unwrap();
    fs::write(&cache_path, b"<uniprot/>").unwrap();

    assert_eq!(fetcher.fetch(&spec).unwrap(), b"<uniprot/>");
}
