use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use fabric_scout::domain::{Article, ArticleInfo};
use fabric_scout::error::ScoutError;
use fabric_scout::material::Composition;
use fabric_scout::store::{SnapshotFile, Store};

fn snapshot_in(temp: &tempfile::TempDir) -> SnapshotFile {
    SnapshotFile::new(Utf8PathBuf::from_path_buf(temp.path().join("store.json")).unwrap())
}

#[test]
fn snapshot_survives_reload() {
    let temp = tempfile::tempdir().unwrap();
    let snapshot = snapshot_in(&temp);

    let mut enriched = Article::new("Acme", "Oxford", "https://shop.example/a.html", "cache/images/a.jpg");
    enriched.info = Some(ArticleInfo::new(
        Composition::parse("58% Cotton, 42% Polyester"),
        "",
    ));
    let plain = Article::new("Loom", "Tee", "https://shop.example/b.html", "https://img.example/b.jpg");
    let store = Store::from_articles([enriched, plain]);

    snapshot.save(&store).unwrap();
    let loaded = snapshot.load().unwrap();

    assert_eq!(loaded, store);
    let names: Vec<_> = loaded.articles[0]
        .info
        .as_ref()
        .unwrap()
        .material
        .names()
        .collect();
    assert_eq!(names, vec!["Cotton", "Polyester"]);
    assert!(loaded.articles[1].info.is_none());
}

#[test]
fn saving_twice_is_byte_stable() {
    let temp = tempfile::tempdir().unwrap();
    let snapshot = snapshot_in(&temp);
    let store = Store::from_articles([Article::new("Acme", "A", "https://a", "https://m")]);

    snapshot.save(&store).unwrap();
    let first = std::fs::read(snapshot.path().as_std_path()).unwrap();
    snapshot.save(&snapshot.load().unwrap()).unwrap();
    let second = std::fs::read(snapshot.path().as_std_path()).unwrap();

    assert_eq!(first, second);
    let text = String::from_utf8(first).unwrap();
    assert!(text.starts_with("{\n  \"kind\": \"store\",\n  \"items\": ["));
}

#[test]
fn corrupt_snapshot_is_reported() {
    let temp = tempfile::tempdir().unwrap();
    let snapshot = snapshot_in(&temp);
    std::fs::write(
        snapshot.path().as_std_path(),
        r#"{"kind": "store", "items": [{"brand": "Acme", "name": "A", "url": "u", "media": "m", "info": null}]}"#,
    )
    .unwrap();

    assert_matches!(snapshot.load().unwrap_err(), ScoutError::CorruptStore(_));
}

#[test]
fn missing_snapshot_is_not_found() {
    let temp = tempfile::tempdir().unwrap();
    let snapshot = snapshot_in(&temp);
    assert_matches!(snapshot.load().unwrap_err(), ScoutError::StoreNotFound(_));
    assert!(snapshot.load_or_default().unwrap().is_empty());
}
