mod common;

use assert_matches::assert_matches;

use common::{FailingCatalog, Listed, MockCatalog, detail_page, listing_page, temp_config};
use fabric_scout::app::{App, ReportOptions};
use fabric_scout::domain::{Article, ArticleInfo};
use fabric_scout::error::ScoutError;
use fabric_scout::material::Composition;
use fabric_scout::report::{ReportFilter, ReportFormat};
use fabric_scout::store::{SnapshotFile, Store};

const LISTING: &str = "https://shop.example/shirts/";

fn catalog() -> MockCatalog {
    let listed = [
        Listed { brand: "Acme", name: "Oxford", key: "acme-oxford" },
        Listed { brand: "Loom", name: "Tee", key: "loom-tee" },
        Listed { brand: "Weft", name: "Mystery", key: "weft-mystery" },
    ];
    MockCatalog::default()
        .with_page(LISTING, listing_page(&listed, None))
        .with_page(
            "https://shop.example/acme-oxford.html",
            detail_page("58% Cotton, 42% Polyester", Some("Oxford")),
        )
        // No pattern attribute on this one.
        .with_page(
            "https://shop.example/loom-tee.html",
            detail_page("100% Cotton", None),
        )
    // weft-mystery has no detail page at all.
}

fn enriched(url: &str, material: &str) -> Article {
    let mut article = Article::new("Acme", url, url, format!("https://img.example/{url}.jpg"));
    article.info = Some(ArticleInfo::new(Composition::parse(material), "Jersey"));
    article
}

#[test]
fn generate_then_collect_tolerates_missing_fields() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(temp_config(temp.path()), catalog());

    let generated = app.generate(LISTING, false).unwrap();
    assert_eq!(generated.discovered, 3);
    assert_eq!(generated.added, 3);

    let summary = app.collect(false).unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.changed, 3);
    assert_eq!(summary.unknown, 1);

    let store = app.snapshot().load().unwrap();
    let oxford = store.get("https://shop.example/acme-oxford.html").unwrap();
    let info = oxford.info.as_ref().unwrap();
    assert_eq!(info.material.get("Cotton"), Some("58%"));
    assert_eq!(info.pattern, "Oxford");

    let tee = store.get("https://shop.example/loom-tee.html").unwrap();
    assert_eq!(tee.info.as_ref().unwrap().pattern, "");

    let mystery = store.get("https://shop.example/weft-mystery.html").unwrap();
    assert_eq!(mystery.info, Some(ArticleInfo::unknown()));
}

#[test]
fn unknown_records_are_not_refetched() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(temp_config(temp.path()), catalog());
    app.generate(LISTING, false).unwrap();

    let first = app.collect(false).unwrap();
    assert_eq!(first.unknown, 1);
    let before = std::fs::read(app.snapshot().path().as_std_path()).unwrap();

    let second = app.collect(false).unwrap();
    assert_eq!(second.processed, 0);
    assert!(!second.has_changes());
    let after = std::fs::read(app.snapshot().path().as_std_path()).unwrap();
    assert_eq!(before, after);
}

#[test]
fn regenerate_keeps_records_and_does_not_duplicate() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(temp_config(temp.path()), catalog());

    app.generate(LISTING, true).unwrap();
    let again = app.generate(LISTING, false).unwrap();

    assert_eq!(again.added, 0);
    assert_eq!(again.total, 3);
    let store = app.snapshot().load().unwrap();
    assert_eq!(store.enriched().count(), 3);
}

#[test]
fn collect_without_force_on_enriched_store_does_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp_config(temp.path());
    let snapshot = SnapshotFile::new(config.store_path.clone());
    snapshot
        .save(&Store::from_articles([
            enriched("https://shop.example/a.html", "100% Wool"),
            enriched("https://shop.example/b.html", "50% Wool, 50% Silk"),
        ]))
        .unwrap();
    let before = std::fs::read(snapshot.path().as_std_path()).unwrap();
    let modified = std::fs::metadata(snapshot.path().as_std_path())
        .unwrap()
        .modified()
        .unwrap();

    let app = App::new(config, FailingCatalog);
    let summary = app.collect(false).unwrap();

    assert_eq!(summary.processed, 0);
    assert!(!summary.has_changes());
    let after = std::fs::read(snapshot.path().as_std_path()).unwrap();
    assert_eq!(before, after);
    let modified_after = std::fs::metadata(snapshot.path().as_std_path())
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(modified, modified_after);
}

#[test]
fn forced_collect_refetches_but_only_writes_changes() {
    let temp = tempfile::tempdir().unwrap();
    let client = catalog();
    let app = App::new(temp_config(temp.path()), client);
    app.generate(LISTING, true).unwrap();

    let summary = app.collect(true).unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.changed, 0);
}

#[test]
fn transport_errors_abort_collect() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp_config(temp.path());
    SnapshotFile::new(config.store_path.clone())
        .save(&Store::from_articles([Article::new(
            "Acme",
            "Shirt",
            "https://shop.example/a.html",
            "https://img.example/a.jpg",
        )]))
        .unwrap();

    let app = App::new(config, FailingCatalog);
    let err = app.collect(false).unwrap_err();
    assert_matches!(err, ScoutError::Transport(_));
}

#[test]
fn commands_on_missing_store_fail() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(temp_config(temp.path()), FailingCatalog);
    assert_matches!(app.collect(false).unwrap_err(), ScoutError::StoreNotFound(_));
    assert_matches!(
        app.report(&ReportOptions::default()).unwrap_err(),
        ScoutError::StoreNotFound(_)
    );
}

#[test]
fn localize_media_downloads_once_and_rewrites() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp_config(temp.path());
    let image_dir = config.image_dir.clone();
    SnapshotFile::new(config.store_path.clone())
        .save(&Store::from_articles([
            Article::new("Acme", "A", "https://shop.example/a.html", "https://img.example/spp/a.jpg"),
            Article::new("Acme", "B", "https://shop.example/b.html", "https://img.example/missing/b.jpg"),
        ]))
        .unwrap();

    let app = App::new(config, MockCatalog::default());
    let result = app.localize_media().unwrap();
    assert_eq!(result.downloaded, 1);
    assert_eq!(result.rewritten, 1);
    assert_eq!(result.missing, 1);

    let store = app.snapshot().load().unwrap();
    assert_eq!(store.articles[0].media, image_dir.join("spp/a.jpg").to_string());
    assert!(image_dir.join("spp/a.jpg").as_std_path().exists());
    assert_eq!(store.articles[1].media, "https://img.example/missing/b.jpg");
}

#[test]
fn report_groups_and_pads_rows() {
    let temp = tempfile::tempdir().unwrap();
    let config = temp_config(temp.path());
    let mut articles: Vec<Article> = (0..7)
        .map(|n| enriched(&format!("https://shop.example/{n}.html"), "60% Wool, 40% Silk"))
        .collect();
    articles.push(enriched("https://shop.example/linen.html", "100% Linen"));
    SnapshotFile::new(config.store_path.clone())
        .save(&Store::from_articles(articles))
        .unwrap();
    let app = App::new(config, FailingCatalog);

    let html = app
        .report(&ReportOptions {
            filter: ReportFilter {
                pattern: Some("jersey".to_string()),
                material: Some("Wool".to_string()),
            },
            group_by: None,
            format: Some(ReportFormat::Html),
        })
        .unwrap();
    assert!(html.contains("<h3>60% Wool</h3>"));
    assert_eq!(html.matches("<div class=\"row\">").count(), 3);
    assert_eq!(html.matches("<div class=\"col-sm\">").count(), 9);
    assert_eq!(html.matches("<div class=\"card\">").count(), 7);

    let err = app
        .report(&ReportOptions {
            group_by: Some("Silk".to_string()),
            ..ReportOptions::default()
        })
        .unwrap_err();
    assert_matches!(err, ScoutError::MissingGroupAttribute { .. });
}

#[test]
fn material_and_pattern_counts() {
    let temp = tempfile::tempdir().unwrap();
    let app = App::new(temp_config(temp.path()), catalog());
    app.generate(LISTING, true).unwrap();

    let materials = app.material_counts().unwrap();
    assert_eq!(materials[0].value, "Cotton");
    assert_eq!(materials[0].count, 2);
    assert_eq!(materials[1].value, "Polyester");

    let patterns = app.pattern_counts().unwrap();
    let values: Vec<_> = patterns.iter().map(|entry| entry.value.as_str()).collect();
    // The tee has no pattern and the mystery page is unknown.
    assert_eq!(values, vec!["", "Oxford"]);
}
