//! Integration tests: full import runs against the fixture store.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use owl_importer::ImportOptions;
use owl_importer::config::ImportConfig;
use owl_importer::pipeline::{ImportSummary, import_file};
use owl_importer::store::{ContentStore, FieldItem, MemoryStore};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Scratch copy of the fixture store directory
fn store_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let source = fixture("store");
    fs::copy(source.join("store.json"), dir.path().join("store.json")).unwrap();
    fs::create_dir_all(dir.path().join("files/img")).unwrap();
    fs::copy(
        source.join("files/img/logo.png"),
        dir.path().join("files/img/logo.png"),
    )
    .unwrap();
    dir
}

fn run(input: &str, store: &mut MemoryStore, options: ImportOptions) -> ImportSummary {
    import_file(&fixture(input), store, &ImportConfig::default(), options).unwrap()
}

fn news(name: &str) -> String {
    format!("http://example.org/news#{name}")
}

#[test]
fn turtle_ontology_import() {
    let dir = store_dir();
    let mut store = MemoryStore::open(dir.path()).unwrap();

    let summary = run("news.ttl", &mut store, ImportOptions::everything(1));

    assert_eq!(summary.counts.vocabularies, 2);
    assert_eq!(summary.counts.terms, 3);
    assert_eq!(summary.counts.nodes, 2);
    assert_eq!(summary.counts.files, 1);
    assert_eq!(
        summary.warnings,
        vec!["field 'field_mood' does not exist in 'newsarticle'".to_string()]
    );

    assert_eq!(store.vocabulary("topics").unwrap().name, "Topics");
    assert_eq!(store.vocabulary("regions").unwrap().name, "Regions");

    let politics = store.find_term("topics", "Politics").unwrap();
    let elections = store.find_term("topics", "Elections").unwrap();
    let sports = store.find_term("topics", "Sports").unwrap();
    assert_eq!(store.term(elections).unwrap().parents, vec![politics]);
    assert_eq!(
        store.term(politics).unwrap().fields["field_code"],
        vec![FieldItem::Text {
            value: "POL".to_string()
        }]
    );

    let article1 = store.find_node_by_uuid(&news("Article1")).unwrap();
    let article2 = store.find_node_by_uuid(&news("Article2")).unwrap();
    let node = store.node(article1).unwrap();
    assert_eq!(node.title, "Hello");
    assert_eq!(node.bundle, "newsarticle");
    assert_eq!(node.owner, 1);
    assert_eq!(
        store.alias_of(&format!("/node/{article1}")),
        Some("/hello-world")
    );

    let text = |value: &str| FieldItem::Text {
        value: value.to_string(),
    };
    assert_eq!(
        node.fields["body"],
        vec![FieldItem::Body {
            value: "<p>Vote!</p>".to_string(),
            summary: Some("Vote".to_string()),
            format: "full_html".to_string(),
        }]
    );
    assert_eq!(
        node.fields["field_keywords"],
        vec![text("A"), text("B"), text("C")]
    );
    assert_eq!(node.fields["field_published"], vec![text("2016-05-04")]);
    assert_eq!(
        node.fields["field_related"],
        vec![FieldItem::Target {
            target_id: article2
        }]
    );
    assert_eq!(
        node.fields["field_topic"],
        vec![FieldItem::Target { target_id: sports }]
    );
    assert_eq!(
        node.fields["field_tags"],
        vec![FieldItem::Target {
            target_id: elections
        }]
    );

    let file = store.find_file("public://img/logo.png").unwrap();
    assert_eq!(
        node.fields["field_image"],
        vec![FieldItem::File {
            target_id: file,
            title: Some("Logo".to_string())
        }]
    );

    let second = store.node(article2).unwrap();
    assert_eq!(
        second.fields["field_related"],
        vec![FieldItem::Target {
            target_id: article1
        }]
    );
    assert!(!second.fields.contains_key("field_tags"));
}

#[test]
fn rdf_xml_ontology_import() {
    let dir = store_dir();
    let mut store = MemoryStore::open(dir.path()).unwrap();

    let summary = run("news.owl", &mut store, ImportOptions::everything(1));

    assert_eq!(summary.counts.vocabularies, 1);
    assert_eq!(summary.counts.terms, 2);
    assert_eq!(summary.counts.nodes, 1);

    let politics = store.find_term("topics", "Politics").unwrap();
    let elections = store.find_term("topics", "Elections").unwrap();
    assert_eq!(store.term(elections).unwrap().parents, vec![politics]);

    let id = store.find_node_by_uuid(&news("Article1")).unwrap();
    let node = store.node(id).unwrap();
    assert_eq!(node.title, "Hello");
    let keywords: Vec<String> = node.fields["field_keywords"]
        .iter()
        .map(|item| match item {
            FieldItem::Text { value } => value.clone(),
            other => panic!("unexpected item {other:?}"),
        })
        .collect();
    assert_eq!(keywords, ["A", "B", "C"]);
    assert_eq!(
        node.fields["field_tags"],
        vec![FieldItem::Target {
            target_id: elections
        }]
    );
}

#[test]
fn json_import() {
    let dir = store_dir();
    let mut store = MemoryStore::open(dir.path()).unwrap();

    let summary = run("import.json", &mut store, ImportOptions::everything(3));

    assert_eq!(summary.counts.vocabularies, 1);
    assert_eq!(summary.counts.terms, 3);
    assert_eq!(summary.counts.nodes, 2);
    assert_eq!(
        summary.warnings,
        vec!["Content type 'blogpost' does not exist.".to_string()]
    );

    let politics = store.find_term("topics", "Politics").unwrap();
    let elections = store.find_term("topics", "Elections").unwrap();
    assert_eq!(store.term(elections).unwrap().parents, vec![politics]);
    assert_eq!(store.term(politics).unwrap().uuid, "topics/Politics");

    let hello = store.find_node_by_uuid("article-1").unwrap();
    let second = store.find_node_by_uuid("article-2").unwrap();
    let node = store.node(hello).unwrap();
    assert_eq!(node.owner, 3);
    assert_eq!(
        node.fields["field_related"],
        vec![FieldItem::Target { target_id: second }]
    );
    assert_eq!(
        node.fields["field_tags"],
        vec![FieldItem::Target {
            target_id: elections
        }]
    );
    assert_eq!(store.alias_of(&format!("/node/{hello}")), Some("/hello-world"));
    assert_eq!(store.file_count(), 1);
}

#[test]
fn reimport_updates_instead_of_duplicating() {
    let dir = store_dir();
    let mut store = MemoryStore::open(dir.path()).unwrap();
    run("news.ttl", &mut store, ImportOptions::everything(1));

    let options = ImportOptions {
        overwrite: true,
        ..ImportOptions::everything(1)
    };
    let summary = run("news.ttl", &mut store, options);

    insta::assert_snapshot!(
        summary.to_string(),
        @"Success! 0 vocabularies with 3 terms and 2 nodes imported."
    );
    assert_eq!(store.term_count(), 3);
    assert_eq!(store.terms_in("topics").count(), 3);
    assert_eq!(store.terms_in("regions").count(), 0);
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.file_count(), 1);

    let id = store.find_node_by_uuid(&news("Article1")).unwrap();
    assert_eq!(store.node(id).unwrap().revision, 2);
    assert_eq!(store.alias_of(&format!("/node/{id}")), Some("/hello-world"));
}

#[test]
fn summary_line() {
    let dir = store_dir();
    let mut store = MemoryStore::open(dir.path()).unwrap();

    let summary = run("news.ttl", &mut store, ImportOptions::everything(1));

    insta::assert_snapshot!(
        summary.to_string(),
        @"Success! 2 vocabularies with 3 terms and 2 nodes imported."
    );
}

#[test]
fn nodes_without_vocabularies_warn_about_missing_tags() {
    let dir = store_dir();
    let mut store = MemoryStore::open(dir.path()).unwrap();
    let options = ImportOptions {
        import_vocabularies: false,
        ..ImportOptions::everything(1)
    };

    let summary = run("news.ttl", &mut store, options);

    assert_eq!(summary.counts.nodes, 2);
    assert_eq!(store.term_count(), 0);
    assert!(summary.warnings.contains(
        &"Non-existing tag 'Sports' in vocabulary 'topics' referenced by 'Article1' and property 'field_topic'."
            .to_string()
    ));
    assert!(summary.warnings.contains(
        &"Referenced taxonomy_term 'topics/Elections' in field 'field_tags' does not exist."
            .to_string()
    ));

    let id = store.find_node_by_uuid(&news("Article1")).unwrap();
    let node = store.node(id).unwrap();
    assert!(!node.fields.contains_key("field_topic"));
    assert!(!node.fields.contains_key("field_tags"));
}

#[test]
fn missing_backing_file_is_warned() {
    let dir = store_dir();
    fs::remove_file(dir.path().join("files/img/logo.png")).unwrap();
    let mut store = MemoryStore::open(dir.path()).unwrap();

    let summary = run("news.ttl", &mut store, ImportOptions::everything(1));

    assert!(summary.warnings.contains(
        &"File 'public://img/logo.png' does not exist, but the URI entry was stored. Upload the file manually."
            .to_string()
    ));
    assert!(store.find_file("public://img/logo.png").is_some());
}

#[test]
fn binary_imports_and_saves_store() {
    let dir = store_dir();

    let output = Command::new(env!("CARGO_BIN_EXE_owl-import"))
        .arg(dir.path())
        .arg(fixture("news.ttl"))
        .args(["1", "1", "1", "0", "0", "0"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("Success! 2 vocabularies with 3 terms and 2 nodes imported.")
    );
    assert_eq!(
        lines.collect::<Vec<_>>(),
        ["Warning: field 'field_mood' does not exist in 'newsarticle'"]
    );

    let store = MemoryStore::open(dir.path()).unwrap();
    assert_eq!(store.node_count(), 2);
    assert_eq!(store.term_count(), 3);

    let log = fs::read_to_string(dir.path().join("import.log")).unwrap();
    assert!(log.contains("import finished"));
    assert!(log.contains("run warning: field 'field_mood' does not exist in 'newsarticle'"));
}

#[test]
fn binary_fails_on_missing_input() {
    let dir = store_dir();

    let output = Command::new(env!("CARGO_BIN_EXE_owl-import"))
        .arg(dir.path())
        .arg(dir.path().join("missing.ttl"))
        .args(["1", "1", "1", "0", "0", "0"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!dir.path().join("import.log").exists());
}

#[test]
fn binary_reports_import_errors_without_failing() {
    let dir = store_dir();
    let input = dir.path().join("broken.json");
    fs::write(&input, "{\"nodes\": [").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_owl-import"))
        .arg(dir.path())
        .arg(&input)
        .args(["1", "1", "1", "0", "0", "0"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Error: "));
}
