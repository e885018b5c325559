//! Comparison and patching across formats

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use stylist_content::{ChangeKind, CompareOptions, Document, Format};

fn fix_twice(file_name: &str, source: &str, desired: &Value, options: &CompareOptions) -> Document {
    let mut doc = Document::parse_file(file_name, source).unwrap();
    let first = doc.compare(file_name, desired, options);
    assert!(!first.is_empty(), "expected changes on first run");
    doc.apply(&first.patch_delta()).unwrap();

    let second = doc.compare(file_name, desired, options);
    assert!(second.is_empty(), "second run still reports {:?}", second.changes);
    doc
}

#[rstest]
#[case::toml(
    "pyproject.toml",
    "[tool.black]\nline-length = 88\n",
    json!({"tool": {"black": {"line-length": 120, "skip-string-normalization": true}}})
)]
#[case::json(
    "package.json",
    "{\"name\": \"x\", \"scripts\": {}}\n",
    json!({"scripts": {"lint": "eslint ."}, "private": true})
)]
#[case::yaml(
    "config.yaml",
    "a: 1\nlist:\n- x\n",
    json!({"a": 2, "list": ["y"], "nested": {"k": "v"}})
)]
#[case::ini(
    "setup.cfg",
    "[flake8]\nmax-line-length = 88\n",
    json!({"flake8": {"max-line-length": 120, "ignore": ["E203", "W503"]}, "isort": {"profile": "black"}})
)]
#[case::text(
    "requirements.txt",
    "black\n",
    json!({"contains": [{"line": "black"}, {"line": "flake8"}]})
)]
fn test_fix_is_idempotent(#[case] file_name: &str, #[case] source: &str, #[case] desired: Value) {
    fix_twice(file_name, source, &desired, &CompareOptions::default());
}

#[test]
fn test_pre_commit_records_keep_order_and_siblings() {
    let source = "\
repos:
- repo: https://github.com/pycqa/flake8
  rev: 6.0.0
  hooks:
  - id: flake8
- repo: https://github.com/psf/black
  rev: 22.3.0
  hooks:
  - id: black
";
    let desired = json!({"repos": [
        {"repo": "https://github.com/psf/black", "rev": "23.1.0", "hooks": [{"id": "black"}]},
        {"repo": "https://github.com/pycqa/isort", "rev": "5.12.0", "hooks": [{"id": "isort"}]}
    ]});

    let doc = fix_twice(".pre-commit-config.yaml", source, &desired, &CompareOptions::default());

    assert_eq!(
        doc.value(),
        &json!({"repos": [
            {"repo": "https://github.com/pycqa/flake8", "rev": "6.0.0", "hooks": [{"id": "flake8"}]},
            {"repo": "https://github.com/psf/black", "rev": "23.1.0", "hooks": [{"id": "black"}]},
            {"repo": "https://github.com/pycqa/isort", "rev": "5.12.0", "hooks": [{"id": "isort"}]}
        ]})
    );
}

#[test]
fn test_unique_key_scenario_changes_only_rev() {
    let options = CompareOptions::new().with_unique_key("hooks", "id");
    let doc = Document::parse_as("{\"hooks\": [{\"id\": \"black\", \"rev\": \"1\"}]}", Format::Json).unwrap();
    let result = doc.compare("hooks.json", &json!({"hooks": [{"id": "black", "rev": "2"}]}), &options);

    assert_eq!(result.missing, json!({}));
    assert_eq!(result.replace, json!({"hooks": [{"id": "black", "rev": "2"}]}));
    assert!(matches!(
        &result.changes[0].kind,
        ChangeKind::Records { added, updated } if added.is_empty() && updated == &vec![0]
    ));
}

#[test]
fn test_comma_set_scenario_in_ini() {
    let options = CompareOptions::new().with_comma_separated("flake8.ignore");
    let mut doc = Document::parse_file("setup.cfg", "[flake8]\nignore = spam,eggs,cheese\n").unwrap();
    let result = doc.compare("setup.cfg", &json!({"flake8": {"ignore": "ham,salt"}}), &options);
    doc.apply(&result.patch_delta()).unwrap();

    assert_eq!(doc.source(), "[flake8]\nignore = spam,eggs,cheese,ham,salt\n");
}

#[test]
fn test_parse_failure_is_an_error() {
    assert!(Document::parse_file("pyproject.toml", "[broken").is_err());
}
