//! Scenario Tests
//!
//! Workspace-level scenarios that run the whole pipeline: style documents on
//! disk, the resolver, the comparator and the format adapters patching real
//! target files.

use pretty_assertions::assert_eq;
use serde_json::json;
use stylist_content::{ChangeKind, CompareOptions, Document};
use stylist_core::{Context, Engine, Mode, Report};
use stylist_fs::NormalizedPath;
use stylist_test_utils::TestProject;

// =============================================================================
// Test Infrastructure
// =============================================================================

fn run(project: &TestProject, mode: Mode) -> Report {
    let context = Context::load(NormalizedPath::new(project.root())).unwrap();
    Engine::new(&context).run(mode).unwrap()
}

fn codes(report: &Report) -> Vec<u16> {
    report.violations.iter().map(|v| v.code.as_u16()).collect()
}

// =============================================================================
// Comparator scenarios on parsed documents
// =============================================================================

#[test]
fn scenario_simple_missing_value() {
    let doc = Document::parse_file("settings.json", "{}\n").unwrap();

    let comparison = doc.compare("settings.json", &json!({"a": {"b": 1}}), &CompareOptions::new());

    assert_eq!(comparison.missing, json!({"a": {"b": 1}}));
    assert_eq!(comparison.diff, json!({}));
}

#[test]
fn scenario_type_coerced_equality() {
    let desired = json!({"x": true});

    let json_doc = Document::parse_file("settings.json", "{\"x\": \"true\"}\n").unwrap();
    assert!(json_doc.compare("settings.json", &desired, &CompareOptions::new()).is_empty());

    let yaml_doc = Document::parse_file("settings.yaml", "x: \"true\"\n").unwrap();
    assert!(yaml_doc.compare("settings.yaml", &desired, &CompareOptions::new()).is_empty());

    let ini_doc = Document::parse_file("setup.cfg", "[tool]\nflag = True\n").unwrap();
    assert!(ini_doc.compare("setup.cfg", &json!({"tool": {"flag": true}}), &CompareOptions::new()).is_empty());
}

#[test]
fn scenario_comma_set_reconciliation() {
    let options = CompareOptions::new().with_comma_separated("flake8.ignore");
    let mut doc = Document::parse_file("setup.cfg", "[flake8]\nignore = spam,eggs,cheese\n").unwrap();

    let comparison = doc.compare("setup.cfg", &json!({"flake8": {"ignore": ["ham", "salt"]}}), &options);
    assert!(matches!(comparison.changes[0].kind, ChangeKind::CommaMembers { .. }));

    doc.apply(&comparison.patch_delta()).unwrap();
    assert_eq!(doc.source(), "[flake8]\nignore = spam,eggs,cheese,ham,salt\n");
}

#[test]
fn scenario_unique_key_list_merges_matched_record() {
    let options = CompareOptions::new().with_unique_key("hooks", "id");
    let mut doc = Document::parse_file(
        "hooks.json",
        r#"{"hooks": [{"id": "isort", "rev": "5"}, {"id": "black", "rev": "1", "args": ["-q"]}]}"#,
    )
    .unwrap();

    let comparison = doc.compare("hooks.json", &json!({"hooks": [{"id": "black", "rev": "2"}]}), &options);
    assert!(matches!(comparison.changes[0].kind, ChangeKind::Records { .. }));

    doc.apply(&comparison.patch_delta()).unwrap();
    assert_eq!(
        doc.value(),
        &json!({"hooks": [{"id": "isort", "rev": "5"}, {"id": "black", "rev": "2", "args": ["-q"]}]})
    );
}

#[test]
fn scenario_unique_key_list_appends_unmatched_record() {
    let options = CompareOptions::new().with_unique_key("hooks", "id");
    let mut doc = Document::parse_file(
        "hooks.json",
        r#"{"hooks": [{"id": "isort", "rev": "5"}, {"id": "mypy", "rev": "1"}]}"#,
    )
    .unwrap();

    let comparison = doc.compare("hooks.json", &json!({"hooks": [{"id": "black", "rev": "2"}]}), &options);
    doc.apply(&comparison.patch_delta()).unwrap();

    assert_eq!(
        doc.value(),
        &json!({"hooks": [
            {"id": "isort", "rev": "5"},
            {"id": "mypy", "rev": "1"},
            {"id": "black", "rev": "2"}
        ]})
    );
}

// =============================================================================
// Full runs
// =============================================================================

const MULTI_FORMAT_STYLE: &str = r#"
[stylist.files."setup.cfg"]
comma_separated_values = ["flake8.ignore"]

["pyproject.toml".tool.black]
line-length = 120

["package.json".scripts]
lint = "eslint ."

[".pre-commit-config.yaml"]
repos = [{ repo = "https://github.com/psf/black", rev = "23.1.0", hooks = [{ id = "black" }] }]

["setup.cfg".flake8]
ignore = "E203,W503"
max-line-length = 120

[".gitignore"]
contains = [{ line = ".venv" }]
"#;

fn multi_format_project() -> TestProject {
    TestProject::new()
        .with_config("style = \"./style\"\noffline = true\n")
        .with_file("style.toml", MULTI_FORMAT_STYLE)
        .with_file("pyproject.toml", "[tool.black]\nline-length = 88 # narrow\n")
        .with_file("package.json", "{\n  \"name\": \"app\",\n  \"scripts\": {\n    \"test\": \"jest\"\n  }\n}\n")
        .with_file(
            ".pre-commit-config.yaml",
            "repos:\n- repo: https://github.com/psf/black\n  rev: 22.3.0\n  hooks:\n  - id: black\n",
        )
        .with_file("setup.cfg", "[flake8]\nignore = E501\n")
        .with_file(".gitignore", "node_modules\n")
}

#[test]
fn fix_is_idempotent_across_formats() {
    let project = multi_format_project();

    let check = run(&project, Mode::Check);
    assert!(!check.aborted);
    let files: Vec<&str> = check.violations.iter().map(|v| v.file.as_str()).collect();
    for file in ["pyproject.toml", "package.json", ".pre-commit-config.yaml", "setup.cfg", ".gitignore"] {
        assert!(files.contains(&file), "no violation for {file}: {:?}", check.violations);
    }

    let fix = run(&project, Mode::Fix);
    assert!(fix.is_clean(), "{:?}", fix.violations);

    let second = run(&project, Mode::Check);
    assert!(second.violations.is_empty(), "{:?}", second.violations);

    project.assert_file_contains("pyproject.toml", "line-length = 120");
    project.assert_file_contains("package.json", "\"test\": \"jest\"");
    project.assert_file_contains("package.json", "\"lint\": \"eslint .\"");
    project.assert_file_contains(".pre-commit-config.yaml", "rev: 23.1.0");
    project.assert_file_contains("setup.cfg", "ignore = E501,E203,W503");
    assert_eq!(project.read(".gitignore"), "node_modules\n.venv\n");
}

#[test]
fn dry_run_matches_what_fix_writes() {
    let project = multi_format_project();

    let preview = run(&project, Mode::DryRun);
    let before = project.read("setup.cfg");
    assert_eq!(before, "[flake8]\nignore = E501\n");

    let fix = run(&project, Mode::Fix);

    let previewed: Vec<&str> = preview.changes.iter().map(|c| c.file.as_str()).collect();
    let fixed: Vec<&str> = fix.changes.iter().map(|c| c.file.as_str()).collect();
    assert_eq!(previewed, fixed);
    for (dry, real) in preview.changes.iter().zip(&fix.changes) {
        assert_eq!(dry.diff, real.diff, "diff for {}", dry.file);
    }
}

#[test]
fn included_styles_override_in_declaration_order() {
    let project = TestProject::new()
        .with_config("style = \"./styles/main\"\noffline = true\n")
        .with_file(
            "styles/main.toml",
            "[stylist.styles]\ninclude = [\"./first\", \"./second\"]\n\n[\"tox.ini\".flake8]\nmax-line-length = 80\n",
        )
        .with_file("styles/first.toml", "[\"tox.ini\".flake8]\nmax-line-length = 100\nselect = \"E\"\n")
        .with_file("styles/second.toml", "[\"tox.ini\".flake8]\nmax-line-length = 120\n");

    let fix = run(&project, Mode::Fix);

    assert!(fix.is_clean(), "{:?}", fix.violations);
    assert_eq!(codes(&fix), vec![301]);
    project.assert_file_contains("tox.ini", "max-line-length = 120");
    project.assert_file_contains("tox.ini", "select = E");
}

#[test]
fn cyclic_includes_resolve_once() {
    let project = TestProject::new()
        .with_config("style = \"./a\"\noffline = true\n")
        .with_file("a.toml", "[stylist.styles]\ninclude = \"./b\"\n\n[\"a.json\"]\nfrom = \"a\"\n")
        .with_file("b.toml", "[stylist.styles]\ninclude = \"./a\"\n\n[\"b.json\"]\nfrom = \"b\"\n");

    let context = Context::load(NormalizedPath::new(project.root())).unwrap();
    let style = Engine::new(&context).resolve();

    assert!(!style.aborted);
    assert_eq!(style.sources.len(), 2);
    assert_eq!(style.files.keys().collect::<Vec<_>>(), vec!["a.json", "b.json"]);
}

#[test]
fn one_bad_target_does_not_stop_the_others() {
    let project = multi_format_project().with_file("package.json", "{ not json");

    let fix = run(&project, Mode::Fix);

    let unparsed: Vec<&str> = fix
        .violations
        .iter()
        .filter(|v| v.code.as_u16() == 302)
        .map(|v| v.file.as_str())
        .collect();
    assert_eq!(unparsed, vec!["package.json"]);
    assert_eq!(project.read("package.json"), "{ not json");
    project.assert_file_contains("pyproject.toml", "line-length = 120");
}
