//! Remote Style Tests
//!
//! Runs against forge and HTTP style references through an in-memory
//! transport that counts every request, so the cache behaviour across
//! repeated runs can be observed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use stylist_core::{CachePolicy, Context, Engine, Error, Mode, Report, Result, Transport};
use stylist_fs::NormalizedPath;
use stylist_test_utils::TestProject;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Serves canned bodies by URL and counts requests.
#[derive(Default)]
struct CountingTransport {
    bodies: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl CountingTransport {
    fn with(self, url: &str, body: &str) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_string());
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for CountingTransport {
    fn get(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::StyleNotFound {
                reference: url.to_string(),
            })
    }
}

const RAW: &str = "https://raw.githubusercontent.com/acme/styles";

const PYTHON_STYLE: &str = r#"
[stylist.styles]
include = "./base"

["setup.cfg".flake8]
max-line-length = 120
"#;

const BASE_STYLE: &str = r#"
["setup.cfg".flake8]
select = "E,W"
"#;

fn transport() -> Arc<CountingTransport> {
    Arc::new(
        CountingTransport::default()
            .with(&format!("{RAW}/v1/python.toml"), PYTHON_STYLE)
            .with(&format!("{RAW}/v1/base.toml"), BASE_STYLE),
    )
}

fn remote_project() -> TestProject {
    TestProject::new()
        .with_config("style = \"gh://acme/styles@v1/python\"\n")
        .with_file("setup.cfg", "[flake8]\nmax-line-length = 88\n")
}

fn run(project: &TestProject, transport: &Arc<CountingTransport>, mode: Mode) -> Report {
    let context = Context::load(NormalizedPath::new(project.root()))
        .unwrap()
        .with_transport(transport.clone());
    Engine::new(&context).run(mode).unwrap()
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn repeated_runs_fetch_each_style_once() {
    let project = remote_project();
    let transport = transport();

    for _ in 0..3 {
        let report = run(&project, &transport, Mode::Check);
        assert!(!report.aborted, "{:?}", report.violations);
    }

    // python.toml and its include, once each
    assert_eq!(transport.calls(), 2);
}

#[test]
fn never_policy_fetches_every_run() {
    let project = remote_project();
    let transport = transport();

    for _ in 0..3 {
        let context = Context::load(NormalizedPath::new(project.root()))
            .unwrap()
            .with_transport(transport.clone())
            .with_cache_policy(CachePolicy::Never);
        Engine::new(&context).run(Mode::Check).unwrap();
    }

    assert_eq!(transport.calls(), 6);
}

#[test]
fn offline_run_uses_warm_cache() {
    let project = remote_project();
    let transport = transport();
    run(&project, &transport, Mode::Check);

    let offline = Context::load(NormalizedPath::new(project.root()))
        .unwrap()
        .with_transport(transport.clone())
        .with_offline(true);
    let report = Engine::new(&offline).run(Mode::Fix).unwrap();

    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(transport.calls(), 2);
    project.assert_file_contains("setup.cfg", "max-line-length = 120");
    project.assert_file_contains("setup.cfg", "select = E,W");
}

#[test]
fn offline_run_with_cold_cache_aborts() {
    let project = remote_project();
    let transport = transport();

    let offline = Context::load(NormalizedPath::new(project.root()))
        .unwrap()
        .with_transport(transport.clone())
        .with_offline(true);
    let report = Engine::new(&offline).run(Mode::Fix).unwrap();

    assert!(report.aborted);
    assert_eq!(report.violations[0].code.as_u16(), 2);
    assert_eq!(transport.calls(), 0);
    project.assert_file_contains("setup.cfg", "max-line-length = 88");
}

// =============================================================================
// Remote resolution
// =============================================================================

#[test]
fn relative_include_resolves_inside_the_forge_repo() {
    let project = remote_project();
    let transport = transport();

    let context = Context::load(NormalizedPath::new(project.root()))
        .unwrap()
        .with_transport(transport.clone());
    let style = Engine::new(&context).resolve();

    assert_eq!(
        style.sources,
        vec!["gh://acme/styles@v1/python.toml", "gh://acme/styles@v1/base.toml"]
    );
}

#[test]
fn missing_remote_style_aborts_the_run() {
    let project = TestProject::new()
        .with_config("style = \"https://styles.example.com/missing\"\n")
        .with_file("setup.cfg", "[flake8]\nmax-line-length = 88\n");
    let transport = transport();

    let report = run(&project, &transport, Mode::Fix);

    assert!(report.aborted);
    assert_eq!(report.violations.len(), 1);
    assert!(report.violations[0].message.contains("https://styles.example.com/missing.toml"));
    assert_eq!(project.read("setup.cfg"), "[flake8]\nmax-line-length = 88\n");
}

#[test]
fn http_style_can_include_a_bundled_style() {
    let transport = Arc::new(CountingTransport::default().with(
        "https://styles.example.com/team.toml",
        "[stylist.styles]\ninclude = \"pkg://stylist/python/black\"\n",
    ));
    let project = TestProject::new().with_config("style = \"https://styles.example.com/team\"\n");

    let report = run(&project, &transport, Mode::Fix);

    assert!(report.is_clean(), "{:?}", report.violations);
    assert_eq!(transport.calls(), 1);
    project.assert_file_contains("pyproject.toml", "[tool.black]");
}
