use stylist_fs::{NormalizedPath, RobustnessConfig, io};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("test.txt"));

    io::write_atomic(&path, b"hello world").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "hello world");
}

#[test]
fn test_write_atomic_creates_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".cache/stylist/styles/entry.json"));

    io::write_atomic(&path, b"{}").unwrap();

    assert!(path.is_file());
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "original").unwrap();

    let path = NormalizedPath::new(&file_path);
    io::write_atomic(&path, b"updated").unwrap();

    let content = fs::read_to_string(&file_path).unwrap();
    assert_eq!(content, "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("setup.cfg"));

    io::write_atomic(&path, b"[flake8]\n").unwrap();

    let names: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["setup.cfg".to_string()]);
}

#[test]
fn test_write_with_retry_succeeds_first_time() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("merged-style.toml"));
    let config = RobustnessConfig {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(5),
        max_elapsed: Duration::from_millis(50),
    };

    io::write_atomic_with_retry(&path, b"a = 1\n", config).unwrap();

    assert_eq!(io::read_text(&path).unwrap(), "a = 1\n");
}

#[test]
fn test_write_with_retry_gives_up_on_permanent_error() {
    let temp = TempDir::new().unwrap();
    // A regular file where a directory is expected cannot be fixed by retrying
    let blocker = temp.path().join("blocker");
    fs::write(&blocker, "x").unwrap();
    let path = NormalizedPath::new(blocker.join("child.toml"));

    let result = io::write_atomic_with_retry(&path, b"a = 1\n", RobustnessConfig::default());
    assert!(result.is_err());
}

#[test]
fn test_read_text_existing_file() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("test.txt");
    fs::write(&file_path, "hello").unwrap();

    let path = NormalizedPath::new(&file_path);
    let content = io::read_text(&path).unwrap();
    assert_eq!(content, "hello");
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/file.txt");
    let result = io::read_text(&path);
    assert!(result.is_err());
}
