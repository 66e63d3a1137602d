mod common;

use assert_cmd::Command;
use axum::http::StatusCode;
use common::{create_temp_directory, create_test_image_file, spawn_mock_service};
use predicates::prelude::*;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("pca-squeeze").unwrap();
    cmd.env_remove("PCA_API_URL").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    cli().arg("--help").assert().success();
}

#[test]
fn test_compress_help() {
    cli()
        .args(["compress", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Compression intensity K"));
}

#[test]
fn test_session_help() {
    cli().args(["session", "--help"]).assert().success();
}

#[test]
fn test_health_help() {
    cli().args(["health", "--help"]).assert().success();
}

#[test]
fn test_compress_missing_args() {
    cli().args(["compress"]).assert().failure();
}

#[test]
fn test_compress_nonexistent_file() {
    cli()
        .args(["compress", "nonexistent.jpg", "--api-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nonexistent.jpg"));
}

#[test]
fn test_compress_rejects_non_image_file() {
    let temp_dir = create_temp_directory();
    let notes = temp_dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();

    cli()
        .args(["compress", notes.to_str().unwrap(), "--api-url", "http://127.0.0.1:9"])
        .args(["-o", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not an image"));
    assert!(!temp_dir.path().join("compressed_k50.jpg").exists());
}

#[test]
fn test_compress_with_k_out_of_range() {
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "test.jpg", 100);

    for k in ["0", "501"] {
        cli()
            .args(["compress", &image.to_string_lossy(), "-k", k])
            .assert()
            .failure();
    }
}

#[test]
fn test_compress_invalid_api_url() {
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "test.jpg", 100);

    cli()
        .args(["compress", &image.to_string_lossy(), "--api-url", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid service URL"));
}

#[test]
fn test_compress_unreachable_service() {
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "test.jpg", 100);

    cli()
        .args(["compress", &image.to_string_lossy(), "--api-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not reach the compression service"));

    assert!(!temp_dir.path().join("compressed_k50.jpg").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_compress_saves_result() {
    let mock = spawn_mock_service(StatusCode::OK, vec![0xEE; 400]).await;
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "photo.jpg", 1000);
    let output = temp_dir.path().join("out");

    cli()
        .args(["compress", &image.to_string_lossy(), "-k", "30", "-o"])
        .arg(&output)
        .args(["--api-url", &mock.base_url])
        .assert()
        .success()
        .stdout(predicate::str::contains("60.0%"))
        .stdout(predicate::str::contains("compressed_k30.jpg"));

    let saved = std::fs::read(output.join("compressed_k30.jpg")).unwrap();
    assert_eq!(saved, vec![0xEE; 400]);

    let uploads = mock.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].k.as_deref(), Some("30"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_compress_with_temp_file_backing() {
    let mock = spawn_mock_service(StatusCode::OK, vec![0x11; 64]).await;
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "photo.png", 128);

    cli()
        .args(["compress", &image.to_string_lossy(), "--temp-files", "-q", "-o"])
        .arg(temp_dir.path())
        .args(["--api-url", &mock.base_url])
        .assert()
        .success();

    assert!(temp_dir.path().join("compressed_k50.jpg").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_compress_server_error() {
    let mock = spawn_mock_service(StatusCode::INTERNAL_SERVER_ERROR, Vec::new()).await;
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "photo.jpg", 1000);

    cli()
        .args(["compress", &image.to_string_lossy(), "-o"])
        .arg(temp_dir.path())
        .args(["--api-url", &mock.base_url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Compression failed on server"));

    assert!(!temp_dir.path().join("compressed_k50.jpg").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_health_command() {
    let mock = spawn_mock_service(StatusCode::OK, Vec::new()).await;

    cli()
        .args(["health", "--api-url", &mock.base_url])
        .assert()
        .success()
        .stdout(predicate::str::contains("I'm Alive"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_api_url_from_environment() {
    let mock = spawn_mock_service(StatusCode::OK, Vec::new()).await;

    cli()
        .env("PCA_API_URL", &mock.base_url)
        .args(["health"])
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_session_from_stdin() {
    let mock = spawn_mock_service(StatusCode::OK, vec![0x22; 250]).await;
    let temp_dir = create_temp_directory();
    let image = create_test_image_file(temp_dir.path(), "photo.png", 1000);

    let script = format!(
        "open {}\nk 10\ncompress\nsave {}\nbogus\nquit\n",
        image.display(),
        temp_dir.path().display()
    );

    cli()
        .args(["session", "--api-url", &mock.base_url])
        .write_stdin(script)
        .assert()
        .success()
        .stdout(predicate::str::contains("75.0%"))
        .stderr(predicate::str::contains("Unknown command 'bogus'"));

    assert!(temp_dir.path().join("compressed_k10.jpg").exists());
}
