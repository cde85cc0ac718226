//! Integration tests for the install, update, and download-only workflows.

use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;
use go_installer::download::{Downloader, RetryPolicy, sha256_hex};
use go_installer::install::{InstallError, Installer, InstallerSettings, Platform};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{PUBLIC_HOST, RewritingTransport, start_mock_server_or_skip};

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

const ARCHIVE_PATH: &str = "/go/go1.22.3.linux-amd64.tar.gz";

fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

fn go_tarball(version: &str) -> Vec<u8> {
    tarball(&[
        ("go/VERSION", version),
        ("go/bin/go", "#!/bin/sh\necho go\n"),
    ])
}

async fn serve_archive(mock_server: &MockServer, archive: &[u8], published_digest: &str) {
    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.to_vec()))
        .mount(mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ARCHIVE_PATH}.sha256")))
        .respond_with(ResponseTemplate::new(200).set_body_string(published_digest.to_string()))
        .mount(mock_server)
        .await;
}

fn installer(mock_server: &MockServer, install_dir: &Path) -> Installer {
    let downloader = Downloader::with_transport(
        RewritingTransport::new(&mock_server.uri()),
        RetryPolicy::without_delay(1),
    );
    Installer::new(
        downloader,
        InstallerSettings {
            install_dir: install_dir.to_path_buf(),
            base_url: format!("{PUBLIC_HOST}/go"),
            verify_checksum: true,
            platform: Platform::from_rust_names("linux", "x86_64").unwrap(),
        },
    )
}

#[tokio::test]
async fn test_install_extracts_go_tree_with_published_checksum() {
    let mock_server = require_mock_server!();
    let archive = go_tarball("go1.22.3");
    serve_archive(&mock_server, &archive, &sha256_hex(&archive)).await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("sdk").join("go");

    let report = installer(&mock_server, &install_dir)
        .install("go1.22.3", None)
        .await
        .unwrap();

    assert_eq!(report.version, "1.22.3");
    assert_eq!(report.checksum, sha256_hex(&archive));
    assert_eq!(report.archive_bytes, archive.len() as u64);
    assert_eq!(
        std::fs::read_to_string(install_dir.join("VERSION")).unwrap(),
        "go1.22.3"
    );
    assert!(install_dir.join("bin/go").is_file());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("sdk"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("go")]);
}

#[tokio::test]
async fn test_install_with_explicit_checksum_skips_published_document() {
    let mock_server = require_mock_server!();
    let archive = go_tarball("go1.22.3");
    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{ARCHIVE_PATH}.sha256")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("go");

    installer(&mock_server, &install_dir)
        .install("1.22.3", Some(&sha256_hex(&archive)))
        .await
        .unwrap();
    assert!(install_dir.join("VERSION").exists());
}

#[tokio::test]
async fn test_install_checksum_mismatch_installs_nothing() {
    let mock_server = require_mock_server!();
    let archive = go_tarball("go1.22.3");
    serve_archive(&mock_server, &archive, &"a".repeat(64)).await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("go");

    let error = installer(&mock_server, &install_dir)
        .install("1.22.3", None)
        .await
        .unwrap_err();

    assert!(matches!(error, InstallError::Download(_)), "{error:?}");
    assert!(!install_dir.exists());
}

#[tokio::test]
async fn test_install_without_go_directory_is_unexpected_layout() {
    let mock_server = require_mock_server!();
    let archive = tarball(&[("toolchain/VERSION", "go1.22.3")]);
    serve_archive(&mock_server, &archive, &sha256_hex(&archive)).await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("go");

    let error = installer(&mock_server, &install_dir)
        .install("1.22.3", None)
        .await
        .unwrap_err();

    assert!(matches!(error, InstallError::UnexpectedLayout { .. }), "{error:?}");
    assert!(!install_dir.exists());
}

#[tokio::test]
async fn test_update_replaces_existing_installation() {
    let mock_server = require_mock_server!();
    let archive = go_tarball("go1.22.3");
    serve_archive(&mock_server, &archive, &sha256_hex(&archive)).await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("go");
    std::fs::create_dir_all(install_dir.join("bin")).unwrap();
    std::fs::write(install_dir.join("VERSION"), "go1.21.0").unwrap();
    std::fs::write(install_dir.join("stale.txt"), "old").unwrap();

    installer(&mock_server, &install_dir)
        .update("1.22.3", None)
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(install_dir.join("VERSION")).unwrap(),
        "go1.22.3"
    );
    assert!(!install_dir.join("stale.txt").exists());
}

#[tokio::test]
async fn test_failed_update_leaves_existing_installation() {
    let mock_server = require_mock_server!();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let install_dir = dir.path().join("go");
    std::fs::create_dir_all(&install_dir).unwrap();
    std::fs::write(install_dir.join("VERSION"), "go1.21.0").unwrap();

    let error = installer(&mock_server, &install_dir)
        .update("1.22.3", None)
        .await
        .unwrap_err();

    assert!(matches!(error, InstallError::Download(_)), "{error:?}");
    assert_eq!(
        std::fs::read_to_string(install_dir.join("VERSION")).unwrap(),
        "go1.21.0"
    );
}

#[tokio::test]
async fn test_download_only_writes_archive_to_output_dir() {
    let mock_server = require_mock_server!();
    let archive = go_tarball("go1.22.3");
    serve_archive(&mock_server, &archive, &sha256_hex(&archive)).await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("downloads");

    let result = installer(&mock_server, &dir.path().join("go"))
        .download("1.22.3", None, &output)
        .await
        .unwrap();

    assert_eq!(result.path, output.join("go1.22.3.linux-amd64.tar.gz"));
    assert_eq!(std::fs::read(&result.path).unwrap(), archive);
    assert!(!dir.path().join("go").exists());
}
