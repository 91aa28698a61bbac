use std::io::Write;

use assert_cmd::Command;
use httpmock::MockServer;
use predicates::str::contains;
use tempfile::NamedTempFile;

const BLOG_ID: &str = "6f1c3f7e-8f0b-4a53-9b8f-0d8d1c1e2a10";
const PROJECT_ID: &str = "3b9d2c1a-5e4f-4a6b-8c7d-9e0f1a2b3c4d";

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write file");
    file
}

fn fixtures() -> NamedTempFile {
    temp_file(&format!(
        r#"{{
            "blogs": [
                {{"id":"{BLOG_ID}","title":"Notes from the Rwenzori","category":"fieldwork","status":"draft","created_at":"2025-02-01T10:00:00Z"}}
            ],
            "projects": [
                {{"id":"{PROJECT_ID}","title":"Glacier retreat atlas","status":"active","created_at":"2025-01-15T08:00:00Z"}}
            ]
        }}"#
    ))
}

fn collabdesk() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("collabdesk"));
    cmd.env_remove("RUST_LOG")
        .env_remove("COLLABDESK_CONFIG_FILE")
        .env_remove("COLLABDESK_API_TOKEN_FILE")
        .env_remove("COLLABDESK__API__BASE_URL");
    cmd
}

#[test]
fn lists_blogs_from_fixtures() {
    let seed = fixtures();
    collabdesk()
        .arg("--fixtures")
        .arg(seed.path())
        .args(["blogs", "list", "--status", "draft"])
        .assert()
        .success()
        .stdout(contains("Notes from the Rwenzori"))
        .stdout(contains("publish,delete"))
        .stdout(contains("Page 1 of 1 (rows 1-1 of 1)"));
}

#[test]
fn shows_one_blog_with_its_actions() {
    let seed = fixtures();
    collabdesk()
        .arg("--fixtures")
        .arg(seed.path())
        .args(["blogs", "show", "--id", BLOG_ID])
        .assert()
        .success()
        .stdout(contains("blog \"Notes from the Rwenzori\""))
        .stdout(contains("fieldwork"))
        .stdout(contains("actions: publish, delete"));
}

#[test]
fn showing_an_unknown_row_fails() {
    let seed = fixtures();
    collabdesk()
        .arg("--fixtures")
        .arg(seed.path())
        .args(["blogs", "show", "--id", PROJECT_ID])
        .assert()
        .failure()
        .stderr(contains("is not in the loaded list"));
}

#[test]
fn json_listing_includes_paging_fields() {
    let seed = fixtures();
    let assert = collabdesk()
        .arg("--fixtures")
        .arg(seed.path())
        .args(["projects", "list", "--json"])
        .assert()
        .success();

    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&output).expect("json output");
    assert_eq!(parsed["total_pages"], 1);
    assert_eq!(parsed["items"][0]["title"], "Glacier retreat atlas");
}

#[test]
fn short_deletion_reason_fails_before_dispatch() {
    let seed = fixtures();
    collabdesk()
        .arg("--fixtures")
        .arg(seed.path())
        .args([
            "projects",
            "delete",
            "--id",
            PROJECT_ID,
            "--reason",
            "short",
            "--confirm",
            "PERMANENTLY DELETE",
        ])
        .assert()
        .failure()
        .stderr(contains("reason must be at least 20 characters"));
}

#[test]
fn archive_goes_through_the_http_api() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method("GET")
            .path("/api/admin/blogs")
            .header("authorization", "Bearer console-token");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(
                r#"{{"items":[{{"id":"{BLOG_ID}","title":"Notes from the Rwenzori","status":"published","created_at":"2025-02-01T10:00:00Z"}}]}}"#
            ));
    });
    let archive = server.mock(|when, then| {
        when.method("POST")
            .path(format!("/api/admin/blogs/{BLOG_ID}/archive"));
        then.status(204);
    });

    let token = temp_file("console-token\n");
    collabdesk()
        .args(["--api-base-url", &server.base_url()])
        .arg("--api-token-file")
        .arg(token.path())
        .args(["blogs", "archive", "--id", BLOG_ID])
        .assert()
        .success()
        .stdout(contains("Archive blog \"Notes from the Rwenzori\"?"))
        .stdout(contains("ok: Blog \"Notes from the Rwenzori\" archived"));

    archive.assert();
    list.assert_hits(2);
}

#[test]
fn missing_base_url_fails_fast() {
    collabdesk()
        .args(["events", "list"])
        .assert()
        .failure()
        .stderr(contains("api.base_url is required"));
}
