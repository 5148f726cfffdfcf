//! Integration tests for the `veriport serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port,
//! makes HTTP requests, and verifies the responses.

use std::io::Read;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so parallel `cargo test --workspace`
/// runs (separate test binaries) don't collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 21000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

/// Helper: start the veriport serve process on the given port.
fn start_server(port: u16, envs: &[(&str, &str)]) -> Child {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_veriport"));
    cmd.arg("serve").arg("--port").arg(port.to_string());
    for (name, value) in envs {
        cmd.env(name, value);
    }
    // Redirect stdout/stderr to avoid blocking
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = cmd.spawn().expect("failed to start veriport serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{}", port)).is_ok() {
            return child;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    child
}

/// Helper: make an HTTP request and return (status, body).
fn http_request(
    port: u16,
    method: &str,
    path: &str,
    extra_headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{}", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();

    let mut header_lines = String::new();
    for (name, value) in extra_headers {
        header_lines.push_str(&format!("{}: {}\r\n", name, value));
    }
    let body = body.unwrap_or("");
    if !body.is_empty() {
        header_lines.push_str("Content-Type: application/json\r\n");
        header_lines.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }

    let request = format!(
        "{} {} HTTP/1.1\r\nHost: localhost:{}\r\n{}Connection: close\r\n\r\n{}",
        method, path, port, header_lines, body
    );
    std::io::Write::write_all(&mut stream, request.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);

    parse_http_response(&response)
}

fn http_get(port: u16, path: &str) -> (u16, String) {
    http_request(port, "GET", path, &[], None)
}

fn http_post(port: u16, path: &str, body: &str) -> (u16, String) {
    http_request(port, "POST", path, &[], Some(body))
}

/// Parse an HTTP response into (status_code, body).
fn parse_http_response(response: &str) -> (u16, String) {
    let parts: Vec<&str> = response.splitn(2, "\r\n\r\n").collect();
    let headers = parts.first().unwrap_or(&"").to_string();
    let body = parts.get(1).unwrap_or(&"").to_string();

    let status_line = headers.lines().next().unwrap_or("");
    let status = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    // Handle chunked transfer encoding
    let body = if headers
        .to_lowercase()
        .contains("transfer-encoding: chunked")
    {
        decode_chunked(&body)
    } else {
        body
    };

    (status, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size_str = &remaining[..line_end];
        let size = match usize::from_str_radix(size_str.trim(), 16) {
            Ok(s) => s,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > remaining.len() {
            result.push_str(&remaining[chunk_start..]);
            break;
        }
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = if chunk_end + 2 <= remaining.len() {
            &remaining[chunk_end + 2..]
        } else {
            ""
        };
    }

    result
}

/// A minimal valid submission body. "aGVsbG8=" is base64 for "hello".
fn submission(status: &str) -> String {
    serde_json::json!({
        "studentId": "S-1042",
        "studentName": "Alice Johnson",
        "class": "10th Grade",
        "year": 2024,
        "status": status,
        "file": {
            "filename": "card.pdf",
            "mediaType": "application/pdf",
            "dataBase64": "aGVsbG8="
        }
    })
    .to_string()
}

#[test]
fn health_returns_200() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let (status, body) = http_get(port, "/health");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "ok");
}

#[test]
fn verify_unknown_token_is_invalid_with_null_data() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let (status, body) = http_get(port, "/verify/00000000-0000-4000-8000-000000000000");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json, serde_json::json!({"status": "Invalid", "data": null}));
}

#[test]
fn submit_then_verify_round_trip() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let (status, body) = http_post(port, "/reports", &submission("Passed"));
    assert_eq!(status, 201, "unexpected response: {body}");
    let created: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let token = created["token"].as_str().expect("token").to_string();

    let (status, body) = http_get(port, &format!("/verify/{token}"));
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "Valid");
    assert_eq!(json["data"]["studentName"], "Alice Johnson");
    assert_eq!(json["data"]["class"], "10th Grade");
    assert_eq!(json["data"]["status"], "Passed");
    assert_eq!(json["data"]["year"], 2024);

    let (status, body) = http_get(port, "/reports");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["total"], 1);
    assert_eq!(json["pending"], 0);
    assert_eq!(json["reports"][0]["verificationId"], token);
}

#[test]
fn submit_rejects_year_below_floor() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let body = serde_json::json!({
        "studentId": "S-1",
        "studentName": "Bob",
        "class": "9th Grade",
        "year": 1999,
        "status": "Passed",
        "file": {
            "filename": "card.pdf",
            "mediaType": "application/pdf",
            "dataBase64": "aGVsbG8="
        }
    })
    .to_string();
    let (status, body) = http_post(port, "/reports", &body);
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 400);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert!(json["fields"]["year"].is_array());
}

#[test]
fn submit_rejects_text_plain_file() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let body = serde_json::json!({
        "studentId": "S-1",
        "studentName": "Bob",
        "class": "9th Grade",
        "year": 2024,
        "status": "Passed",
        "file": {
            "filename": "notes.txt",
            "mediaType": "text/plain",
            "dataBase64": "aGVsbG8="
        }
    })
    .to_string();
    let (status, _body) = http_post(port, "/reports", &body);

    // Nothing was written.
    let (_, list_body) = http_get(port, "/reports");
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 400);
    let json: serde_json::Value = serde_json::from_str(&list_body).expect("valid JSON");
    assert_eq!(json["total"], 0);
}

#[test]
fn delete_then_second_delete_is_404() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let (_, body) = http_post(port, "/reports", &submission("Failed"));
    let created: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let key = created["recordKey"].as_str().expect("recordKey").to_string();
    let token = created["token"].as_str().expect("token").to_string();

    let (status, _) = http_request(port, "DELETE", &format!("/reports/{key}"), &[], None);
    assert_eq!(status, 200);

    let (status, _) = http_request(port, "DELETE", &format!("/reports/{key}"), &[], None);
    assert_eq!(status, 404);

    // The token stays retired: verifies as Invalid, not as an error.
    let (status, body) = http_get(port, &format!("/verify/{token}"));
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json, serde_json::json!({"status": "Invalid", "data": null}));
}

#[test]
fn patch_rederives_verification_status() {
    let port = next_port();
    let mut child = start_server(port, &[]);

    let (_, body) = http_post(port, "/reports", &submission("Passed"));
    let created: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let key = created["recordKey"].as_str().expect("recordKey").to_string();
    let token = created["token"].as_str().expect("token").to_string();

    let (status, _) = http_request(
        port,
        "PATCH",
        &format!("/reports/{key}"),
        &[],
        Some(r#"{"status":"Failed"}"#),
    );
    assert_eq!(status, 200);

    let (status, body) = http_get(port, &format!("/verify/{token}"));
    child.kill().ok();
    child.wait().ok();

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json, serde_json::json!({"status": "Invalid", "data": null}));
}

#[test]
fn api_key_guards_management_but_not_verify() {
    let port = next_port();
    let mut child = start_server(port, &[("VERIPORT_API_KEY", "sekrit")]);

    // Public endpoints stay open.
    let (status, _) = http_get(port, "/health");
    assert_eq!(status, 200);
    let (status, _) = http_get(port, "/verify/some-token");
    assert_eq!(status, 200);

    // Management requires the key.
    let (status, _) = http_get(port, "/reports");
    assert_eq!(status, 401);
    let (status, _) = http_request(port, "GET", "/reports", &[("X-API-Key", "wrong")], None);
    assert_eq!(status, 403);
    let (status, _) = http_request(port, "GET", "/reports", &[("X-API-Key", "sekrit")], None);
    child.kill().ok();
    child.wait().ok();
    assert_eq!(status, 200);
}
