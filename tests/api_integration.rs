#![cfg(feature = "api")]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

const STATE_KEYS: &[&str] = &[
    "at",
    "rate_code",
    "event_count",
    "state",
    "preheat_in_progress",
    "critical_peak_coming",
    "current_peak",
    "next_peak",
    "next_critical_peak",
    "next_preheat",
    "next_anchor",
];

const PEAK_KEYS: &[&str] = &[
    "offer", "start", "end", "time_slot", "sector", "duration", "critical", "preheat", "anchor",
];

struct ChildGuard {
    child: Child,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[test]
fn api_state_and_peaks_over_http() {
    let port = allocate_port();
    let addr = format!("127.0.0.1:{port}");
    let _child = spawn_api_process(port);

    wait_for_server(&addr, Duration::from_secs(8));

    let (state_status, state_body) =
        http_get(&addr, "/state").expect("/state request should succeed");
    assert_eq!(state_status, 200);

    let state: Value = serde_json::from_str(&state_body).expect("state body should be JSON object");
    let state_obj = state.as_object().expect("state should be an object");
    assert_has_keys(state_obj, STATE_KEYS);
    assert_eq!(state_obj.get("state").and_then(Value::as_str), Some("pre-heat in progress"));
    assert_eq!(state_obj.get("event_count").and_then(Value::as_u64), Some(2));

    let (peaks_status, peaks_body) = http_get(&addr, "/peaks?from=2024-12-16&to=2024-12-16")
        .expect("/peaks request should succeed");
    assert_eq!(peaks_status, 200);

    let peaks: Value = serde_json::from_str(&peaks_body).expect("peaks body should be JSON array");
    let rows = peaks.as_array().expect("peaks should be an array");
    assert_eq!(rows.len(), 1);
    for row in rows {
        assert_has_keys(row.as_object().expect("row should be an object"), PEAK_KEYS);
    }

    let (bad_status, _) = http_get(&addr, "/peaks?from=2024-12-17&to=2024-12-16")
        .expect("/peaks request should succeed");
    assert_eq!(bad_status, 400);
}

fn allocate_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("ephemeral port bind should succeed");
    let port = listener
        .local_addr()
        .expect("local_addr should be available")
        .port();
    drop(listener);
    port
}

fn spawn_api_process(port: u16) -> ChildGuard {
    let child = Command::new(env!("CARGO_BIN_EXE_winter-peaks"))
        .args([
            "--events",
            "tests/fixtures/peak_events.json",
            "--at",
            "2024-12-15 15:00",
            "--serve",
            "--port",
            &port.to_string(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("winter-peaks process should spawn");

    ChildGuard { child }
}

fn wait_for_server(addr: &str, timeout: Duration) {
    let start = Instant::now();
    loop {
        if let Ok((200, _)) = http_get(addr, "/state") {
            return;
        }

        if start.elapsed() >= timeout {
            panic!("timed out waiting for API server on {addr}");
        }

        thread::sleep(Duration::from_millis(50));
    }
}

fn http_get(addr: &str, path: &str) -> Result<(u16, String), String> {
    let mut stream = TcpStream::connect(addr).map_err(|err| format!("connect: {err}"))?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(request.as_bytes())
        .map_err(|err| format!("write: {err}"))?;

    let mut raw = String::new();
    stream
        .read_to_string(&mut raw)
        .map_err(|err| format!("read: {err}"))?;

    let (head, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| "invalid HTTP response".to_string())?;
    let status_line = head
        .lines()
        .next()
        .ok_or_else(|| "missing status line".to_string())?;
    let status_code = status_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| "missing status code".to_string())?
        .parse::<u16>()
        .map_err(|err| format!("invalid status code: {err}"))?;

    Ok((status_code, body.to_string()))
}

fn assert_has_keys(object: &serde_json::Map<String, Value>, keys: &[&str]) {
    for key in keys {
        assert!(object.contains_key(*key), "missing key: {key}");
    }
}
