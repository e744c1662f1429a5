use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use ff_lineup_terminal::backend_fetch::{HttpBackend, LeagueBackend, Registration};
use ff_lineup_terminal::config::{AppConfig, Website};
use ff_lineup_terminal::identity::SessionIdentity;
use ff_lineup_terminal::roster::RosterPayload;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Answers one request per canned `(status, body)` and hands back each raw request.
fn serve(responses: Vec<(u16, String)>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let raw = read_request(&mut stream);
            if tx.send(raw).is_err() {
                return;
            }
            let reason = if status == 200 { "OK" } else { "Internal Server Error" };
            let reply = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes());
        }
    });
    (base, rx)
}

fn read_request(stream: &mut TcpStream) -> String {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let body_len = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|len| len.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + body_len {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn next_request(rx: &mpsc::Receiver<String>) -> String {
    rx.recv_timeout(Duration::from_secs(5))
        .expect("server should see a request")
}

fn request_line(raw: &str) -> &str {
    raw.lines().next().unwrap_or_default()
}

fn identity_header(raw: &str) -> Option<String> {
    raw.lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("x-user-uuid")
                .then(|| value.trim().to_string())
        })
}

fn backend(base: &str) -> HttpBackend {
    HttpBackend::new(base, &AppConfig::default()).expect("backend builds")
}

fn identity() -> SessionIdentity {
    SessionIdentity::from_raw("abc-123").expect("valid identity")
}

#[test]
fn scoped_calls_carry_identity_header() {
    let (base, rx) = serve(vec![
        (200, "{}".to_string()),
        (200, read_fixture("league_catalog.json")),
        (200, read_fixture("league_data_flat.json")),
        (200, read_fixture("free_agents_legacy.json")),
    ]);
    let backend = backend(&base);
    let id = identity();

    backend
        .register_user(
            &id,
            &Registration {
                name: "gridiron_guru".to_string(),
                website: Website::Fleaflicker,
            },
        )
        .expect("registration accepted");
    let register = next_request(&rx);
    assert!(request_line(&register).starts_with("POST /load-sleeper-info "));
    assert_eq!(identity_header(&register).as_deref(), Some("abc-123"));
    assert!(register.contains(r#""name":"gridiron_guru""#));
    assert!(register.contains(r#""website":"Fleaflicker""#));

    let catalog = backend.fetch_catalog(&id).expect("catalog loads");
    assert!(!catalog.is_empty());
    let raw = next_request(&rx);
    assert!(request_line(&raw).starts_with("GET /load-cached-starts "));
    assert_eq!(identity_header(&raw).as_deref(), Some("abc-123"));

    let payload = backend.fetch_roster(&id, "My League & Co").expect("roster loads");
    assert!(matches!(payload, RosterPayload::Flat(_)));
    let raw = next_request(&rx);
    assert!(request_line(&raw).starts_with("GET /load-league-data?league=My+League+%26+Co "));
    assert_eq!(identity_header(&raw).as_deref(), Some("abc-123"));

    let recs = backend
        .fetch_free_agents(&id, "My League & Co")
        .expect("free agents load");
    assert!(!recs.is_empty());
    let raw = next_request(&rx);
    assert!(request_line(&raw).starts_with("GET /load-free-agent-data?league=My+League+%26+Co "));
    assert_eq!(identity_header(&raw).as_deref(), Some("abc-123"));
}

#[test]
fn last_run_is_sent_without_identity() {
    let (base, rx) = serve(vec![(200, read_fixture("last_run.json"))]);
    let info = backend(&base).last_run_info().expect("last run loads");
    assert_eq!(info.runtime, "2025-10-12 09:30 ET");

    let raw = next_request(&rx);
    assert!(request_line(&raw).starts_with("GET /load-last-run-info "));
    assert_eq!(identity_header(&raw), None);
}

#[test]
fn server_error_status_is_a_failure() {
    let (base, rx) = serve(vec![
        (500, r#"{"league_names": {"k1": "League One"}}"#.to_string()),
        (500, "boom".to_string()),
    ]);
    let backend = backend(&base);

    let err = backend
        .fetch_catalog(&identity())
        .expect_err("500 is not a catalog");
    let message = format!("{err:#}");
    assert!(message.contains("league catalog request failed"), "{message}");
    assert!(message.contains("http 500"), "{message}");
    next_request(&rx);

    let err = backend
        .fetch_roster(&identity(), "League One")
        .expect_err("500 is not a roster");
    assert!(format!("{err:#}").contains("http 500"));
}
