mod common;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use common::*;
use fitstake_core::*;

/// Én forespørsel, ett svar. Returnerer base-URL og tråden som serverer.
fn serve_once(status: &'static str, body: String) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("header") == 0 {
                break;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut payload = vec![0u8; content_length];
        reader.read_exact(&mut payload).expect("body");

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write");
        stream.flush().expect("flush");

        format!("{}{}", request_line.trim_end(), String::from_utf8_lossy(&payload))
    });

    (base, handle)
}

fn verifier(base: &str) -> RemoteVerifier {
    RemoteVerifier::new(base, Duration::from_secs(5))
}

#[test]
fn ok_envelope_yields_verdict() {
    let t = easy_run(0);
    let expected = verify_session(&t);
    let body = serde_json::json!({ "data": expected, "success": true }).to_string();
    let (base, server) = serve_once("200 OK", body);

    let got = verifier(&base).verify(&t).unwrap();
    assert_eq!(got, expected);
    assert!(got.is_verified);

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /sessions/verify"), "{request}");
    assert!(request.contains("\"sessionId\""), "{request}");
    assert!(request.contains("\"gpsPoints\""), "{request}");
}

#[test]
fn reported_failure_carries_service_message() {
    let body = r#"{"success": false, "message": "down"}"#.to_string();
    let (base, server) = serve_once("200 OK", body);

    let err = verifier(&base).verify(&easy_run(0)).unwrap_err();
    assert_eq!(err.reason, "down");
    server.join().unwrap();
}

#[test]
fn server_error_status_is_unavailable() {
    let (base, server) = serve_once("500 Internal Server Error", "{}".into());

    let err = verifier(&base).verify(&easy_run(0)).unwrap_err();
    assert!(err.reason.contains("answered 500"), "{}", err.reason);
    server.join().unwrap();
}

#[test]
fn non_json_body_is_unavailable() {
    let (base, server) = serve_once("200 OK", "not json".into());

    let err = verifier(&base).verify(&easy_run(0)).unwrap_err();
    assert!(err.reason.contains("undecodable response"), "{}", err.reason);
    server.join().unwrap();
}

#[test]
fn envelope_without_data_is_unavailable() {
    let (base, server) = serve_once("200 OK", r#"{"success": true}"#.into());

    let err = verifier(&base).verify(&easy_run(0)).unwrap_err();
    assert_eq!(err.reason, "response without data");
    server.join().unwrap();
}

#[test]
fn transport_error_names_url_once() {
    // ledig port: bind og slipp
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let base = format!("http://127.0.0.1:{port}");

    let err = verifier(&base).verify(&easy_run(0)).unwrap_err();
    assert!(err.reason.matches("/sessions/verify").count() <= 1, "{}", err.reason);
}
