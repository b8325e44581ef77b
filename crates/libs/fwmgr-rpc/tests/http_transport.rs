#![cfg(feature = "http")]

use fwmgr_rpc::{
    ClientError, HttpTransport, HttpTransportConfig, Method, ObjectKind, ObjectTarget, Session,
    SessionConfig,
};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

struct HttpRequest {
    http_method: String,
    path: String,
    content_type: Option<String>,
    body: Value,
}

/// Serves one canned reply per accepted connection and returns what it saw.
fn serve<B>(replies: Vec<(u16, B)>) -> (String, thread::JoinHandle<Vec<HttpRequest>>)
where
    B: AsRef<[u8]> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let worker = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in replies {
            let (mut stream, _) = listener.accept().unwrap();
            seen.push(read_http_request(&mut stream));
            write_http_response(&mut stream, status, body.as_ref());
        }
        seen
    });

    (format!("http://127.0.0.1:{}", addr.port()), worker)
}

fn session_for(base_url: &str) -> Session<HttpTransport> {
    let transport = HttpTransport::new(&HttpTransportConfig::new(base_url)).unwrap();
    Session::new(transport, SessionConfig::default()).unwrap().with_credentials("admin", "pw")
}

fn entry(url: &str, data: Option<Value>) -> Value {
    let mut entry = json!({"url": url, "status": {"code": 0, "message": "OK"}});
    if let Some(data) = data {
        entry["data"] = data;
    }
    entry
}

#[test]
fn login_query_logout_over_http() {
    let address = "/pm/config/adom/root/obj/firewall/address";
    let (base_url, worker) = serve(vec![
        (200, json!({"session": "tok-9", "result": [entry("/sys/login/user", None)]}).to_string()),
        (
            200,
            json!({"result": [entry("/dvmdb/adom", Some(json!([{"name": "root"}, {"name": "lab"}])))]})
                .to_string(),
        ),
        (200, json!({"result": [entry(address, Some(json!([{"name": "all"}])))]}).to_string()),
        (200, json!({"result": [entry("/sys/logout", None)]}).to_string()),
    ]);

    let mut session = session_for(&base_url);
    session.login().unwrap();
    assert_eq!(session.session_token(), Some("tok-9"));
    assert_eq!(session.known_domains(), ["lab".to_owned(), "root".to_owned()]);

    let items = session.list_objects(&ObjectTarget::new(ObjectKind::Address), &[]).unwrap();
    assert_eq!(items, vec![json!({"name": "all"})]);

    session.logout().unwrap();
    assert!(!session.is_authenticated());

    let seen = worker.join().unwrap();
    assert_eq!(seen.len(), 4);
    for request in &seen {
        assert_eq!(request.http_method, "POST");
        assert_eq!(request.path, "/jsonrpc");
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
    }

    let ids = seen.iter().map(|request| request.body["id"].as_u64().unwrap()).collect::<Vec<_>>();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert!(seen[0].body.get("session").is_none());
    assert_eq!(seen[0].body["params"][0]["data"], json!({"user": "admin", "passwd": "pw"}));
    assert_eq!(seen[2].body["session"], "tok-9");
    assert_eq!(seen[2].body["verbose"], 1);
    assert_eq!(seen[3].body["method"], "exec");
}

#[test]
fn non_ok_status_surfaces_as_http_error() {
    let (base_url, worker) = serve(vec![(503, "maintenance".to_owned())]);

    let mut session = session_for(&base_url);
    let err = session.exec_single(Method::Get, "/sys/status", None).unwrap_err();

    assert_eq!(err, ClientError::Http { code: 503, body: "maintenance".to_owned() });
    assert_eq!(session.last_transaction_id(), Some(1));
    worker.join().unwrap();
}

#[test]
fn non_json_body_is_malformed() {
    let (base_url, worker) = serve(vec![(200, "<html>login</html>".to_owned())]);

    let mut session = session_for(&base_url);
    let err = session.exec_single(Method::Get, "/sys/status", None).unwrap_err();

    assert_eq!(err, ClientError::MalformedResponse { raw_body: "<html>login</html>".to_owned() });
    worker.join().unwrap();
}

#[test]
fn non_utf8_error_page_keeps_its_status() {
    let (base_url, worker) = serve(vec![(502, vec![b'<', 0xff, 0xfe, b'>'])]);

    let mut session = session_for(&base_url);
    let err = session.exec_single(Method::Get, "/sys/status", None).unwrap_err();

    assert_eq!(err, ClientError::Http { code: 502, body: "<\u{fffd}\u{fffd}>".to_owned() });
    worker.join().unwrap();
}

#[test]
fn non_utf8_ok_body_is_malformed() {
    let (base_url, worker) = serve(vec![(200, vec![b'<', 0xff, 0xfe, b'>'])]);

    let mut session = session_for(&base_url);
    let err = session.exec_single(Method::Get, "/sys/status", None).unwrap_err();

    assert_eq!(err, ClientError::MalformedResponse { raw_body: "<\u{fffd}\u{fffd}>".to_owned() });
    worker.join().unwrap();
}

#[test]
fn unreachable_appliance_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut config = HttpTransportConfig::new(format!("http://127.0.0.1:{port}"));
    config.connect_timeout_ms = 200;
    let transport = HttpTransport::new(&config).unwrap();
    let mut session = Session::new(transport, SessionConfig::default()).unwrap();

    let err = session.exec_single(Method::Get, "/sys/status", None).unwrap_err();

    let message = match err {
        ClientError::Transport(message) => message,
        other => panic!("expected transport error, got {other:?}"),
    };
    assert!(message.contains("rpc request to"));
    assert!(message.contains("/jsonrpc"));
}

#[test]
fn failed_entry_maps_to_rpc_error() {
    let (base_url, worker) = serve(vec![(
        200,
        json!({"result": [{"url": "/sys/status", "status": {"code": -11, "message": "No permission"}}]})
            .to_string(),
    )]);

    let mut session = session_for(&base_url);
    let err = session.exec_single(Method::Get, "/sys/status", None).unwrap_err();

    assert_eq!(err.rpc_code(), Some(-11));
    assert!(err.to_string().contains("No permission"));
    let seen = worker.join().unwrap();
    assert_eq!(seen[0].body["method"], "get");
}

fn read_http_request(stream: &mut TcpStream) -> HttpRequest {
    let mut bytes = Vec::new();
    let mut header_end = None;
    let mut content_length = 0usize;

    loop {
        let mut buf = [0u8; 1024];
        let read = stream.read(&mut buf).unwrap();
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&buf[..read]);

        if header_end.is_none() {
            if let Some(pos) = find_header_end(&bytes) {
                header_end = Some(pos);
                let headers = String::from_utf8_lossy(&bytes[..pos]);
                content_length = header_value(&headers, "content-length")
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(0);
            }
        }

        if let Some(pos) = header_end {
            if bytes.len() >= pos + 4 + content_length {
                break;
            }
        }
    }

    let header_end = header_end.expect("valid http request headers");
    let headers = String::from_utf8_lossy(&bytes[..header_end]).to_string();
    let mut parts = headers.lines().next().unwrap_or_default().split_whitespace();
    let http_method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();
    let content_type = header_value(&headers, "content-type");
    let body = serde_json::from_slice(&bytes[header_end + 4..]).unwrap_or(Value::Null);

    HttpRequest { http_method, path, content_type, body }
}

fn write_http_response(stream: &mut TcpStream, status_code: u16, body: &[u8]) {
    let status_text = match status_code {
        200 => "OK",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_code,
        status_text,
        body.len()
    );
    stream.write_all(header.as_bytes()).unwrap();
    stream.write_all(body).unwrap();
    stream.flush().unwrap();
}

fn find_header_end(bytes: &[u8]) -> Option<usize> {
    bytes.windows(4).position(|w| w == b"\r\n\r\n")
}

fn header_value(headers: &str, name: &str) -> Option<String> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim().to_string())
    })
}
