//! A scripted HTTP server for exercising the Places client end to end.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Serves one scripted response per accepted connection, in order.
///
/// The request target of each connection is recorded so tests can inspect
/// the query string the client sent.
pub struct StubServer {
    base_url: String,
    targets: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    /// Start serving `responses` as `(status, body)` pairs on a loopback port.
    pub fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap_or_else(|err| {
            panic!("failed to bind stub server: {err}");
        });
        let address = listener.local_addr().unwrap_or_else(|err| {
            panic!("failed to read stub server address: {err}");
        });
        let targets = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&targets);

        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                let Ok(read_half) = stream.try_clone() else {
                    return;
                };
                let mut reader = BufReader::new(read_half);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    return;
                }
                loop {
                    let mut header = String::new();
                    match reader.read_line(&mut header) {
                        Ok(0) => break,
                        Ok(_) if header == "\r\n" => break,
                        Ok(_) => {}
                        Err(_) => return,
                    }
                }
                let target = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .to_owned();
                log.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(target);

                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\n\
                     Content-Length: {length}\r\nConnection: close\r\n\r\n{body}",
                    reason = reason(status),
                    length = body.len(),
                );
                let mut writer = stream;
                if writer.write_all(response.as_bytes()).is_err() {
                    return;
                }
                let _ = writer.flush();
            }
        });

        Self {
            base_url: format!("http://{address}/maps/api/place/nearbysearch/json"),
            targets,
        }
    }

    /// Endpoint to configure the client with.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Request targets (path and query) received so far.
    pub fn targets(&self) -> Vec<String> {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// A Nearby Search payload carrying `results` and an optional token.
pub fn nearby_payload(status: &str, results: &[&str], token: Option<&str>) -> String {
    let token = token
        .map(|t| format!(r#","next_page_token":"{t}""#))
        .unwrap_or_default();
    format!(
        r#"{{"status":"{status}","results":[{}]{token}}}"#,
        results.join(",")
    )
}

/// One Nearby Search result for a place at `(lat, lng)`.
pub fn place_json(place_id: &str, name: &str, lat: f64, lng: f64, types: &[&str]) -> String {
    let types = types
        .iter()
        .map(|t| format!(r#""{t}""#))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        r#"{{"place_id":"{place_id}","name":"{name}","geometry":{{"location":{{"lat":{lat},"lng":{lng}}}}},"types":[{types}],"rating":4.6,"user_ratings_total":1800,"vicinity":"Old Town","photos":[{{"photo_reference":"ph-{place_id}"}}]}}"#
    )
}
