use std::sync::Arc;

use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

use super::{credentials_file_with, fixture_json};

const TOKEN_RESPONSE: &str =
    r#"{"access_token":"ya29.test-access-token","token_type":"Bearer","expires_in":3600}"#;

/// Starts an OAuth token endpoint on localhost that answers every request with a valid token.
///
/// Returns the `token_uri` to put in the credentials file.
pub async fn spawn_token_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(answer_token_request(stream));
        }
    });

    format!("http://{addr}/token")
}

/// Starts a token endpoint that accepts connections but never replies.
///
/// The returned `Notify` fires once the first connection has been accepted.
pub async fn spawn_silent_token_server() -> (String, Arc<Notify>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(Notify::new());

    let notify = Arc::clone(&accepted);
    tokio::spawn(async move {
        // Held open so the client keeps waiting on a response
        let mut open = Vec::new();
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            open.push(stream);
            notify.notify_one();
        }
    });

    (format!("http://{addr}/token"), accepted)
}

/// Fixture credentials with `token_uri` pointing at `token_uri`
pub fn credentials_with_token_uri(token_uri: &str) -> NamedTempFile {
    let mut json = fixture_json();
    json["token_uri"] = token_uri.into();
    credentials_file_with(&json.to_string())
}

async fn answer_token_request(mut stream: TcpStream) {
    let mut request = Vec::new();
    let mut chunk = [0u8; 4096];

    // Read headers, then the form body announced by Content-Length
    loop {
        let Ok(read) = stream.read(&mut chunk).await else {
            return;
        };
        if read == 0 {
            return;
        }
        request.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&request);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        TOKEN_RESPONSE.len(),
        TOKEN_RESPONSE
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}
