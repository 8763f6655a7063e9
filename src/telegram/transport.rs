use crate::error::NotifyError;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Serialize;
use std::fs::File;
use std::time::Duration;

/// Parse mode requested for every text message
pub const PARSE_MODE: &str = "HTML";

/// JSON body of a `sendMessage` call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePayload {
    pub chat_id: String,
    pub text: String,
    pub parse_mode: String,
    pub disable_notification: bool,
}

impl MessagePayload {
    pub fn new(chat_id: &str, text: &str, silent: bool) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            parse_mode: PARSE_MODE.to_string(),
            disable_notification: silent,
        }
    }
}

/// Multipart fields of a `sendDocument` call
///
/// Owns the open file handle; the handle is closed once the transport has
/// consumed the upload.
#[derive(Debug)]
pub struct DocumentUpload {
    pub chat_id: String,
    pub caption: String,
    pub file_name: String,
    pub file: File,
    pub length: u64,
}

/// Raw outcome of an HTTP exchange with the Bot API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiReply {
    pub status: u16,
    pub body: String,
}

impl ApiReply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    /// Turn anything but HTTP 200 into `NotifyError::Rejected`
    pub fn into_result(self) -> Result<(), NotifyError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// One blocking request/response exchange with the Bot API
///
/// Implementations report the HTTP status they received; deciding whether
/// that status is a success is left to the caller.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// POST a JSON message body
    fn post_message(
        &self,
        url: &str,
        payload: &MessagePayload,
        timeout: Duration,
    ) -> Result<ApiReply, NotifyError>;

    /// POST a multipart document upload
    fn post_document(
        &self,
        url: &str,
        upload: DocumentUpload,
        timeout: Duration,
    ) -> Result<ApiReply, NotifyError>;
}

/// Transport backed by reqwest's blocking client
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport honoring the system proxy settings
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().build()?,
        })
    }

    /// Create a transport that connects directly, ignoring proxy variables
    pub fn without_proxy() -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().no_proxy().build()?,
        })
    }

    fn read_reply(response: reqwest::blocking::Response) -> Result<ApiReply, NotifyError> {
        let status = response.status().as_u16();
        let body = response.text().map_err(strip_url)?;
        Ok(ApiReply { status, body })
    }
}

/// reqwest errors carry the request URL, which embeds the bot token
fn strip_url(error: reqwest::Error) -> NotifyError {
    NotifyError::Http(error.without_url())
}

impl Transport for HttpTransport {
    fn post_message(
        &self,
        url: &str,
        payload: &MessagePayload,
        timeout: Duration,
    ) -> Result<ApiReply, NotifyError> {
        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(payload)
            .send()
            .map_err(strip_url)?;

        Self::read_reply(response)
    }

    fn post_document(
        &self,
        url: &str,
        upload: DocumentUpload,
        timeout: Duration,
    ) -> Result<ApiReply, NotifyError> {
        let DocumentUpload {
            chat_id,
            caption,
            file_name,
            file,
            length,
        } = upload;

        let document = Part::reader_with_length(file, length).file_name(file_name);
        let form = Form::new()
            .text("chat_id", chat_id)
            .text("caption", caption)
            .part("document", document);

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .multipart(form)
            .send()
            .map_err(strip_url)?;

        Self::read_reply(response)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Serve a single canned HTTP response on loopback
    ///
    /// Returns the base URL and a handle yielding the raw request text.
    pub(crate) fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            request
        });

        (format!("http://{}", addr), handle)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if let Some(header_end) = find(&buf, b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let body = &buf[header_end + 4..];

                if headers.contains("transfer-encoding: chunked") {
                    if find(body, b"0\r\n\r\n").is_some() {
                        break;
                    }
                    continue;
                }

                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if body.len() >= length {
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::serve_once;
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    #[test]
    fn test_message_payload_json() {
        let payload = MessagePayload::new("-100", "<b>hi</b>", true);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "chat_id": "-100",
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "disable_notification": true
            })
        );
    }

    #[test]
    fn test_api_reply_status_handling() {
        let ok = ApiReply {
            status: 200,
            body: "{\"ok\":true}".to_string(),
        };
        assert!(ok.is_success());
        assert!(ok.into_result().is_ok());

        let rejected = ApiReply {
            status: 400,
            body: "Bad Request: chat not found".to_string(),
        };
        assert!(!rejected.is_success());
        match rejected.into_result() {
            Err(NotifyError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "Bad Request: chat not found");
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }

        // Other 2xx codes are not what the Bot API returns on success
        let accepted = ApiReply {
            status: 204,
            body: String::new(),
        };
        assert!(!accepted.is_success());
    }

    #[test]
    fn test_post_message_over_http() {
        let (base, server) = serve_once("200 OK", r#"{"ok":true,"result":{}}"#);
        let transport = HttpTransport::without_proxy().unwrap();
        let payload = MessagePayload::new("42", "hello", false);

        let reply = transport
            .post_message(
                &format!("{}/bot1:TEST/sendMessage", base),
                &payload,
                Duration::from_secs(5),
            )
            .unwrap();
        assert_eq!(reply.status, 200);
        assert!(reply.body.contains("\"ok\":true"));

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /bot1:TEST/sendMessage HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: application/json"));
        assert!(request.contains("\"chat_id\":\"42\""));
        assert!(request.contains("\"parse_mode\":\"HTML\""));
        assert!(request.contains("\"disable_notification\":false"));
    }

    #[test]
    fn test_post_message_reports_non_success_status() {
        let (base, server) = serve_once(
            "400 Bad Request",
            r#"{"ok":false,"description":"Bad Request: chat not found"}"#,
        );
        let transport = HttpTransport::without_proxy().unwrap();

        let reply = transport
            .post_message(
                &format!("{}/bot1:TEST/sendMessage", base),
                &MessagePayload::new("0", "x", true),
                Duration::from_secs(5),
            )
            .unwrap();
        server.join().unwrap();

        assert_eq!(reply.status, 400);
        assert!(reply.body.contains("chat not found"));
    }

    #[test]
    fn test_post_document_over_http() {
        let (base, server) = serve_once("200 OK", r#"{"ok":true}"#);
        let transport = HttpTransport::without_proxy().unwrap();

        let mut source = tempfile::NamedTempFile::new().unwrap();
        source.write_all(b"asset,price\ngold,2350.1\n").unwrap();
        let file = source.reopen().unwrap();
        let length = file.metadata().unwrap().len();

        let upload = DocumentUpload {
            chat_id: "42".to_string(),
            caption: "daily prices".to_string(),
            file_name: "prices.csv".to_string(),
            file,
            length,
        };

        let reply = transport
            .post_document(
                &format!("{}/bot1:TEST/sendDocument", base),
                upload,
                Duration::from_secs(5),
            )
            .unwrap();
        assert!(reply.is_success());

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /bot1:TEST/sendDocument HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains("name=\"chat_id\""));
        assert!(request.contains("daily prices"));
        assert!(request.contains("name=\"document\"; filename=\"prices.csv\""));
        assert!(request.contains("gold,2350.1"));
    }

    #[test]
    fn test_transport_error_hides_url() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let transport = HttpTransport::without_proxy().unwrap();

        let result = transport.post_message(
            &format!("http://127.0.0.1:{}/botSECRET-TOKEN/sendMessage", port),
            &MessagePayload::new("1", "x", false),
            Duration::from_secs(2),
        );

        match result {
            Err(NotifyError::Http(e)) => {
                assert!(e.url().is_none());
                assert!(!e.to_string().contains("SECRET-TOKEN"));
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }
}
