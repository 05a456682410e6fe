/// Listener
///
/// Long running read over a bridge `text/event-stream` resource. Every line
/// received is handed to a callback in stream order until the stream ends,
/// fails, or the cancellation token fires.
///
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::constants::HEADER_VALUE_TEXT_EVENT_STREAM;
use crate::error::{Error, Result};

pub type LineHandler = Box<dyn FnMut(String) + Send>;
pub type ErrorHandler = Box<dyn FnOnce(Error) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerOutcome {
    Cancelled,
    Completed,
    Failed,
}

/// Incremental body reader behind the listener.
#[async_trait]
pub trait EventSource: Send {
    /// Next chunk of the body, `None` once the transport is done.
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

pub struct HttpEventSource {
    response: Response,
}

impl HttpEventSource {
    pub async fn open(client: &Client, url: &str) -> Result<Self> {
        let response = client
            .get(url)
            .header(ACCEPT, HEADER_VALUE_TEXT_EVENT_STREAM)
            .send()
            .await
            .map_err(|e| Error::Stream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Stream(format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        Ok(Self { response })
    }
}

#[async_trait]
impl EventSource for HttpEventSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self
            .response
            .chunk()
            .await
            .map_err(|e| Error::Stream(e.to_string()))?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

/// Undelivered tail of the stream plus the running count of bytes delivered.
#[derive(Debug, Default)]
struct ReadCursor {
    buffer: Vec<u8>,
    consumed: u64,
}

impl ReadCursor {
    /// Appends a chunk and returns the complete lines it finished.
    fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|b| *b == b'\n') else {
            return vec![];
        };

        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        self.consumed += complete.len() as u64;
        split_lines(&complete)
    }

    /// Whatever is left after the last line feed.
    fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.consumed += rest.len() as u64;
        split_lines(&rest)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}

/// Drives `source` until it completes, fails, or `token` is cancelled.
pub async fn listen<S: EventSource>(
    mut source: S,
    token: CancellationToken,
    mut on_line: LineHandler,
    on_error: ErrorHandler,
) -> ListenerOutcome {
    let mut cursor = ReadCursor::default();

    loop {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => return ListenerOutcome::Cancelled,
            chunk = source.next_chunk() => chunk,
        };

        match chunk {
            Ok(Some(chunk)) => {
                for line in cursor.feed(&chunk) {
                    if token.is_cancelled() {
                        return ListenerOutcome::Cancelled;
                    }
                    log::debug!("{line}");
                    on_line(line);
                }
            }
            Ok(None) => {
                for line in cursor.finish() {
                    log::debug!("{line}");
                    on_line(line);
                }
                return ListenerOutcome::Completed;
            }
            Err(e) => {
                log::error!("Failed to activate event listener with error: {e}");
                on_error(e);
                return ListenerOutcome::Failed;
            }
        }
    }
}

/// Spawns `listen` on the runtime and returns at once.
pub fn activate<S: EventSource + 'static>(
    source: S,
    token: CancellationToken,
    on_line: LineHandler,
    on_error: ErrorHandler,
) -> JoinHandle<ListenerOutcome> {
    tokio::spawn(listen(source, token, on_line, on_error))
}

/// Opens `url` over HTTP and listens to it, both steps honouring `token`.
pub fn activate_http(
    client: Client,
    url: String,
    token: CancellationToken,
    on_line: LineHandler,
    on_error: ErrorHandler,
) -> JoinHandle<ListenerOutcome> {
    tokio::spawn(async move {
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return ListenerOutcome::Cancelled,
            opened = HttpEventSource::open(&client, &url) => opened,
        };

        match opened {
            Ok(source) => listen(source, token, on_line, on_error).await,
            Err(e) => {
                log::error!("Failed to activate event listener with error: {e}");
                on_error(e);
                ListenerOutcome::Failed
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::test_server::{SERVER_ERROR, serve_once};

    struct ScriptedSource {
        chunks: VecDeque<Result<Option<Vec<u8>>>>,
    }

    impl ScriptedSource {
        fn new(chunks: Vec<Result<Option<Vec<u8>>>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            self.chunks.pop_front().unwrap_or(Ok(None))
        }
    }

    struct PendingSource;

    #[async_trait]
    impl EventSource for PendingSource {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
            std::future::pending::<Result<Option<Vec<u8>>>>().await
        }
    }

    fn chunk(s: &str) -> Result<Option<Vec<u8>>> {
        Ok(Some(s.as_bytes().to_vec()))
    }

    fn recorder() -> (Arc<Mutex<Vec<String>>>, LineHandler) {
        let lines = Arc::new(Mutex::new(vec![]));
        let sink = lines.clone();
        (lines, Box::new(move |line| sink.lock().unwrap().push(line)))
    }

    fn error_recorder() -> (Arc<Mutex<Vec<String>>>, ErrorHandler) {
        let errors = Arc::new(Mutex::new(vec![]));
        let sink = errors.clone();
        (
            errors,
            Box::new(move |e| sink.lock().unwrap().push(e.to_string())),
        )
    }

    #[tokio::test]
    async fn test_lines_delivered_once_in_order() {
        let (lines, on_line) = recorder();
        let (errors, on_error) = error_recorder();
        let source = ScriptedSource::new(vec![chunk("a\n"), chunk("b\nc\n")]);

        let outcome = listen(source, CancellationToken::new(), on_line, on_error).await;

        assert_eq!(outcome, ListenerOutcome::Completed);
        assert_eq!(*lines.lock().unwrap(), vec!["a", "b", "c"]);
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sse_frames_split_across_chunks() {
        let (lines, on_line) = recorder();
        let (_, on_error) = error_recorder();
        let source = ScriptedSource::new(vec![
            chunk("id: 17\r\nevent: mess"),
            chunk("age\r\ndata: {\"from\":\"abc\"}\r\n\r\n"),
            chunk("data: tail"),
        ]);

        let outcome = listen(source, CancellationToken::new(), on_line, on_error).await;

        assert_eq!(outcome, ListenerOutcome::Completed);
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["id: 17", "event: message", "data: {\"from\":\"abc\"}", "data: tail"]
        );
    }

    #[tokio::test]
    async fn test_cancel_before_data() {
        let (lines, on_line) = recorder();
        let (errors, on_error) = error_recorder();
        let token = CancellationToken::new();
        token.cancel();

        let source = ScriptedSource::new(vec![chunk("a\n")]);
        let outcome = listen(source, token, on_line, on_error).await;

        assert_eq!(outcome, ListenerOutcome::Cancelled);
        assert!(lines.lock().unwrap().is_empty());
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_while_waiting() {
        let (lines, on_line) = recorder();
        let (errors, on_error) = error_recorder();
        let token = CancellationToken::new();

        let handle = activate(PendingSource, token.clone(), on_line, on_error);
        token.cancel();

        assert_eq!(handle.await.unwrap(), ListenerOutcome::Cancelled);
        assert!(lines.lock().unwrap().is_empty());
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_terminal() {
        let (lines, on_line) = recorder();
        let (errors, on_error) = error_recorder();
        let source = ScriptedSource::new(vec![
            chunk("a\n"),
            Err(Error::Stream("connection reset".to_string())),
            chunk("never\n"),
        ]);

        let outcome = listen(source, CancellationToken::new(), on_line, on_error).await;

        assert_eq!(outcome, ListenerOutcome::Failed);
        assert_eq!(*lines.lock().unwrap(), vec!["a"]);
        assert_eq!(
            *errors.lock().unwrap(),
            vec!["SSE request error: connection reset"]
        );
    }

    #[test]
    fn test_cursor_is_monotonic() {
        let mut cursor = ReadCursor::default();
        let mut last = 0;
        for part in ["he", "llo\nwor", "ld\n", "", "\n"] {
            cursor.feed(part.as_bytes());
            assert!(cursor.consumed >= last);
            last = cursor.consumed;
        }
        assert_eq!(cursor.consumed, "hello\nworld\n\n".len() as u64);
    }

    #[test]
    fn test_cursor_keeps_only_partial_line() {
        let mut cursor = ReadCursor::default();
        let heartbeat = b"event: heartbeat\n\n";

        for _ in 0..10_000 {
            assert_eq!(cursor.feed(heartbeat), vec!["event: heartbeat"]);
        }
        assert!(cursor.buffer.is_empty());
        assert_eq!(cursor.consumed, 10_000 * heartbeat.len() as u64);

        assert!(cursor.feed(b"data: {\"id\"").is_empty());
        assert_eq!(cursor.buffer, b"data: {\"id\"");
        assert_eq!(cursor.feed(b":1}\n"), vec!["data: {\"id\":1}"]);
        assert!(cursor.buffer.is_empty());
    }

    #[tokio::test]
    async fn test_http_stream_lines() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: 35\r\nconnection: close\r\n\r\nevent: message\r\ndata: AQID\r\n\r\nid: 7",
        )
        .await;
        let (lines, on_line) = recorder();
        let (errors, on_error) = error_recorder();

        let handle = activate_http(
            Client::new(),
            format!("{base}/bridge/events?client_id=a3f1c2"),
            CancellationToken::new(),
            on_line,
            on_error,
        );

        assert_eq!(handle.await.unwrap(), ListenerOutcome::Completed);
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["event: message", "data: AQID", "id: 7"]
        );
        assert!(errors.lock().unwrap().is_empty());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /bridge/events?client_id=a3f1c2 HTTP/1.1\r\n"));
        assert!(request.to_lowercase().contains("accept: text/event-stream\r\n"));
    }

    #[tokio::test]
    async fn test_http_error_status_reported_once() {
        let (base, server) = serve_once(SERVER_ERROR).await;
        let (lines, on_line) = recorder();
        let (errors, on_error) = error_recorder();

        let handle = activate_http(
            Client::new(),
            format!("{base}/bridge/events"),
            CancellationToken::new(),
            on_line,
            on_error,
        );

        assert_eq!(handle.await.unwrap(), ListenerOutcome::Failed);
        assert!(lines.lock().unwrap().is_empty());
        assert_eq!(
            *errors.lock().unwrap(),
            vec!["SSE request error: 500 Internal Server Error"]
        );
        server.await.unwrap();
    }
}
