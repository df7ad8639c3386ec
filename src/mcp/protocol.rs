use super::types::*;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// Newline-delimited JSON-RPC; stdio by default
pub struct Protocol<R = BufReader<Stdin>, W = Stdout> {
    reader: R,
    writer: W,
}

impl Protocol {
    pub fn new() -> Self {
        Self::with_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> Protocol<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn with_io(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Next request, or `None` at end of input. Blank lines are skipped.
    pub async fn read_request(&mut self) -> Result<Option<JsonRpcRequest>> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line).await {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let request: JsonRpcRequest = serde_json::from_str(trimmed)?;
                    return Ok(Some(request));
                }
                Err(e) => {
                    tracing::warn!("Input closed with error: {}", e);
                    return Ok(None);
                }
            }
        }
    }

    /// Write one response line and flush
    pub async fn send_response(&mut self, response: JsonRpcResponse) -> Result<()> {
        let json = serde_json::to_string(&response)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub fn success_response<T: Serialize>(&self, id: Value, result: T) -> JsonRpcResponse<T> {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error_response(&self, id: Value, error: JsonRpcError) -> JsonRpcResponse {
        JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_reads_requests_and_skips_blank_lines() {
        let input = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n" as &[u8];
        let mut protocol = Protocol::with_io(input, Vec::new());

        let request = protocol.read_request().await.unwrap().unwrap();
        assert_eq!(request.method, "ping");
        assert_eq!(request.id, json!(1));
        assert!(protocol.read_request().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_line_is_an_error() {
        let mut protocol = Protocol::with_io(b"{not json}\n" as &[u8], Vec::new());
        assert!(protocol.read_request().await.is_err());
    }

    #[tokio::test]
    async fn test_responses_are_line_delimited() {
        let mut protocol = Protocol::with_io(b"" as &[u8], Vec::new());
        let ok = protocol.success_response(json!(7), json!({ "tools": [] }));
        let failed = protocol.error_response(json!(8), JsonRpcError::method_not_found());
        protocol.send_response(ok).await.unwrap();
        protocol.send_response(failed).await.unwrap();

        let written = String::from_utf8(protocol.into_writer()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"jsonrpc":"2.0","id":7,"result":{"tools":[]}}"#);
        assert!(lines[1].contains("-32601"));
        assert!(!lines[1].contains("result"));
    }
}
