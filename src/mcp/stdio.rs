//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout
//!
//! Each request runs on its own task so a slow embedding does not block
//! `ping`. A single writer task owns the output so lines never interleave.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::server::McpServer;
use crate::error::{Error, Result};

/// Serve MCP over the process's stdin and stdout until stdin closes
pub async fn serve_stdio(server: Arc<McpServer>) -> Result<()> {
    info!("Serving MCP over stdio");
    serve(server, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Serve MCP over any line-oriented byte stream pair
pub async fn serve<R, W>(server: Arc<McpServer>, reader: R, writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                return Err(Error::connection(format!("Failed to read MCP input: {}", e)).with_source(e));
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let server = server.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let Some(response) = server.handle_message(&line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(text) => {
                    if tx.send(text).await.is_err() {
                        debug!("Output closed before response was written");
                    }
                }
                Err(e) => error!("Failed to encode MCP response: {}", e),
            }
        });
    }

    debug!("Input closed, draining responses");
    // In-flight tasks hold clones of `tx`; the writer ends once they finish
    drop(tx);
    match writer_task.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::connection(format!("Failed to write MCP output: {}", e)).with_source(e)),
        Err(e) => Err(Error::connection(format!("MCP writer task failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::server::tests::test_server;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_requests_answered_until_eof() {
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}).to_string(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            String::new(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}).to_string(),
        ]
        .join("\n");

        let (output, mut reader) = tokio::io::duplex(64 * 1024);
        serve(Arc::new(test_server()), input.as_bytes(), output)
            .await
            .unwrap();

        let mut raw = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut reader, &mut raw)
            .await
            .unwrap();
        let mut responses: Vec<Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        responses.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert!(responses[0]["result"]["serverInfo"].is_object());
        assert_eq!(responses[1]["result"]["tools"].as_array().unwrap().len(), 2);
    }
}
