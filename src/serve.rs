//! The `serve` command: one JSON request per stdin line, one JSON response
//! per stdout line.

use crate::error::{ErrorKind, Result};
use crate::request::RequestDecoder;
use async_stream::stream;
use exn::ResultExt;
use ferry_config::Config;
use ferry_download::{Daemon, Request};
use ferry_storage::BackendHandle;
use ferry_storage::backend::LocalBackend;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

pub async fn run(config: Config) -> Result<()> {
    let backend: BackendHandle = Arc::new(LocalBackend::new("local"));
    let mut daemon = Daemon::new(backend);
    let decoder = RequestDecoder::new(config);
    tracing::info!("Waiting for requests on stdin");
    pump(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), &decoder, &mut daemon).await
}

/// Feeds decoded lines from `reader` through the daemon, writing each
/// response to `writer` as soon as it is produced.
pub async fn pump<R, W>(reader: R, mut writer: W, decoder: &RequestDecoder, daemon: &mut Daemon) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let responses = ferry_download::serve(daemon, requests(reader, decoder));
    let mut responses = std::pin::pin!(responses);
    while let Some(response) = responses.next().await {
        let mut line = serde_json::to_vec(&response).or_raise(|| ErrorKind::Encode)?;
        line.push(b'\n');
        writer.write_all(&line).await.or_raise(|| ErrorKind::Output)?;
        writer.flush().await.or_raise(|| ErrorKind::Output)?;
    }
    Ok(())
}

fn requests<'a, R>(
    reader: R,
    decoder: &'a RequestDecoder,
) -> impl Stream<Item = std::result::Result<Request, ferry_download::error::Error>> + 'a
where
    R: AsyncBufRead + Unpin + 'a,
{
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => {
                    yield decoder.decode(&line);
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read requests");
                    break;
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_download::{DownloadStatus, Response};
    use time::macros::datetime;

    #[tokio::test]
    async fn test_pump() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a1b2.tmp");
        std::fs::write(&source, b"raw").unwrap();
        let mut config = Config::default();
        config.photo.download_folder = dir.path().join("photos");
        config.photo.subfolder = serde_json::from_str(r#"[["Text", "shoot", ""]]"#).unwrap();
        config.photo.name = serde_json::from_str(r#"[["Filename", "Name + extension", "Original Case"]]"#).unwrap();
        let decoder = RequestDecoder::new(config);

        let input = [
            r#"{"type":"session_started","downloads_today":{"date":"2024-03-09","count":0},"stored_sequence_no":1}"#.to_string(),
            String::new(),
            format!(
                r#"{{"type":"file","id":9,"source":{:?},"source_name":"IMG_0001.CR2","kind":"photo","metadata":{{}}}}"#,
                source.display().to_string()
            ),
            "{oops".to_string(),
            r#"{"type":"session_finished"}"#.to_string(),
        ]
        .join("\n");

        let backend: BackendHandle = Arc::new(LocalBackend::new("local"));
        let clock = Arc::new(|| datetime!(2024-03-09 16:00));
        let mut daemon = Daemon::new(backend).with_clock(clock);
        let mut output = Vec::new();
        pump(input.as_bytes(), &mut output, &decoder, &mut daemon).await.unwrap();

        let responses: Vec<Response> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        let Response::File(file) = &responses[0] else {
            panic!("expected a file result, got {:?}", responses[0]);
        };
        assert_eq!(file.id, 9);
        assert_eq!(file.status, DownloadStatus::Placed);
        assert!(dir.path().join("photos/shoot/IMG_0001.CR2").is_file());
        assert!(!source.exists());
        assert!(matches!(&responses[1], Response::Rejected { .. }));
        let Response::Session(session) = &responses[2] else {
            panic!("expected a session result, got {:?}", responses[2]);
        };
        assert_eq!((session.placed, session.failed), (1, 0));
    }
}
