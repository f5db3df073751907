//! Line-by-line relay of a byte stream into posted messages.

use std::future::Future;

use slackline_core::{Error, Result, SentMessage};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Read `input` until end of stream and hand every completed line to `post`.
///
/// Lines are posted as soon as their terminator arrives. A trailing fragment
/// without a terminator is posted at end of stream. Empty lines are skipped.
/// Bytes that are not valid UTF-8 are replaced, never fatal.
pub async fn relay_lines<R, F, Fut>(input: R, mut post: F) -> Result<Vec<SentMessage>>
where
    R: AsyncRead + Unpin,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<SentMessage>>,
{
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    let mut sent = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|e| Error::Stdin(e.to_string()))?;
        if read == 0 {
            break;
        }

        let line = strip_terminator(&buf);
        if line.is_empty() {
            debug!("Skipping empty console line");
            continue;
        }
        sent.push(post(String::from_utf8_lossy(line).into_owned()).await?);
    }

    debug!(lines = sent.len(), "Console input ended");
    Ok(sent)
}

fn strip_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
