//! Line splitting for transcoder output.
//!
//! ffmpeg redraws its stats line with a bare `\r`, so `lines()` would hold
//! every progress update until the process exits. Segments here end at
//! either `\r` or `\n`; empty segments are skipped.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

pub(crate) struct LineSplitter<R> {
    reader: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineSplitter<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    /// Returns the next non-empty segment, or `None` at end of stream.
    pub(crate) async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Ok(self.take_pending());
            }

            match buf.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(pos) => {
                    self.pending.extend_from_slice(&buf[..pos]);
                    self.reader.consume(pos + 1);
                    if let Some(line) = self.take_pending() {
                        return Ok(Some(line));
                    }
                }
                None => {
                    let len = buf.len();
                    self.pending.extend_from_slice(buf);
                    self.reader.consume(len);
                }
            }
        }
    }

    fn take_pending(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}
