use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::Response;

/// The byte sequence ending each line on the wire.
///
/// A line ends at the first complete occurrence of the whole sequence. With
/// the default `"\n"` a trailing `'\r'` is stripped as well, so CRLF
/// terminals work unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LineTerminator(String);

impl LineTerminator {
    /// Create a terminator, rejecting the empty string.
    pub fn new(terminator: impl Into<String>) -> ProtocolResult<Self> {
        let terminator = terminator.into();
        if terminator.is_empty() {
            return Err(ProtocolError::EmptyTerminator);
        }
        Ok(Self(terminator))
    }

    /// The default terminator, a single `\n`.
    pub fn newline() -> Self {
        Self("\n".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Last byte of the sequence. Never empty, checked in [`Self::new`].
    fn last_byte(&self) -> u8 {
        let bytes = self.as_bytes();
        bytes[bytes.len() - 1]
    }

    /// Strip the terminator from a complete line, and the `'\r'` of CRLF
    /// when the terminator is a bare newline.
    fn strip(&self, mut line: Vec<u8>) -> Vec<u8> {
        if line.ends_with(self.as_bytes()) {
            line.truncate(line.len() - self.as_bytes().len());
            if self.as_bytes() == b"\n" && line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        line
    }
}

impl Default for LineTerminator {
    fn default() -> Self {
        Self::newline()
    }
}

impl TryFrom<String> for LineTerminator {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LineTerminator> for String {
    fn from(value: LineTerminator) -> Self {
        value.0
    }
}

/// Reads terminator-delimited UTF-8 lines.
pub struct LineReader<R> {
    reader: R,
    terminator: LineTerminator,
    /// Bytes of the line being assembled; survives a dropped read.
    pending: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wrap a buffered reader.
    pub fn new(reader: R, terminator: LineTerminator) -> Self {
        Self {
            reader,
            terminator,
            pending: Vec::new(),
        }
    }

    /// Read the next line, without its terminator. `Ok(None)` at end of
    /// stream.
    ///
    /// Cancel safe: if the future is dropped before completing, no bytes are
    /// lost and the next call resumes the same line.
    pub async fn next_line(&mut self) -> ProtocolResult<Option<String>> {
        let last = self.terminator.last_byte();
        loop {
            if self.pending.ends_with(self.terminator.as_bytes()) {
                break;
            }
            let read = self.reader.read_until(last, &mut self.pending).await?;
            if read == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                break;
            }
        }
        let line = self.terminator.strip(std::mem::take(&mut self.pending));
        Ok(Some(String::from_utf8(line)?))
    }
}

/// Writes lines and whole responses, flushing after each response.
pub struct LineWriter<W> {
    inner: W,
    terminator: LineTerminator,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    /// Wrap a writer; every line is followed by `terminator`.
    pub fn new(inner: W, terminator: LineTerminator) -> Self {
        Self { inner, terminator }
    }

    /// Write one response as a single buffered write.
    pub async fn send(&mut self, response: &Response) -> ProtocolResult<()> {
        let mut buf = String::new();
        for line in response.lines() {
            buf.push_str(&line);
            buf.push_str(self.terminator.as_str());
        }
        self.inner.write_all(buf.as_bytes()).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Flush and shut down the write side.
    pub async fn shutdown(&mut self) -> ProtocolResult<()> {
        self.inner.shutdown().await?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::ErrorCode;
    use std::time::Duration;
    use tokio::io::BufReader;

    async fn read_all(input: &'static [u8], terminator: LineTerminator) -> Vec<String> {
        let mut reader = LineReader::new(BufReader::new(input), terminator);
        let mut lines = Vec::new();
        while let Some(line) = reader.next_line().await.unwrap() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn reads_newline_terminated_lines() {
        let lines = read_all(b"show-queue\n\ncheck-voter 100FR\n", LineTerminator::newline()).await;
        assert_eq!(lines, ["show-queue", "", "check-voter 100FR"]);
    }

    #[tokio::test]
    async fn strips_carriage_return_with_default_terminator() {
        let lines = read_all(b"quit\r\n", LineTerminator::default()).await;
        assert_eq!(lines, ["quit"]);
    }

    #[tokio::test]
    async fn last_line_without_terminator_is_returned() {
        let lines = read_all(b"a\nb", LineTerminator::newline()).await;
        assert_eq!(lines, ["a", "b"]);
    }

    #[tokio::test]
    async fn custom_multibyte_terminator() {
        let terminator = LineTerminator::new(";;").unwrap();
        let lines = read_all(b"show-queue;;quit;;", terminator).await;
        assert_eq!(lines, ["show-queue", "quit"]);
    }

    #[tokio::test]
    async fn terminator_last_byte_inside_a_line() {
        let terminator = LineTerminator::new("#X").unwrap();
        let lines = read_all(b"check-voter 100XR#Xquit#X", terminator).await;
        assert_eq!(lines, ["check-voter 100XR", "quit"]);
    }

    #[tokio::test]
    async fn repeated_terminator_bytes_split_at_first_match() {
        let terminator = LineTerminator::new(";;").unwrap();
        let lines = read_all(b"a;;;;b;;;", terminator).await;
        assert_eq!(lines, ["a", "", "b", ";"]);
    }

    #[tokio::test]
    async fn dropped_read_resumes_the_same_line() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(BufReader::new(server), LineTerminator::new(";;").unwrap());
        client.write_all(b"show-que").await.unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(20), reader.next_line()).await;
        assert!(pending.is_err());

        client.write_all(b"ue;").await.unwrap();
        let pending = tokio::time::timeout(Duration::from_millis(20), reader.next_line()).await;
        assert!(pending.is_err());

        client.write_all(b";").await.unwrap();
        assert_eq!(reader.next_line().await.unwrap().as_deref(), Some("show-queue"));
    }

    #[tokio::test]
    async fn invalid_utf8_is_reported() {
        let mut reader = LineReader::new(BufReader::new(&b"\xff\xfe\n"[..]), LineTerminator::newline());
        let err = reader.next_line().await.unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidUtf8(_)));
    }

    #[test]
    fn empty_terminator_is_rejected() {
        assert!(matches!(LineTerminator::new(""), Err(ProtocolError::EmptyTerminator)));
    }

    #[test]
    fn terminator_deserializes_from_string() {
        let t: LineTerminator = serde_json::from_str("\"\\r\\n\"").unwrap();
        assert_eq!(t.as_str(), "\r\n");
        assert!(serde_json::from_str::<LineTerminator>("\"\"").is_err());
    }

    #[tokio::test]
    async fn writer_emits_response_lines_with_terminator() {
        let mut writer = LineWriter::new(Vec::new(), LineTerminator::newline());
        writer.send(&Response::listing(vec!["1 voting-0".into()])).await.unwrap();
        writer.send(&Response::error(ErrorCode::VoterNotFound, "no voter 100")).await.unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, "+OK\n1 voting-0\n\n-1002 no voter 100\n");
    }
}
