use crate::code::ErrorCode;

/// Status line opening every successful response.
pub const OK: &str = "+OK";

/// A parsed client line: `<command-name>[ <param>]*`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub name: String,
    pub params: Vec<String>,
}

impl Request {
    /// Parse a line. Returns `None` for a blank line, which is a keepalive.
    ///
    /// Tokens are separated by spaces; runs of spaces do not produce empty
    /// parameters.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split(' ').filter(|t| !t.is_empty());
        let name = tokens.next()?.to_string();
        Some(Self {
            name,
            params: tokens.map(str::to_string).collect(),
        })
    }
}

/// A server reply to one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// `+OK` followed by result lines; listings end with an empty line.
    Ok { lines: Vec<String>, listing: bool },
    /// A single `-<code> <message>` line.
    Error { code: ErrorCode, message: String },
}

impl Response {
    /// `+OK` followed by result lines.
    pub fn ok(lines: Vec<String>) -> Self {
        Self::Ok {
            lines,
            listing: false,
        }
    }

    /// `+OK`, result lines, then an empty line closing the listing.
    pub fn listing(lines: Vec<String>) -> Self {
        Self::Ok {
            lines,
            listing: true,
        }
    }

    /// A single `-<code> <message>` line.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// The response as wire lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Ok { lines, listing } => {
                let mut out = Vec::with_capacity(lines.len() + 2);
                out.push(OK.to_string());
                out.extend(lines.iter().cloned());
                if *listing {
                    out.push(String::new());
                }
                out
            }
            Self::Error { code, message } => {
                // Messages are single-line on the wire.
                let message = message.replace(['\r', '\n'], " ");
                vec![format!("-{code} {message}")]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_name_and_params() {
        let r = Request::parse("insert-queue-element 100FR 1 2").unwrap();
        assert_eq!(r.name, "insert-queue-element");
        assert_eq!(r.params, ["100FR", "1", "2"]);
    }

    #[test]
    fn parse_ignores_repeated_spaces() {
        let r = Request::parse("check-voter   100FR ").unwrap();
        assert_eq!(r.params, ["100FR"]);
    }

    #[test]
    fn blank_line_is_not_a_request() {
        assert!(Request::parse("").is_none());
        assert!(Request::parse("   ").is_none());
    }

    #[test]
    fn ok_response_lines() {
        assert_eq!(Response::ok(vec![]).lines(), ["+OK"]);
        assert_eq!(Response::ok(vec!["a".into()]).lines(), ["+OK", "a"]);
    }

    #[test]
    fn listing_appends_empty_line() {
        let lines = Response::listing(vec!["1 voting-0".into()]).lines();
        assert_eq!(lines, ["+OK", "1 voting-0", ""]);
        assert_eq!(Response::listing(vec![]).lines(), ["+OK", ""]);
    }

    #[test]
    fn error_line_carries_numeric_code() {
        let lines = Response::error(ErrorCode::Generic, "unknown command: foo").lines();
        assert_eq!(lines, ["-65533 unknown command: foo"]);
    }

    #[test]
    fn error_message_is_flattened_to_one_line() {
        let lines = Response::error(ErrorCode::SessionTerminated, "stopped\nby operator").lines();
        assert_eq!(lines, ["-1023 stopped by operator"]);
    }
}
