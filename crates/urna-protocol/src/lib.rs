//! Wire protocol for Urna ballot-box terminals.
//!
//! Terminals and the server exchange terminator-delimited UTF-8 text lines
//! over any duplex byte stream:
//!
//! - client: `<command-name>[ <param>]*`
//! - server, success: `+OK`, zero or more result lines, and for listing
//!   commands one trailing empty line
//! - server, failure: a single `-<code> <message>` line

pub mod code;
pub mod codec;
pub mod error;
pub mod message;

pub use code::ErrorCode;
pub use codec::{LineReader, LineTerminator, LineWriter};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Request, Response, OK};
