//! RESP2 frames: just enough of the Redis protocol to send commands and read
//! their replies.

use bytes::{BufMut, BytesMut};
use thiserror::Error;

const TERMINATOR: &[u8] = b"\r\n";

/// Upper bound on pre-allocated array capacity while parsing.
const MAX_PREALLOC: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RespError {
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Vec<u8>),
    Array(Vec<RespValue>),
    /// Null bulk string or null array.
    Null,
}

impl RespValue {
    /// A command as clients send it: an array of bulk strings.
    pub fn command<A: AsRef<[u8]>>(args: &[A]) -> Self {
        Self::Array(
            args.iter()
                .map(|arg| Self::BulkString(arg.as_ref().to_vec()))
                .collect(),
        )
    }

    pub fn serialize(&self, buf: &mut BytesMut) {
        match self {
            Self::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put(s.as_bytes());
            }
            Self::Error(s) => {
                buf.put_u8(b'-');
                buf.put(s.as_bytes());
            }
            Self::Integer(n) => {
                buf.put_u8(b':');
                buf.put(n.to_string().as_bytes());
            }
            Self::BulkString(data) => {
                buf.put_u8(b'$');
                buf.put(data.len().to_string().as_bytes());
                buf.put(TERMINATOR);
                buf.put(data.as_slice());
            }
            Self::Array(elements) => {
                buf.put_u8(b'*');
                buf.put(elements.len().to_string().as_bytes());
                buf.put(TERMINATOR);
                for e in elements {
                    e.serialize(buf);
                }
                return;
            }
            Self::Null => {
                buf.put(&b"$-1"[..]);
            }
        }
        buf.put(TERMINATOR);
    }

    /// Parse one frame from the front of `data`.
    ///
    /// Returns the frame and the number of bytes it occupied, or `None` if
    /// `data` does not yet hold a complete frame.
    pub fn deserialize(data: &[u8]) -> Result<Option<(Self, usize)>, RespError> {
        let Some(&tag) = data.first() else {
            return Ok(None);
        };
        let Some(line_end) = find_terminator(data) else {
            return Ok(None);
        };
        let line = std::str::from_utf8(&data[1..line_end])
            .map_err(|_| RespError::Protocol("header line is not UTF-8".to_string()))?;
        let body_start = line_end + TERMINATOR.len();

        match tag {
            b'+' => Ok(Some((Self::SimpleString(line.to_string()), body_start))),
            b'-' => Ok(Some((Self::Error(line.to_string()), body_start))),
            b':' => Ok(Some((Self::Integer(parse_length(line)?), body_start))),
            b'$' => {
                let len = parse_length(line)?;
                if len < 0 {
                    return Ok(Some((Self::Null, body_start)));
                }
                let body_end = body_start + len as usize;
                if data.len() < body_end + TERMINATOR.len() {
                    return Ok(None);
                }
                if &data[body_end..body_end + TERMINATOR.len()] != TERMINATOR {
                    return Err(RespError::Protocol(
                        "bulk string not terminated by CRLF".to_string(),
                    ));
                }
                Ok(Some((
                    Self::BulkString(data[body_start..body_end].to_vec()),
                    body_end + TERMINATOR.len(),
                )))
            }
            b'*' => {
                let count = parse_length(line)?;
                if count < 0 {
                    return Ok(Some((Self::Null, body_start)));
                }
                let count = count as usize;
                let mut elements = Vec::with_capacity(count.min(MAX_PREALLOC));
                let mut offset = body_start;
                for _ in 0..count {
                    match Self::deserialize(&data[offset..])? {
                        Some((element, used)) => {
                            elements.push(element);
                            offset += used;
                        }
                        None => return Ok(None),
                    }
                }
                Ok(Some((Self::Array(elements), offset)))
            }
            other => Err(RespError::Protocol(format!(
                "unexpected frame type byte {other:#04x}"
            ))),
        }
    }
}

fn find_terminator(data: &[u8]) -> Option<usize> {
    data.windows(TERMINATOR.len())
        .position(|window| window == TERMINATOR)
}

fn parse_length(line: &str) -> Result<i64, RespError> {
    line.parse::<i64>()
        .map_err(|_| RespError::Protocol(format!("invalid integer: {line:?}")))
}
