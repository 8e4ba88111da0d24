//! # Redis Badge Storage
//!
//! Badge documents stored in Redis through the RedisJSON module:
//!
//! | Operation     | Commands                                               |
//! |---------------|--------------------------------------------------------|
//! | `store_value` | `JSON.SET key $ <doc>`                                 |
//! | `get_value`   | `JSON.GET key`                                         |
//! | `set_message` | `EXISTS key`, then pipelined `JSON.SET key $.format.message` and `JSON.SET key $.meta.last_seen` |
//! | `contains`    | `EXISTS key`                                           |
//! | `list`        | `KEYS *`, then pipelined `JSON.GET` per key            |
//! | `delete`      | `JSON.DEL key`                                         |
//!
//! One connection per store, guarded by a mutex and reopened on the next
//! call after any I/O failure. Every socket operation is bounded by the
//! configured timeout.

mod resp;

use super::{BackendKind, BadgeStore};
use crate::{BadgeDocument, StoreError};
use bytes::{Buf, BytesMut};
use resp::RespValue;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Default bound on connect, read and write.
pub const DEFAULT_REDIS_TIMEOUT: Duration = Duration::from_secs(5);

const READ_CHUNK: usize = 4096;

type Command = Vec<Vec<u8>>;

fn command(args: &[&[u8]]) -> Command {
    args.iter().map(|arg| arg.to_vec()).collect()
}

fn unavailable(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

// =============================================================================
// CONNECTION
// =============================================================================

struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Connection {
    fn open(addr: &str, timeout: Duration) -> Result<Self, StoreError> {
        let addrs = addr
            .to_socket_addrs()
            .map_err(|e| unavailable(format!("cannot resolve {addr}: {e}")))?;

        let mut last_err = None;
        for candidate in addrs {
            match TcpStream::connect_timeout(&candidate, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout)).map_err(unavailable)?;
                    stream.set_write_timeout(Some(timeout)).map_err(unavailable)?;
                    stream.set_nodelay(true).map_err(unavailable)?;
                    return Ok(Self {
                        stream,
                        buffer: BytesMut::with_capacity(READ_CHUNK),
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => unavailable(format!("cannot connect to {addr}: {e}")),
            None => unavailable(format!("{addr} resolved to no addresses")),
        })
    }

    /// Send all commands in one write, then read one reply per command.
    fn pipeline(&mut self, commands: &[Command]) -> Result<Vec<RespValue>, StoreError> {
        let mut out = BytesMut::new();
        for cmd in commands {
            RespValue::command(cmd).serialize(&mut out);
        }
        self.stream.write_all(&out).map_err(unavailable)?;

        let mut replies = Vec::with_capacity(commands.len());
        while replies.len() < commands.len() {
            replies.push(self.read_reply()?);
        }
        Ok(replies)
    }

    fn read_reply(&mut self) -> Result<RespValue, StoreError> {
        loop {
            let parsed = RespValue::deserialize(&self.buffer).map_err(unavailable)?;
            if let Some((value, used)) = parsed {
                self.buffer.advance(used);
                return Ok(value);
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).map_err(unavailable)?;
            if n == 0 {
                return Err(unavailable("connection closed by server"));
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }
}

// =============================================================================
// REDIS STORE
// =============================================================================

/// Badge store on a Redis server with RedisJSON.
pub struct RedisStore {
    addr: String,
    timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("addr", &self.addr)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisStore {
    /// A store for `host:port`. No connection is made until the first call.
    #[must_use]
    pub fn new(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            addr: format!("{host}:{port}"),
            timeout,
            connection: Mutex::new(None),
        }
    }

    /// Like [`RedisStore::new`], but fails fast if the server does not answer `PING`.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, StoreError> {
        let store = Self::new(host, port, timeout);
        store.ping()?;
        Ok(store)
    }

    fn pipeline(&self, commands: &[Command]) -> Result<Vec<RespValue>, StoreError> {
        let mut slot = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut conn = match slot.take() {
            Some(conn) => conn,
            None => Connection::open(&self.addr, self.timeout)?,
        };

        // A failed exchange leaves the stream mid-frame; drop it.
        let replies = conn.pipeline(commands)?;
        *slot = Some(conn);
        Ok(replies)
    }

    fn call(&self, args: &[&[u8]]) -> Result<RespValue, StoreError> {
        let mut replies = self.pipeline(&[command(args)])?;
        replies
            .pop()
            .ok_or_else(|| unavailable("empty reply"))
            .and_then(reject_error)
    }
}

/// Turn a server error reply into a `StoreError`.
fn reject_error(reply: RespValue) -> Result<RespValue, StoreError> {
    match reply {
        RespValue::Error(msg) => Err(StoreError::Unavailable(format!("redis: {msg}"))),
        other => Ok(other),
    }
}

fn expect_integer(reply: RespValue) -> Result<i64, StoreError> {
    match reply {
        RespValue::Integer(n) => Ok(n),
        other => Err(unavailable(format!("expected integer reply, got {other:?}"))),
    }
}

fn decode_document(key: &str, reply: RespValue) -> Result<Option<BadgeDocument>, StoreError> {
    match reply {
        RespValue::Null => Ok(None),
        RespValue::BulkString(bytes) => {
            let text = String::from_utf8(bytes).map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
            BadgeDocument::from_json(&text)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    key: key.to_string(),
                    reason: e.to_string(),
                })
        }
        other => Err(unavailable(format!("unexpected JSON.GET reply: {other:?}"))),
    }
}

impl BadgeStore for RedisStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    fn store_value(&self, key: &str, document: &BadgeDocument) -> Result<(), StoreError> {
        let text = document.to_json().map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.call(&[b"JSON.SET", key.as_bytes(), b"$", text.as_bytes()])
            .map(|_| ())
    }

    fn get_value(&self, key: &str) -> Result<Option<BadgeDocument>, StoreError> {
        let reply = self.call(&[b"JSON.GET", key.as_bytes()])?;
        decode_document(key, reply)
    }

    fn set_message(&self, key: &str, message: &str, now: f64) -> Result<(), StoreError> {
        if !self.contains(key)? {
            return Err(StoreError::NotFound(key.to_string()));
        }

        let message_json = serde_json::Value::String(message.to_string()).to_string();
        let now_json = serde_json::Value::from(now).to_string();
        let replies = self.pipeline(&[
            command(&[
                b"JSON.SET",
                key.as_bytes(),
                b"$.format.message",
                message_json.as_bytes(),
            ]),
            command(&[
                b"JSON.SET",
                key.as_bytes(),
                b"$.meta.last_seen",
                now_json.as_bytes(),
            ]),
        ])?;
        for reply in replies {
            reject_error(reply)?;
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let reply = self.call(&[b"EXISTS", key.as_bytes()])?;
        Ok(expect_integer(reply)? > 0)
    }

    fn list(&self) -> Result<Vec<BadgeDocument>, StoreError> {
        let keys = match self.call(&[b"KEYS", b"*"])? {
            RespValue::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    RespValue::BulkString(key) => Some(key),
                    _ => None,
                })
                .collect::<Vec<_>>(),
            RespValue::Null => Vec::new(),
            other => return Err(unavailable(format!("unexpected KEYS reply: {other:?}"))),
        };
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let commands: Vec<Command> = keys
            .iter()
            .map(|key| command(&[b"JSON.GET", key.as_slice()]))
            .collect();
        let replies = self.pipeline(&commands)?;

        let mut documents = Vec::with_capacity(replies.len());
        for (key, reply) in keys.iter().zip(replies) {
            let key = String::from_utf8_lossy(key);
            match reply {
                // Not a JSON value: something else shares the database.
                RespValue::Error(msg) if msg.starts_with("WRONGTYPE") => continue,
                reply => {
                    // Deleted between KEYS and JSON.GET.
                    if let Some(document) = decode_document(&key, reject_error(reply)?)? {
                        documents.push(document);
                    }
                }
            }
        }
        Ok(documents)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let reply = self.call(&[b"JSON.DEL", key.as_bytes()])?;
        expect_integer(reply).map(|_| ())
    }

    fn ping(&self) -> Result<(), StoreError> {
        match self.call(&[b"PING"])? {
            RespValue::SimpleString(pong) if pong == "PONG" => Ok(()),
            other => Err(unavailable(format!("unexpected PING reply: {other:?}"))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
