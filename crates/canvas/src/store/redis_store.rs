//! Redis-backed bitfield store.
//!
//! Field sets map onto `BITFIELD key SET u<bits> #<slot> <value>`, which Redis
//! executes atomically; reads use `GETRANGE`. Each call checks out its own
//! connection, so concurrent requests never queue behind a client-side lock.

use std::time::Duration;

use redis::{Client, Cmd, Connection};

use super::{BitfieldStore, StoreError};
use crate::codec::FieldDescriptor;

/// Bitfield store talking to a Redis server
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: Client,
    timeout: Option<Duration>,
}

impl RedisStore {
    /// Open a client for `url`. No connection is made until the first call.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let client =
            Client::open(url).map_err(|e| StoreError::Connection(format!("{url}: {e}")))?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            timeout: None,
        }
    }

    /// Bound connect, read and write of every store call by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn connection(&self) -> Result<Connection, StoreError> {
        let conn = match self.timeout {
            Some(timeout) => self.client.get_connection_with_timeout(timeout)?,
            None => self.client.get_connection()?,
        };
        conn.set_read_timeout(self.timeout)?;
        conn.set_write_timeout(self.timeout)?;
        Ok(conn)
    }
}

/// `BITFIELD key SET u<bits> #<slot> value`
pub(crate) fn bitfield_set_cmd(key: &str, field: FieldDescriptor, value: u16) -> Cmd {
    let mut cmd = redis::cmd("BITFIELD");
    cmd.arg(key)
        .arg("SET")
        .arg(format!("u{}", field.bits))
        .arg(format!("#{}", field.slot))
        .arg(value);
    cmd
}

/// `GETRANGE key start end`
pub(crate) fn getrange_cmd(key: &str, start: u64, end: u64) -> Cmd {
    let mut cmd = redis::cmd("GETRANGE");
    cmd.arg(key).arg(start).arg(end);
    cmd
}

impl BitfieldStore for RedisStore {
    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("DEL").arg(key).query::<i64>(&mut conn)?;
        Ok(())
    }

    fn set_field(&self, key: &str, field: FieldDescriptor, value: u16) -> Result<u16, StoreError> {
        let mut conn = self.connection()?;
        let replies: Vec<i64> = bitfield_set_cmd(key, field, value).query(&mut conn)?;
        replies
            .first()
            .and_then(|previous| u16::try_from(*previous).ok())
            .ok_or_else(|| StoreError::UnexpectedResponse {
                command: "BITFIELD",
                detail: format!("{replies:?}"),
            })
    }

    fn get_range(&self, key: &str, start: u64, end: u64) -> Result<Vec<u8>, StoreError> {
        let mut conn = self.connection()?;
        Ok(getrange_cmd(key, start, end).query(&mut conn)?)
    }

    fn replace(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        redis::cmd("SET").arg(key).arg(bytes).query::<()>(&mut conn)?;
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        Ok(redis::cmd("EXISTS").arg(key).query(&mut conn)?)
    }
}
