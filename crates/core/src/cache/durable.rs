//! Durable tier operations.
//!
//! Entries are opaque blobs with an optional absolute expiry. Expiry is
//! enforced at read time, so an expired row is never served even before
//! [`DurableStore::purge_expired`] removes it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::params;

use super::connection::DurableStore;
use super::tier::CacheTier;
use crate::Error;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl DurableStore {
    /// Get an unexpired entry by key.
    pub async fn get_entry(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let key = key.to_string();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<Option<Vec<u8>>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT value FROM kv_entries
                     WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                )?;

                match stmt.query_row(params![key, now], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace an entry.
    ///
    /// With `ttl` of `None` the entry never expires.
    pub async fn put_entry(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), Error> {
        let key = key.to_string();
        let value = value.to_vec();
        let stored_at = now_millis();
        let expires_at = ttl.map(|ttl| stored_at.saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)));

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO kv_entries (key, value, stored_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(key) DO UPDATE SET
                        value = excluded.value,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, value, stored_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an entry. Returns whether a row was removed.
    pub async fn delete_entry(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM kv_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheTier for DurableStore {
    fn name(&self) -> &'static str {
        "durable"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        self.get_entry(key).await
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), Error> {
        self.put_entry(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.delete_entry(key).await.map(|_| ())
    }
}
