//! Opening the durable tier.
//!
//! The durable tier is one SQLite file in WAL mode so the server and
//! `edgesearch-admin` can hold it open at the same time; `busy_timeout`
//! covers the short write locks between them.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA busy_timeout=5000;";

/// Durable tier handle.
///
/// Wraps a tokio-rusqlite Connection that runs statements on a background
/// thread, so concurrent requests never block the runtime on disk I/O.
#[derive(Clone, Debug)]
pub struct DurableStore {
    pub(crate) conn: Connection,
}

impl DurableStore {
    /// Open the store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies pragmas and runs any
    /// pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    /// Open a private in-memory store with the same schema.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }
}
