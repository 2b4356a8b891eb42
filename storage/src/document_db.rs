//! Document collections on SQLite.
//!
//! Each collection is a table holding one JSON document per row, queried with SQLite's
//! JSON functions. Collection `c` of database `d` is the table `"d.c"`.
//!
//! ```sql
//! CREATE TABLE "d.c" (
//!     _id INTEGER PRIMARY KEY AUTOINCREMENT,  -- database-assigned document id
//!     id TEXT NOT NULL,                       -- message id
//!     created TEXT NOT NULL,                  -- fixed-width RFC 3339, sorts lexically
//!     document TEXT NOT NULL                  -- the message as JSON
//! );
//! CREATE INDEX "d.c.created" ON "d.c" (created);
//! ```
//!
//! Reads and removals on a collection that was never written behave as if it were empty.
//! Search filters use SQLite's `REGEXP` operator, backed by the `regex` crate.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::Result;
use crate::models::{search_pattern, Message, Messages, SearchKind};

/// Document fields left out of projected results.
const UNPROJECTED_PATHS: &str = "'$.content.body', '$.content.mime', '$.mime'";

/// Pool settings for [`DocumentDatabase::connect`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle to one database: a shared SQLite pool plus the namespace its collections live in.
#[derive(Clone, Debug)]
pub struct DocumentDatabase {
    pool: SqlitePool,
    name: String,
}

impl DocumentDatabase {
    /// Connects to `uri` (a `sqlite:` URL or a file path); creates the file if missing.
    pub async fn connect(
        uri: &str,
        name: &str,
        options: &ConnectOptions,
    ) -> std::result::Result<Self, sqlx::Error> {
        info!("Initializing SQLite pool: {} (database {})", uri, name);

        let connect_options = if uri.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(uri)?
        } else {
            SqliteConnectOptions::new().filename(uri)
        }
        .create_if_missing(true)
        .with_regexp();

        let pool_options = SqlitePoolOptions::new().acquire_timeout(options.acquire_timeout);
        // An in-memory database lives only as long as its connection.
        let pool_options = if is_in_memory(uri) {
            pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(options.max_connections.max(1))
        };

        let pool = pool_options.connect_with(connect_options).await?;

        Ok(Self {
            pool,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Selects a collection. Nothing is created until the first write.
    pub fn collection(&self, name: &str) -> Collection<'_> {
        Collection {
            pool: &self.pool,
            table: format!("{}.{}", self.name, name),
        }
    }

    /// Names of the collections that exist in this database, sorted.
    pub async fn collection_names(&self) -> Result<Vec<String>> {
        let prefix = format!("{}.", self.name);
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, ?) = ? ORDER BY name",
        )
        .bind(prefix.len() as i64)
        .bind(&prefix)
        .fetch_all(&self.pool)
        .await?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            let table: String = row.try_get("name")?;
            names.push(table[prefix.len()..].to_string());
        }
        Ok(names)
    }
}

fn is_in_memory(uri: &str) -> bool {
    uri == ":memory:" || uri.starts_with("sqlite::memory:") || uri.contains("mode=memory")
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Sort key stored in the `created` column.
pub(crate) fn created_key(created: &DateTime<Utc>) -> String {
    created.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Which documents a query touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    All,
    /// Documents whose message `id` equals the value.
    Id(String),
    /// Unanchored, case-insensitive regex match on the field selected by `kind`.
    Matches { kind: SearchKind, query: String },
}

impl Filter {
    fn where_clause(&self) -> String {
        match self {
            Filter::All => "1 = 1".to_string(),
            Filter::Id(_) => "d.id = ?".to_string(),
            Filter::Matches {
                kind: SearchKind::To,
                ..
            } => format!(
                "EXISTS (SELECT 1 FROM json_each(d.document, '$.{}') AS r \
                 WHERE r.type = 'text' AND coalesce(r.value, '') REGEXP ?)",
                SearchKind::To.field()
            ),
            // A missing field never matches; coalesce keeps REGEXP off NULL.
            Filter::Matches { kind, .. } => format!(
                "json_type(d.document, '$.{0}') = 'text' \
                 AND coalesce(json_extract(d.document, '$.{0}'), '') REGEXP ?",
                kind.field()
            ),
        }
    }

    fn bind_value(&self) -> Option<String> {
        match self {
            Filter::All => None,
            Filter::Id(id) => Some(id.clone()),
            Filter::Matches { query, .. } => Some(search_pattern(query)),
        }
    }
}

/// Paging and projection for [`Collection::find`]. Results are always newest first.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    pub skip: usize,
    /// Zero means no limit.
    pub limit: usize,
    pub projected: bool,
}

/// One collection of message documents.
pub struct Collection<'a> {
    pool: &'a SqlitePool,
    table: String,
}

impl Collection<'_> {
    pub fn name(&self) -> &str {
        &self.table
    }

    /// Creates the collection if needed, with its index on `created`.
    pub async fn ensure_index_created(&self) -> Result<()> {
        let table = quote_identifier(&self.table);
        let index = quote_identifier(&format!("{}.created", self.table));

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL,
                created TEXT NOT NULL,
                document TEXT NOT NULL
            )
            "#,
            table
        ))
        .execute(self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (created)",
            index, table
        ))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn exists(&self) -> Result<bool> {
        let found: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(&self.table)
                .fetch_one(self.pool)
                .await?;
        Ok(found > 0)
    }

    /// Inserts one document, creating the collection on first write.
    /// Returns the database-assigned document id.
    pub async fn insert(&self, message: &Message) -> Result<i64> {
        // Concurrent first writes may both get here; the DDL is idempotent.
        if !self.exists().await? {
            self.ensure_index_created().await?;
        }

        let document = serde_json::to_string(message)?;
        let result = sqlx::query(&format!(
            "INSERT INTO {} (id, created, document) VALUES (?, ?, ?)",
            quote_identifier(&self.table)
        ))
        .bind(&message.id)
        .bind(created_key(&message.created))
        .bind(&document)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn find(&self, filter: &Filter, options: FindOptions) -> Result<Messages> {
        if !self.exists().await? {
            return Ok(Messages::new());
        }

        let document = if options.projected {
            format!("json_remove(d.document, {})", UNPROJECTED_PATHS)
        } else {
            "d.document".to_string()
        };
        let sql = format!(
            "SELECT {} AS document FROM {} AS d WHERE {} ORDER BY d.created DESC, d._id DESC LIMIT ? OFFSET ?",
            document,
            quote_identifier(&self.table),
            filter.where_clause()
        );
        debug!(collection = %self.table, filter = ?filter, skip = options.skip, limit = options.limit, "find");

        let limit = if options.limit == 0 {
            -1
        } else {
            i64::try_from(options.limit).unwrap_or(i64::MAX)
        };
        let skip = i64::try_from(options.skip).unwrap_or(i64::MAX);

        let mut query = sqlx::query(&sql);
        if let Some(value) = filter.bind_value() {
            query = query.bind(value);
        }
        let rows = query.bind(limit).bind(skip).fetch_all(self.pool).await?;

        let mut messages = Messages::with_capacity(rows.len());
        for row in rows {
            let document: String = row.try_get("document")?;
            messages.push(serde_json::from_str(&document)?);
        }
        Ok(messages)
    }

    /// First matching document in insertion order, unprojected.
    pub async fn find_one(&self, filter: &Filter) -> Result<Option<Message>> {
        if !self.exists().await? {
            return Ok(None);
        }

        let sql = format!(
            "SELECT d.document AS document FROM {} AS d WHERE {} ORDER BY d._id ASC LIMIT 1",
            quote_identifier(&self.table),
            filter.where_clause()
        );
        let mut query = sqlx::query(&sql);
        if let Some(value) = filter.bind_value() {
            query = query.bind(value);
        }

        match query.fetch_optional(self.pool).await? {
            Some(row) => {
                let document: String = row.try_get("document")?;
                Ok(Some(serde_json::from_str(&document)?))
            }
            None => Ok(None),
        }
    }

    pub async fn count(&self, filter: &Filter) -> Result<u64> {
        if !self.exists().await? {
            return Ok(0);
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {} AS d WHERE {}",
            quote_identifier(&self.table),
            filter.where_clause()
        );
        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        if let Some(value) = filter.bind_value() {
            query = query.bind(value);
        }
        let count = query.fetch_one(self.pool).await?;
        Ok(count.max(0) as u64)
    }

    /// Removes every matching document; returns how many were removed.
    pub async fn remove_all(&self, filter: &Filter) -> Result<u64> {
        if !self.exists().await? {
            return Ok(0);
        }

        let table = quote_identifier(&self.table);
        let sql = format!(
            "DELETE FROM {} WHERE _id IN (SELECT d._id FROM {} AS d WHERE {})",
            table,
            table,
            filter.where_clause()
        );
        let mut query = sqlx::query(&sql);
        if let Some(value) = filter.bind_value() {
            query = query.bind(value);
        }
        let result = query.execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
