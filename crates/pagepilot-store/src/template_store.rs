//! Form-template persistence.
//!
//! A template is a named snapshot of page field values, stored as an
//! opaque JSON payload keyed by `(user, name)`.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// CRUD operations on form templates.
#[derive(Clone)]
pub struct TemplateStore {
    db: Database,
}

impl TemplateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or overwrite the template named `name` for `user`.
    #[instrument(skip(self, payload))]
    pub async fn save(&self, user: &str, name: &str, payload: serde_json::Value) -> StoreResult<()> {
        let user = user.to_string();
        let name = name.to_string();
        let payload_json = serde_json::to_string(&payload)?;
        let now = Utc::now().timestamp();

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO templates (user, name, payload, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?4) \
                     ON CONFLICT (user, name) DO UPDATE SET \
                         payload = excluded.payload, \
                         updated_at = excluded.updated_at",
                    rusqlite::params![user, name, payload_json, now],
                )?;
                Ok(())
            })
            .await?;

        debug!("template saved");
        Ok(())
    }

    /// Fetch a template by name (case-insensitive); `None` if absent.
    #[instrument(skip(self))]
    pub async fn get(&self, user: &str, name: &str) -> StoreResult<Option<serde_json::Value>> {
        let user = user.to_string();
        let name = name.to_string();

        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT payload FROM templates \
                     WHERE user = ?1 AND lower(name) = lower(?2)",
                    rusqlite::params![user, name],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(payload) => Ok(Some(serde_json::from_str(&payload)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// List template names for `user`, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list(&self, user: &str) -> StoreResult<Vec<String>> {
        let user = user.to_string();

        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM templates WHERE user = ?1 ORDER BY updated_at DESC",
                )?;
                let names = stmt
                    .query_map(rusqlite::params![user], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
    }

    /// Delete a template by name.  Errors with `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, user: &str, name: &str) -> StoreResult<()> {
        let user = user.to_string();
        let name = name.to_string();
        let for_error = name.clone();

        let deleted = self
            .db
            .execute(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM templates WHERE user = ?1 AND lower(name) = lower(?2)",
                    rusqlite::params![user, name],
                )?)
            })
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound {
                entity: "template",
                name: for_error,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
