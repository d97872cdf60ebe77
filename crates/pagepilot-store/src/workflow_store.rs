//! Workflow persistence.
//!
//! Parsed workflows are transient by default; this store keeps the ones
//! the operator saves by name.  Payloads are opaque JSON like the other
//! stores, but the non-empty-steps invariant is enforced here too.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// CRUD operations on saved workflows.
#[derive(Clone)]
pub struct WorkflowStore {
    db: Database,
}

impl WorkflowStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or overwrite the workflow named `name` for `user`.
    ///
    /// Rejects payloads whose `steps` array is missing or empty.
    #[instrument(skip(self, payload))]
    pub async fn save(&self, user: &str, name: &str, payload: serde_json::Value) -> StoreResult<()> {
        if !payload
            .get("steps")
            .and_then(|s| s.as_array())
            .is_some_and(|s| !s.is_empty())
        {
            return Err(StoreError::InvalidArgument(
                "workflow payload must carry a non-empty steps array".into(),
            ));
        }

        let user = user.to_string();
        let name = name.to_string();
        let payload_json = serde_json::to_string(&payload)?;
        let now = Utc::now().timestamp();

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO workflows (user, name, payload, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?4) \
                     ON CONFLICT (user, name) DO UPDATE SET \
                         payload = excluded.payload, \
                         updated_at = excluded.updated_at",
                    rusqlite::params![user, name, payload_json, now],
                )?;
                Ok(())
            })
            .await?;

        debug!("workflow saved");
        Ok(())
    }

    /// Fetch a workflow by name (case-insensitive); `None` if absent.
    #[instrument(skip(self))]
    pub async fn get(&self, user: &str, name: &str) -> StoreResult<Option<serde_json::Value>> {
        let user = user.to_string();
        let name = name.to_string();

        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT payload FROM workflows \
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

    /// List workflow names for `user`, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list(&self, user: &str) -> StoreResult<Vec<String>> {
        let user = user.to_string();

        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM workflows WHERE user = ?1 ORDER BY updated_at DESC",
                )?;
                let names = stmt
                    .query_map(rusqlite::params![user], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
    }

    /// Delete a workflow by name.  Errors with `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, user: &str, name: &str) -> StoreResult<()> {
        let user = user.to_string();
        let name = name.to_string();
        let for_error = name.clone();

        let deleted = self
            .db
            .execute(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM workflows WHERE user = ?1 AND lower(name) = lower(?2)",
                    rusqlite::params![user, name],
                )?)
            })
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound {
                entity: "workflow",
                name: for_error,
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_requires_steps() {
        let store = WorkflowStore::new(Database::open_in_memory().unwrap());
        assert!(store.save("u", "w", json!({"steps": []})).await.is_err());
        assert!(store.save("u", "w", json!({})).await.is_err());
        assert!(
            store
                .save("u", "w", json!({"steps": [{"type": "wait", "ms": 100}]}))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn round_trip_and_overwrite() {
        let store = WorkflowStore::new(Database::open_in_memory().unwrap());
        let v1 = json!({"steps": [{"type": "wait", "ms": 100}]});
        let v2 = json!({"steps": [{"type": "wait", "ms": 200}]});

        store.save("u", "morning", v1).await.unwrap();
        store.save("u", "morning", v2.clone()).await.unwrap();

        assert_eq!(store.get("u", "MORNING").await.unwrap().unwrap(), v2);
        assert_eq!(store.list("u").await.unwrap().len(), 1);
    }
}
