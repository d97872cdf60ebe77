//! Macro persistence.
//!
//! Macros are keyed by `(user, name)` and additionally looked up through
//! their normalized trigger phrase, so "play checkout" finds the macro
//! saved as "Checkout".  Saving under an existing name overwrites.

use chrono::Utc;
use tracing::{debug, instrument};

use crate::db::Database;
use crate::error::{StoreError, StoreResult};

/// A persisted macro row.  `payload` is the engine's serialized record;
/// the store never looks inside it beyond the empty-actions guard.
#[derive(Debug, Clone)]
pub struct StoredMacro {
    pub name: String,
    pub trigger: String,
    pub payload: serde_json::Value,
    pub created_at: i64,
    pub updated_at: i64,
}

/// CRUD operations on macros.
#[derive(Clone)]
pub struct MacroStore {
    db: Database,
}

impl MacroStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert or overwrite the macro named `name` for `user`.
    ///
    /// Rejects payloads whose `actions` array is missing or empty: a
    /// persisted action list is never empty by invariant.
    #[instrument(skip(self, payload))]
    pub async fn save(
        &self,
        user: &str,
        name: &str,
        trigger: &str,
        payload: serde_json::Value,
    ) -> StoreResult<()> {
        if !payload
            .get("actions")
            .and_then(|a| a.as_array())
            .is_some_and(|a| !a.is_empty())
        {
            return Err(StoreError::InvalidArgument(
                "macro payload must carry a non-empty actions array".into(),
            ));
        }

        let user = user.to_string();
        let name = name.to_string();
        let trigger = trigger.to_lowercase();
        let payload_json = serde_json::to_string(&payload)?;
        let now = Utc::now().timestamp();

        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO macros (user, name, trigger, payload, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
                     ON CONFLICT (user, name) DO UPDATE SET \
                         trigger = excluded.trigger, \
                         payload = excluded.payload, \
                         updated_at = excluded.updated_at",
                    rusqlite::params![user, name, trigger, payload_json, now],
                )?;
                Ok(())
            })
            .await?;

        debug!("macro saved");
        Ok(())
    }

    /// Look up a macro by exact name or trigger, case-insensitively.
    #[instrument(skip(self))]
    pub async fn get(&self, user: &str, name_or_trigger: &str) -> StoreResult<Option<StoredMacro>> {
        let user = user.to_string();
        let key = name_or_trigger.to_lowercase();

        self.db
            .execute(move |conn| {
                let result = conn.query_row(
                    "SELECT name, trigger, payload, created_at, updated_at FROM macros \
                     WHERE user = ?1 AND (lower(name) = ?2 OR trigger = ?2)",
                    rusqlite::params![user, key],
                    row_to_macro,
                );
                match result {
                    Ok((name, trigger, payload, created_at, updated_at)) => {
                        Ok(Some(StoredMacro {
                            name,
                            trigger,
                            payload: serde_json::from_str(&payload)?,
                            created_at,
                            updated_at,
                        }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(StoreError::Sqlite(e)),
                }
            })
            .await
    }

    /// List macros for `user`, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list(&self, user: &str) -> StoreResult<Vec<StoredMacro>> {
        let user = user.to_string();

        self.db
            .execute(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT name, trigger, payload, created_at, updated_at FROM macros \
                     WHERE user = ?1 ORDER BY updated_at DESC",
                )?;
                let rows = stmt
                    .query_map(rusqlite::params![user], row_to_macro)?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(name, trigger, payload, created_at, updated_at)| {
                        Ok(StoredMacro {
                            name,
                            trigger,
                            payload: serde_json::from_str(&payload)?,
                            created_at,
                            updated_at,
                        })
                    })
                    .collect()
            })
            .await
    }

    /// Delete a macro by name.  Errors with `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, user: &str, name: &str) -> StoreResult<()> {
        let user = user.to_string();
        let name = name.to_string();
        let for_error = name.clone();

        let deleted = self
            .db
            .execute(move |conn| {
                let n = conn.execute(
                    "DELETE FROM macros WHERE user = ?1 AND lower(name) = lower(?2)",
                    rusqlite::params![user, name],
                )?;
                Ok(n)
            })
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound {
                entity: "macro",
                name: for_error,
            });
        }
        Ok(())
    }
}

type MacroRow = (String, String, String, i64, i64);

fn row_to_macro(row: &rusqlite::Row<'_>) -> rusqlite::Result<MacroRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(values: &[&str]) -> serde_json::Value {
        json!({
            "actions": values
                .iter()
                .map(|v| json!({"type": "click", "target": v}))
                .collect::<Vec<_>>(),
        })
    }

    async fn store() -> MacroStore {
        MacroStore::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn save_then_get_round_trips_payload() {
        let store = store().await;
        let p = payload(&["submit", "next"]);
        store.save("u1", "Checkout", "checkout", p.clone()).await.unwrap();

        let found = store.get("u1", "Checkout").await.unwrap().unwrap();
        assert_eq!(found.name, "Checkout");
        assert_eq!(found.payload, p);
    }

    #[tokio::test]
    async fn lookup_by_trigger_is_case_insensitive() {
        let store = store().await;
        store.save("u1", "Checkout", "checkout", payload(&["a"])).await.unwrap();

        assert!(store.get("u1", "CHECKOUT").await.unwrap().is_some());
        assert!(store.get("u1", "checkout").await.unwrap().is_some());
        assert!(store.get("u2", "checkout").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn resave_overwrites() {
        let store = store().await;
        store.save("u1", "m", "m", payload(&["a"])).await.unwrap();
        store.save("u1", "m", "m", payload(&["b", "c"])).await.unwrap();

        let found = store.get("u1", "m").await.unwrap().unwrap();
        assert_eq!(found.payload["actions"].as_array().unwrap().len(), 2);
        assert_eq!(store.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_actions_rejected() {
        let store = store().await;
        let result = store.save("u1", "m", "m", json!({"actions": []})).await;
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));

        let result = store.save("u1", "m", "m", json!({})).await;
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn delete_missing_reports_not_found() {
        let store = store().await;
        let result = store.delete("u1", "ghost").await;
        match result {
            Err(StoreError::NotFound { entity, name }) => {
                assert_eq!(entity, "macro");
                assert_eq!(name, "ghost");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
