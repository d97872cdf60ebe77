//! Integration tests for the pagepilot-store crate.
//!
//! Exercises the three stores against one shared on-disk database, the way
//! the engine wires them in production.

use serde_json::json;

use pagepilot_store::{Database, MacroStore, StoreError, TemplateStore, WorkflowStore};

#[tokio::test]
async fn stores_share_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("pilot.db")).unwrap();

    let macros = MacroStore::new(db.clone());
    let templates = TemplateStore::new(db.clone());
    let workflows = WorkflowStore::new(db);

    macros
        .save(
            "alice",
            "Checkout",
            "checkout",
            json!({"actions": [{"type": "click", "target": "buy"}]}),
        )
        .await
        .unwrap();
    templates
        .save("alice", "job apps", json!({"entries": []}))
        .await
        .unwrap();
    workflows
        .save("alice", "morning", json!({"steps": [{"type": "refresh"}]}))
        .await
        .unwrap();

    assert_eq!(macros.list("alice").await.unwrap().len(), 1);
    assert_eq!(templates.list("alice").await.unwrap(), vec!["job apps"]);
    assert_eq!(workflows.list("alice").await.unwrap(), vec!["morning"]);

    // Lookups report the exact name queried when missing.
    match macros.delete("alice", "Ghost").await {
        Err(StoreError::NotFound { name, .. }) => assert_eq!(name, "Ghost"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn macro_action_order_survives_persistence() {
    let db = Database::open_in_memory().unwrap();
    let macros = MacroStore::new(db);

    let actions = json!([
        {"type": "fill", "field": "email", "value": "a@b.com"},
        {"type": "click", "target": "next"},
        {"type": "click", "target": "submit"},
    ]);
    macros
        .save("u", "signup", "signup", json!({"actions": actions}))
        .await
        .unwrap();

    let stored = macros.get("u", "signup").await.unwrap().unwrap();
    assert_eq!(stored.payload["actions"], actions);
}
