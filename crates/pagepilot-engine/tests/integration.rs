//! End-to-end engine tests: operator text in, page effects and
//! persisted records out, across engine restarts.

use std::sync::Arc;

use pagepilot_engine::{Action, Engine, FillValue, MockPage, PageDriver, Recorder};
use pagepilot_store::Database;

fn engine(page: Arc<MockPage>, db: Database) -> Engine {
    Engine::new(page, db, "operator")
}

#[tokio::test(start_paused = true)]
async fn recorded_macro_survives_an_engine_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.db");
    let page = Arc::new(MockPage::new());

    {
        let db = Database::open(&path).unwrap();
        let mut engine = engine(Arc::clone(&page), db);

        engine.handle("record").await;
        assert!(engine.handle("fill email with a@b.com").await.ok);
        assert!(engine.handle("fill phone with 555-0100").await.ok);
        assert!(engine.handle("click submit").await.ok);
        let reply = engine.handle("stop as signup").await;
        assert!(reply.ok, "{}", reply.message);
        assert!(reply.message.contains("3 steps"));
    }

    // Fresh engine, fresh database handle, same file.
    let db = Database::open(&path).unwrap();
    let mut engine = engine(Arc::clone(&page), db);
    page.clear_fields().await.unwrap();

    let reply = engine.handle("play signup").await;
    assert!(reply.ok, "{}", reply.message);
    assert!(reply.message.contains("3/3"));
    assert_eq!(page.field_value("#email"), Some("a@b.com".into()));
    assert_eq!(page.field_value("#phone"), Some("555-0100".into()));
}

#[tokio::test(start_paused = true)]
async fn re_fill_during_recording_keeps_only_the_last_value() {
    let page = Arc::new(MockPage::new());
    let db = Database::open_in_memory().unwrap();
    let mut engine = engine(Arc::clone(&page), db);

    engine.handle("record").await;
    assert!(engine.handle("fill email with abc").await.ok);
    assert!(engine.handle("fill email with abcd").await.ok);
    let reply = engine.handle("stop as corrected").await;
    assert!(reply.ok, "{}", reply.message);

    // The corrected fill replaced the typo in place.
    assert!(reply.message.contains("1 steps"));

    page.clear_fields().await.unwrap();
    assert!(engine.handle("play corrected").await.ok);
    assert_eq!(page.field_value("#email"), Some("abcd".into()));
}

#[tokio::test(start_paused = true)]
async fn workflow_halts_midway_and_reports_only_executed_steps() {
    let page = Arc::new(MockPage::new());
    page.fail_on("#phone");
    let db = Database::open_in_memory().unwrap();
    let mut engine = engine(Arc::clone(&page), db);

    let reply = engine
        .handle("workflow: fill email with a@b.com, fill phone with 555, click submit")
        .await;

    // Step one landed, step two failed, step three never ran.
    assert!(reply.ok, "{}", reply.message);
    assert!(reply.message.contains("halted at step 2"), "{}", reply.message);
    assert!(reply.message.contains("1/2"), "{}", reply.message);
    assert_eq!(page.field_value("#email"), Some("a@b.com".into()));
    assert!(!page.operations().iter().any(|op| op.starts_with("click")));
}

#[tokio::test(start_paused = true)]
async fn saved_workflow_is_listed_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pilot.db");
    let page = Arc::new(MockPage::new());

    {
        let db = Database::open(&path).unwrap();
        let mut engine = engine(Arc::clone(&page), db);
        assert!(engine.handle("workflow: wait 100, click submit").await.ok);
        assert!(engine.handle("save workflow daily").await.ok);
    }

    let db = Database::open(&path).unwrap();
    let mut engine = engine(page, db);
    let reply = engine.handle("list workflows").await;
    assert!(reply.ok);
    assert!(reply.message.contains("daily"));
}

#[tokio::test(start_paused = true)]
async fn smart_fill_then_template_snapshot() {
    let page = Arc::new(MockPage::new());
    let db = Database::open_in_memory().unwrap();
    let mut engine = engine(Arc::clone(&page), db);

    engine.profile_mut().set("email", "me@site.com");
    engine.profile_mut().set("phone", "555-0199");
    engine.profile_mut().set("name", "Jo Doe");

    let reply = engine.handle("autofill").await;
    assert!(reply.ok, "{}", reply.message);
    assert_eq!(page.field_value("#email"), Some("me@site.com".into()));
    assert_eq!(page.field_value("#phone"), Some("555-0199".into()));

    let reply = engine.handle("save template as defaults").await;
    assert!(reply.ok, "{}", reply.message);

    page.clear_fields().await.unwrap();
    let reply = engine.handle("apply template defaults").await;
    assert!(reply.ok, "{}", reply.message);
    assert_eq!(page.field_value("#email"), Some("me@site.com".into()));
}

#[test]
fn recorder_is_usable_standalone() {
    let mut recorder = Recorder::new();
    recorder.start();
    recorder.record(Action::Fill {
        field: "email".into(),
        value: FillValue::literal("a@b.com"),
    });
    let mac = recorder.stop(None, "https://example.com".into()).unwrap();
    assert_eq!(mac.actions.len(), 1);
    assert!(!mac.name.is_empty());
}
