use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use tempfile::TempDir;
use toddler_activities::{
    router, ActivityClient, ActivityController, ActivityPatch, ActivityStore, AppState,
    CatalogSource, ClientError, CompletionLedger, Environment, NewActivity, ViewState, WriteGate,
};

async fn spawn_app(gate: WriteGate) -> String {
    let store = ActivityStore::in_memory().await.expect("in-memory store");
    let app = router(AppState::new(store, gate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind random port");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn activity(category: &str, title: &str) -> NewActivity {
    NewActivity {
        category: category.into(),
        title: title.into(),
        description: format!("{title} time"),
    }
}

async fn seeded_controller(titles: &[&str]) -> (ActivityController, TempDir) {
    let base_url = spawn_app(WriteGate::development()).await;
    let client = ActivityClient::new(&base_url);
    for title in titles {
        client.create(&activity("Imaginative Play", title)).await.unwrap();
    }

    let dir = tempfile::tempdir().unwrap();
    let controller = ActivityController::load(client, dir.path().join("ledger.json"))
        .await
        .unwrap();
    (controller, dir)
}

#[tokio::test]
async fn load_fetches_catalog_and_starts_with_nothing_displayed() {
    let (controller, _dir) = seeded_controller(&["Tea Party", "Puppets"]).await;

    assert_eq!(controller.catalog().len(), 2);
    assert_eq!(controller.view_state(), ViewState::NoActivity);
}

#[tokio::test]
async fn pick_covers_the_catalog_and_may_repeat() {
    let (mut controller, _dir) = seeded_controller(&["Tea Party", "Puppets", "Dress Up"]).await;
    let mut rng = StdRng::seed_from_u64(7);

    let mut seen = HashSet::new();
    for _ in 0..200 {
        let picked = controller.pick_with(&mut rng).unwrap();
        seen.insert(picked.id.clone());
    }
    assert_eq!(seen.len(), 3);
    assert!(matches!(controller.view_state(), ViewState::Displaying(_)));
}

#[tokio::test]
async fn pick_on_empty_catalog_fails() {
    let (mut controller, _dir) = seeded_controller(&[]).await;

    let err = controller.pick_another().await.unwrap_err();
    assert!(matches!(err, ClientError::EmptyCatalog));
}

#[tokio::test]
async fn mark_done_increments_server_and_ledger() {
    let (mut controller, dir) = seeded_controller(&["Tea Party"]).await;
    let id = controller.pick_another().await.unwrap().id.clone();

    assert_eq!(controller.mark_done().await.unwrap(), 1);
    assert_eq!(controller.mark_done().await.unwrap(), 2);
    assert_eq!(controller.completion_count(&id), 2);
    assert_eq!(controller.total_completions(), 2);

    let persisted = CompletionLedger::load(dir.path().join("ledger.json")).await;
    assert_eq!(persisted.count(&id), 2);

    // Server and ledger agree after a resync.
    controller.refresh().await.unwrap();
    assert_eq!(controller.catalog()[0].completion_count, 2);
    assert_eq!(controller.completion_count(&id), 2);
}

#[tokio::test]
async fn mark_done_without_display_fails() {
    let (mut controller, _dir) = seeded_controller(&["Tea Party"]).await;

    let err = controller.mark_done().await.unwrap_err();
    assert!(matches!(err, ClientError::NothingDisplayed));
}

#[tokio::test]
async fn add_edit_delete_resync_the_cache() {
    let (mut controller, _dir) = seeded_controller(&["Tea Party"]).await;

    let created = controller.add(activity("Outdoor", "Bubbles")).await.unwrap();
    assert_eq!(controller.catalog().len(), 2);
    assert_eq!(controller.current().map(|a| a.id.as_str()), Some(created.id.as_str()));

    let patch = ActivityPatch {
        description: Some("Chase the bubbles".into()),
        ..ActivityPatch::default()
    };
    controller.edit(&created.id, &patch).await.unwrap();
    assert_eq!(
        controller.current().map(|a| a.description.as_str()),
        Some("Chase the bubbles")
    );

    controller.set_count(&created.id, 4).await.unwrap();
    assert_eq!(controller.completion_count(&created.id), 4);

    controller.delete(&created.id).await.unwrap();
    assert_eq!(controller.catalog().len(), 1);
    assert!(controller.current().is_none());
}

#[tokio::test]
async fn stats_sort_by_completions() {
    let (mut controller, _dir) = seeded_controller(&["Tea Party", "Puppets"]).await;
    let puppets = controller
        .catalog()
        .iter()
        .find(|a| a.title == "Puppets")
        .unwrap()
        .id
        .clone();
    controller.show(&puppets).unwrap();
    controller.mark_done().await.unwrap();

    let report = controller.stats(None);
    assert_eq!(report.entries[0].title, "Puppets");
    assert_eq!(report.total_completions, 1);
    assert_eq!(report.categories, vec!["All", "Imaginative Play"]);
}

#[tokio::test]
async fn gated_server_surfaces_forbidden() {
    let base_url = spawn_app(WriteGate::new(Environment::Production, false)).await;
    let client = ActivityClient::new(&base_url);

    let err = client.create(&activity("Outdoor", "Bubbles")).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_falls_back_to_catalog_file() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("activities.json");
    std::fs::write(
        &catalog,
        r#"[{"id":"1","category":"Outdoor","title":"Bubbles","description":"Blow bubbles"}]"#,
    )
    .unwrap();

    // Port 9 (discard) is not expected to be serving HTTP.
    let client = ActivityClient::new("http://127.0.0.1:9").with_fallback_catalog(&catalog);
    let activities = client.list().await.unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0].completion_count, 0);

    let bare = ActivityClient::new("http://127.0.0.1:9");
    assert!(matches!(bare.list().await, Err(ClientError::Http(_))));
}

#[tokio::test]
async fn fallback_load_keeps_persisted_completions() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = dir.path().join("activities.json");
    std::fs::write(
        &catalog,
        r#"[{"id":"1","category":"Outdoor","title":"Bubbles","description":"Blow bubbles"}]"#,
    )
    .unwrap();

    let ledger_path = dir.path().join("ledger.json");
    let mut seeded = CompletionLedger::empty(&ledger_path);
    seeded.record("1", 7);
    seeded.persist().await.unwrap();

    let client = ActivityClient::new("http://127.0.0.1:9").with_fallback_catalog(&catalog);
    let (_, source) = client.list_with_source().await.unwrap();
    assert_eq!(source, CatalogSource::Fallback);

    let controller = ActivityController::load(client, &ledger_path).await.unwrap();
    assert_eq!(controller.completion_count("1"), 7);
    assert_eq!(controller.catalog()[0].completion_count, 7);
    assert_eq!(controller.stats(None).total_completions, 7);

    let persisted = CompletionLedger::load(&ledger_path).await;
    assert_eq!(persisted.count("1"), 7);
}

#[tokio::test]
async fn server_load_replaces_stale_completions() {
    let base_url = spawn_app(WriteGate::development()).await;
    let client = ActivityClient::new(&base_url);
    let created = client.create(&activity("Outdoor", "Bubbles")).await.unwrap();
    let (_, source) = client.list_with_source().await.unwrap();
    assert_eq!(source, CatalogSource::Server);

    let dir = tempfile::tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.json");
    let mut stale = CompletionLedger::empty(&ledger_path);
    stale.record(&created.id, 9);
    stale.persist().await.unwrap();

    let controller = ActivityController::load(client, &ledger_path).await.unwrap();
    assert_eq!(controller.completion_count(&created.id), 0);
    assert_eq!(CompletionLedger::load(&ledger_path).await.count(&created.id), 0);
}

#[tokio::test]
async fn client_deletes_by_title() {
    let base_url = spawn_app(WriteGate::development()).await;
    let client = ActivityClient::new(&base_url);
    client.create(&activity("Outdoor", "Bubbles")).await.unwrap();

    let deleted = client.delete_by_title("Bubbles").await.unwrap();
    assert!(deleted.success);
    assert_eq!(deleted.identifier, "Bubbles");

    let err = client.delete_by_title("Bubbles").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
