//! End-to-end listing tests: a real server, a real HTTP gateway, and the
//! query coordinator in between.
//!
//! The coordinator runs with a short settle window; tests sleep past it
//! and then assert on the published store snapshot.

use std::sync::Arc;
use std::time::Duration;

use taskboard::coordinator::{self, CoordinatorConfig, CoordinatorHandle, QueryInput};
use taskboard::gateway::{HttpGateway, TaskGateway};
use taskboard::model::{PageQuery, TaskStatus};
use taskboard::store::StoreHandle;
use taskboard_proto::record::WireDraft;
use taskboard_server::routes;
use taskboard_server::store::TaskStore;

const SETTLE: Duration = Duration::from_millis(25);

struct Harness {
    gateway: Arc<HttpGateway>,
    store: StoreHandle,
    coordinator: CoordinatorHandle,
}

/// Starts a server, seeds it, and spawns a coordinator against it.
async fn start(seed_titles: &[&str]) -> Harness {
    let (addr, _handle) = routes::start_server("127.0.0.1:0", Arc::new(TaskStore::new()))
        .await
        .expect("failed to start test server");

    let gateway = Arc::new(HttpGateway::new(&format!("http://{addr}/api")).unwrap());
    for title in seed_titles {
        gateway.create(&draft(title, "maria")).await.unwrap();
    }

    let store = StoreHandle::new();
    let coordinator = coordinator::spawn(
        CoordinatorConfig {
            settle_window: SETTLE,
            channel_capacity: 16,
            initial: PageQuery::default(),
        },
        store.clone(),
        Arc::clone(&gateway),
    );

    Harness {
        gateway,
        store,
        coordinator,
    }
}

fn draft(title: &str, assignee: &str) -> WireDraft {
    WireDraft {
        title: title.to_string(),
        description: String::new(),
        assignee: assignee.to_string(),
        due_date: "2024-06-01T00:00:00.000Z".to_string(),
        status: "TODO".to_string(),
    }
}

/// Sleeps long enough for debounce plus a round trip to the server.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

fn titles(store: &StoreHandle) -> Vec<String> {
    store
        .snapshot()
        .tasks_in_order()
        .iter()
        .map(|t| t.title.clone())
        .collect()
}

const SEED: [&str; 6] = [
    "Fix login bug",
    "Write onboarding docs",
    "Ship release",
    "Review auth flow",
    "Update dependencies",
    "Plan sprint",
];

#[tokio::test]
async fn initial_load_fills_first_page_newest_first() {
    let h = start(&SEED).await;
    settle().await;

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.total, 6);
    assert_eq!(snapshot.entities.len(), 5);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(titles(&h.store)[0], "Plan sprint");
}

#[tokio::test]
async fn page_two_holds_the_remainder() {
    let h = start(&SEED).await;
    settle().await;

    h.coordinator.inputs.send(QueryInput::Page(2)).await.unwrap();
    settle().await;

    assert_eq!(titles(&h.store), vec!["Fix login bug".to_string()]);
    assert_eq!(h.store.snapshot().total, 6);
    assert_eq!(h.coordinator.query.borrow().page, 2);
}

#[tokio::test]
async fn typed_filter_settles_into_one_request_and_resets_page() {
    let h = start(&SEED).await;
    settle().await;

    h.coordinator.inputs.send(QueryInput::Page(2)).await.unwrap();
    settle().await;

    // Simulate keystrokes arriving faster than the settle window.
    for prefix in ["f", "fi", "fix"] {
        h.coordinator
            .inputs
            .send(QueryInput::FilterText(prefix.to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    settle().await;

    let query = h.coordinator.query.borrow().clone();
    assert_eq!(query.filter_text, "fix");
    assert_eq!(query.page, 1, "filter change must reset to the first page");
    assert_eq!(titles(&h.store), vec!["Fix login bug".to_string()]);
    assert_eq!(h.store.snapshot().total, 1);
}

#[tokio::test]
async fn status_filter_narrows_the_listing() {
    let h = start(&SEED).await;
    settle().await;

    // Mark one task done, server-side.
    let id = h.store.snapshot().tasks_in_order()[0].id.clone();
    h.gateway
        .patch(
            &id,
            &taskboard_proto::record::WirePatch {
                status: Some("DONE".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    h.coordinator
        .inputs
        .send(QueryInput::Status(Some(TaskStatus::Done)))
        .await
        .unwrap();
    settle().await;

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.tasks_in_order()[0].status, TaskStatus::Done);
    assert_eq!(snapshot.filter_status, Some(TaskStatus::Done));
}

#[tokio::test]
async fn page_size_change_applies_without_debounce() {
    let h = start(&SEED).await;
    settle().await;

    h.coordinator.inputs.send(QueryInput::PageSize(3)).await.unwrap();
    settle().await;

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.entities.len(), 3);
    assert_eq!(snapshot.total, 6);
    assert_eq!(h.coordinator.query.borrow().page_size, 3);
}

#[tokio::test]
async fn page_past_the_end_yields_empty_page_with_total() {
    let h = start(&SEED).await;
    settle().await;

    h.coordinator.inputs.send(QueryInput::Page(9)).await.unwrap();
    settle().await;

    let snapshot = h.store.snapshot();
    assert!(snapshot.entities.is_empty());
    assert_eq!(snapshot.total, 6);
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn server_gone_surfaces_error_and_clears_loading() {
    // Gateway pointed at a port nothing listens on.
    let gateway = Arc::new(HttpGateway::new("http://127.0.0.1:9/api").unwrap());
    let store = StoreHandle::new();
    let coordinator = coordinator::spawn(
        CoordinatorConfig {
            settle_window: SETTLE,
            channel_capacity: 16,
            initial: PageQuery::default(),
        },
        store.clone(),
        Arc::clone(&gateway),
    );
    settle().await;

    let snapshot = store.snapshot();
    assert!(snapshot.error.is_some());
    assert!(!snapshot.loading);
    drop(coordinator);
}
