//! End-to-end mutation tests: server, gateway, coordinator, and
//! reconciler wired together, asserting the page the view lands on
//! after each mutation.

use std::sync::Arc;
use std::time::Duration;

use taskboard::coordinator::{self, CoordinatorConfig, CoordinatorHandle, QueryInput};
use taskboard::gateway::{GatewayError, HttpGateway, TaskGateway};
use taskboard::model::{PageQuery, TaskDraft, TaskPatch, TaskStatus};
use taskboard::reconcile::{MutationError, MutationReconciler};
use taskboard::store::StoreHandle;
use taskboard_proto::record::WireDraft;
use taskboard_server::routes;
use taskboard_server::store::TaskStore;

struct Harness {
    store: StoreHandle,
    coordinator: CoordinatorHandle,
    reconciler: MutationReconciler<HttpGateway>,
}

async fn start(seed_titles: &[&str]) -> Harness {
    let (addr, _handle) = routes::start_server("127.0.0.1:0", Arc::new(TaskStore::new()))
        .await
        .expect("failed to start test server");

    let gateway = Arc::new(HttpGateway::new(&format!("http://{addr}/api")).unwrap());
    for title in seed_titles {
        gateway
            .create(&WireDraft {
                title: (*title).to_string(),
                description: String::new(),
                assignee: "maria".to_string(),
                due_date: "2024-06-01T00:00:00.000Z".to_string(),
                status: "TODO".to_string(),
            })
            .await
            .unwrap();
    }

    let store = StoreHandle::new();
    let coordinator = coordinator::spawn(
        CoordinatorConfig {
            settle_window: Duration::from_millis(25),
            channel_capacity: 16,
            initial: PageQuery::default(),
        },
        store.clone(),
        Arc::clone(&gateway),
    );
    let reconciler = MutationReconciler::new(gateway, store.clone(), &coordinator);

    Harness {
        store,
        coordinator,
        reconciler,
    }
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: String::new(),
        assignee: "omar".to_string(),
        due_date: chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        status: TaskStatus::Todo,
    }
}

/// Sleeps long enough for debounce plus a round trip to the server.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

const SEED_FULL_PAGE: [&str; 5] = ["One", "Two", "Three", "Four", "Five"];
const SEED_TWO_PAGES: [&str; 6] = ["One", "Two", "Three", "Four", "Five", "Six"];

#[tokio::test]
async fn create_jumps_to_the_new_last_page() {
    let h = start(&SEED_FULL_PAGE).await;
    settle().await;
    assert_eq!(h.store.snapshot().total, 5);

    // The sixth task opens page 2; the view follows it there.
    h.reconciler.create(&draft("Six")).await.unwrap();
    settle().await;

    let snapshot = h.store.snapshot();
    assert_eq!(h.coordinator.query.borrow().page, 2);
    assert_eq!(snapshot.total, 6);
    let titles: Vec<_> = snapshot.tasks_in_order().iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["One".to_string()]);
}

#[tokio::test]
async fn delete_last_item_on_a_page_steps_back() {
    let h = start(&SEED_TWO_PAGES).await;
    settle().await;

    h.coordinator.inputs.send(QueryInput::Page(2)).await.unwrap();
    settle().await;
    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.entities.len(), 1);
    let lone_id = snapshot.tasks_in_order()[0].id.clone();

    let remaining = h.reconciler.remove(&lone_id).await.unwrap();
    settle().await;

    assert_eq!(remaining, 5);
    assert_eq!(h.coordinator.query.borrow().page, 1);
    assert_eq!(h.store.snapshot().entities.len(), 5);
}

#[tokio::test]
async fn delete_with_neighbors_reloads_in_place() {
    let h = start(&SEED_FULL_PAGE).await;
    settle().await;

    let id = h.store.snapshot().tasks_in_order()[0].id.clone();
    h.reconciler.remove(&id).await.unwrap();
    settle().await;

    let snapshot = h.store.snapshot();
    assert_eq!(h.coordinator.query.borrow().page, 1);
    assert_eq!(snapshot.total, 4);
    assert!(!snapshot.entities.contains_key(&id));
}

#[tokio::test]
async fn patch_round_trips_through_the_server() {
    let h = start(&SEED_FULL_PAGE).await;
    settle().await;

    let id = h.store.snapshot().tasks_in_order()[0].id.clone();
    let task = h
        .reconciler
        .patch(&id, &TaskPatch::status(TaskStatus::Done))
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::Done);
    settle().await;

    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.entities[&id].status, TaskStatus::Done);
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn replace_keeps_the_current_page() {
    let h = start(&SEED_TWO_PAGES).await;
    settle().await;

    h.coordinator.inputs.send(QueryInput::Page(2)).await.unwrap();
    settle().await;
    let id = h.store.snapshot().tasks_in_order()[0].id.clone();

    h.reconciler.replace(&id, &draft("Renamed")).await.unwrap();
    settle().await;

    assert_eq!(h.coordinator.query.borrow().page, 2);
    assert_eq!(h.store.snapshot().entities[&id].title, "Renamed");
}

#[tokio::test]
async fn duplicate_title_is_returned_inline() {
    let h = start(&SEED_FULL_PAGE).await;
    settle().await;

    let err = h.reconciler.create(&draft("One")).await.unwrap_err();
    assert_eq!(err, MutationError::Gateway(GatewayError::Conflict));

    // The view is untouched: no error banner, no page change.
    settle().await;
    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.total, 5);
    assert_eq!(h.coordinator.query.borrow().page, 1);
}

#[tokio::test]
async fn server_validation_messages_reach_the_caller() {
    let h = start(&[]).await;
    settle().await;

    let mut bad = draft("Valid title");
    bad.title = String::new();
    bad.assignee = String::new();
    let err = h.reconciler.create(&bad).await.unwrap_err();

    let MutationError::Gateway(GatewayError::Validation(errors)) = err else {
        panic!("expected validation error, got {err:?}");
    };
    assert!(errors.iter().any(|e| e.contains("title")));
    assert!(errors.iter().any(|e| e.contains("assignee")));
}

#[tokio::test]
async fn deleting_a_vanished_task_resyncs_the_page() {
    let h = start(&SEED_FULL_PAGE).await;
    settle().await;

    let err = h.reconciler.remove("ghost").await.unwrap_err();
    assert_eq!(err, MutationError::Gateway(GatewayError::NotFound));

    settle().await;
    let snapshot = h.store.snapshot();
    assert_eq!(snapshot.total, 5);
    assert_eq!(snapshot.error, None);
}
