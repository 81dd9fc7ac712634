//! Taskboard — interactive task board client.
//!
//! Talks to the task API and keeps a paginated, filtered view in sync.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Against a local server
//! cargo run --bin taskboard -- --api-url http://127.0.0.1:4000/api
//!
//! # Or via environment variables
//! TASKBOARD_API_URL=http://127.0.0.1:4000/api cargo run --bin taskboard
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use taskboard::config::{CliArgs, ClientConfig};
use taskboard::coordinator::{self, QueryInput};
use taskboard::gateway::HttpGateway;
use taskboard::model::{PageQuery, TaskDraft, TaskPatch, TaskStatus};
use taskboard::reconcile::MutationReconciler;
use taskboard::store::{Snapshot, StoreEvent, StoreHandle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    init_logging(&cli.log_level);
    tracing::info!(api_url = %config.api_url, "taskboard starting");

    let gateway = Arc::new(HttpGateway::new(&config.api_url)?);
    let store = StoreHandle::new();
    let coordinator = coordinator::spawn(
        config.to_coordinator_config(),
        store.clone(),
        Arc::clone(&gateway),
    );
    let reconciler = MutationReconciler::new(gateway, store.clone(), &coordinator);

    run_repl(&store, &coordinator, &reconciler).await;

    // Both input senders must drop before the coordinator task exits.
    drop(reconciler);
    drop(coordinator.inputs);
    let _ = coordinator.task.await;
    tracing::info!("taskboard exiting");
    Ok(())
}

/// Initialize stderr logging; `RUST_LOG` overrides the CLI level.
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();
}

/// Line-driven command loop. Re-renders whenever the store changes.
async fn run_repl(
    store: &StoreHandle,
    coordinator: &coordinator::CoordinatorHandle,
    reconciler: &MutationReconciler<HttpGateway>,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshots = store.subscribe();
    let mut query = coordinator.query.clone();

    println!("taskboard ready — type `help` for commands");

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if !snapshot.loading {
                    render(&snapshot, &query.borrow_and_update());
                }
            }
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                match parse_command(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        dispatch(command, store, coordinator, reconciler, &query).await;
                    }
                    Err(message) => println!("{message}"),
                }
            }
        }
    }
}

/// One parsed user command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Filter(String),
    Status(Option<TaskStatus>),
    Page(u32),
    Next,
    Prev,
    Size(u32),
    Refresh,
    Add(TaskDraft),
    SetStatus(String, TaskStatus),
    Remove(String),
    Select(Option<String>),
    Help,
    Quit,
}

/// Parses a command line. Returns a user-facing message on bad input.
fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb {
        "filter" => Ok(Command::Filter(rest.to_string())),
        "status" => match rest {
            "" | "all" => Ok(Command::Status(None)),
            other => other
                .to_uppercase()
                .parse()
                .map(|s| Command::Status(Some(s)))
                .map_err(|_| "status: expected todo, in_progress, done, or all".to_string()),
        },
        "page" => rest
            .parse()
            .map(Command::Page)
            .map_err(|_| "page: expected a number".to_string()),
        "next" => Ok(Command::Next),
        "prev" => Ok(Command::Prev),
        "size" => rest
            .parse()
            .map(Command::Size)
            .map_err(|_| "size: expected a number".to_string()),
        "refresh" => Ok(Command::Refresh),
        "add" => parse_draft(rest).map(Command::Add),
        "todo" | "start" | "done" => {
            if rest.is_empty() {
                return Err(format!("{verb}: expected a task id"));
            }
            let status = match verb {
                "todo" => TaskStatus::Todo,
                "start" => TaskStatus::InProgress,
                _ => TaskStatus::Done,
            };
            Ok(Command::SetStatus(rest.to_string(), status))
        }
        "rm" => {
            if rest.is_empty() {
                Err("rm: expected a task id".to_string())
            } else {
                Ok(Command::Remove(rest.to_string()))
            }
        }
        "select" => Ok(Command::Select(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Ok(Command::Refresh),
        other => Err(format!("unknown command: {other} (try `help`)")),
    }
}

/// Parses `add title; assignee; YYYY-MM-DD[; description]`.
fn parse_draft(rest: &str) -> Result<TaskDraft, String> {
    let mut parts = rest.splitn(4, ';').map(str::trim);
    let (Some(title), Some(assignee), Some(day)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err("add: expected `title; assignee; YYYY-MM-DD[; description]`".to_string());
    };
    let due_date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| format!("add: invalid due date {day:?}"))?;
    Ok(TaskDraft {
        title: title.to_string(),
        description: parts.next().unwrap_or_default().to_string(),
        assignee: assignee.to_string(),
        due_date,
        status: TaskStatus::Todo,
    })
}

async fn dispatch(
    command: Command,
    store: &StoreHandle,
    coordinator: &coordinator::CoordinatorHandle,
    reconciler: &MutationReconciler<HttpGateway>,
    query: &tokio::sync::watch::Receiver<PageQuery>,
) {
    let result = match command {
        Command::Filter(text) => send_input(coordinator, QueryInput::FilterText(text)).await,
        Command::Status(status) => send_input(coordinator, QueryInput::Status(status)).await,
        Command::Page(page) => send_input(coordinator, QueryInput::Page(page.max(1))).await,
        Command::Next => {
            let page = query.borrow().page + 1;
            send_input(coordinator, QueryInput::Page(page)).await
        }
        Command::Prev => {
            let page = query.borrow().page.saturating_sub(1).max(1);
            send_input(coordinator, QueryInput::Page(page)).await
        }
        Command::Size(size) => send_input(coordinator, QueryInput::PageSize(size.max(1))).await,
        Command::Refresh => {
            let page = query.borrow().page;
            send_input(coordinator, QueryInput::Refresh { page }).await
        }
        Command::Add(draft) => reconciler
            .create(&draft)
            .await
            .map(|task| println!("created {}", task.id))
            .map_err(|e| e.to_string()),
        Command::SetStatus(id, status) => reconciler
            .patch(&id, &TaskPatch::status(status))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string()),
        Command::Remove(id) => reconciler
            .remove(&id)
            .await
            .map(|total| println!("deleted; {total} tasks remain"))
            .map_err(|e| e.to_string()),
        Command::Select(id) => {
            store.apply(StoreEvent::Select(id));
            Ok(())
        }
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    if let Err(message) = result {
        println!("error: {message}");
    }
}

async fn send_input(
    coordinator: &coordinator::CoordinatorHandle,
    input: QueryInput,
) -> Result<(), String> {
    coordinator
        .inputs
        .send(input)
        .await
        .map_err(|_| "view coordinator stopped".to_string())
}

/// Prints the current page.
fn render(snapshot: &Snapshot, query: &PageQuery) {
    if let Some(error) = &snapshot.error {
        println!("error: {error}");
        return;
    }

    let pages = snapshot
        .total
        .div_ceil(u64::from(query.page_size.max(1)))
        .max(1);
    println!(
        "— page {}/{pages} · {} tasks{}{} —",
        query.page,
        snapshot.total,
        if query.filter_text.is_empty() {
            String::new()
        } else {
            format!(" · filter {:?}", query.filter_text)
        },
        query
            .status
            .map_or_else(String::new, |s| format!(" · status {s}")),
    );
    println!(
        "  todo {} · in progress {} · done {}",
        snapshot.count_by_status(TaskStatus::Todo),
        snapshot.count_by_status(TaskStatus::InProgress),
        snapshot.count_by_status(TaskStatus::Done),
    );
    for task in snapshot.filtered_tasks() {
        let marker = if snapshot.selected_id.as_deref() == Some(task.id.as_str()) {
            '>'
        } else {
            ' '
        };
        println!(
            "{marker} {}  [{}] {} — {} (due {})",
            task.id, task.status, task.title, task.assignee, task.due_date
        );
    }
    if let Some(task) = snapshot.selected_task()
        && !task.description.is_empty()
    {
        println!("  {}: {}", task.title, task.description);
    }
}

fn print_help() {
    println!("commands:");
    println!("  filter [text]               set or clear the text filter");
    println!("  status todo|in_progress|done|all");
    println!("  page <n> | next | prev      move between pages");
    println!("  size <n>                    items per page");
    println!("  refresh                     reload the current page");
    println!("  add title; assignee; YYYY-MM-DD[; description]");
    println!("  todo|start|done <id>        change a task's status");
    println!("  rm <id>                     delete a task");
    println!("  select [id]                 highlight or clear");
    println!("  quit");
}
