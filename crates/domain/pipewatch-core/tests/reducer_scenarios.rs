use pipewatch_core::{derive_agent_states, detail_log, AgentStatus, Event, EventKind};

// --- Helper Functions to build logs easily ---

fn pipeline(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn ev(id: &str, agent: &str, kind: EventKind) -> Event {
    Event::new(id, agent, kind, format!("{agent} {id}"))
}

// --- Tests ---

#[test]
fn failure_mid_pipeline_leaves_later_workers_pending() {
    let workers = pipeline(&["Planner", "Researcher", "Writer"]);
    let log = vec![
        ev("1", "Planner", EventKind::Start),
        ev("2", "Planner", EventKind::Success),
        ev("3", "Researcher", EventKind::Start),
        ev("4", "Researcher", EventKind::Error),
    ];

    let board = derive_agent_states(&workers, &log);

    assert_eq!(board.status_of("Planner"), Some(AgentStatus::Done));
    assert_eq!(board.status_of("Researcher"), Some(AgentStatus::Error));
    assert_eq!(board.status_of("Writer"), Some(AgentStatus::Pending));
}

#[test]
fn retry_then_success_ends_done() {
    let workers = pipeline(&["Writer"]);
    let log = vec![
        ev("a", "Writer", EventKind::Start),
        ev("b", "Writer", EventKind::Retry),
        ev("c", "Writer", EventKind::Success),
    ];

    let board = derive_agent_states(&workers, &log);
    let writer = board.get("Writer").unwrap();
    assert_eq!(writer.status, AgentStatus::Done);
    assert_eq!(writer.message.as_deref(), Some("Writer c"));
}

#[test]
fn replaying_a_log_is_idempotent() {
    let workers = pipeline(&["Planner", "Researcher", "Writer", "Reviewer"]);
    let log = vec![
        ev("1", "Planner", EventKind::Start),
        ev("2", "Planner", EventKind::Info),
        ev("3", "Planner", EventKind::Success),
        ev("4", "Researcher", EventKind::Start),
        ev("5", "Researcher", EventKind::Retry),
    ];

    let first = derive_agent_states(&workers, &log);
    let second = derive_agent_states(&workers, &log);
    assert_eq!(first, second);
}

#[test]
fn unmentioned_workers_stay_pending() {
    let workers = pipeline(&["Planner", "Researcher", "Writer", "Reviewer"]);
    let log = vec![ev("1", "Planner", EventKind::Start)];

    let board = derive_agent_states(&workers, &log);
    for name in ["Researcher", "Writer", "Reviewer"] {
        assert_eq!(board.status_of(name), Some(AgentStatus::Pending), "{name}");
        assert!(board.get(name).unwrap().message.is_none());
    }
}

#[test]
fn info_events_do_not_change_status_but_are_kept_for_details() {
    let workers = pipeline(&["Researcher"]);
    let log = vec![
        ev("1", "Researcher", EventKind::Start),
        ev("2", "Researcher", EventKind::Info),
        ev("3", "Researcher", EventKind::Retry),
        ev("4", "Researcher", EventKind::Info),
    ];

    let board = derive_agent_states(&workers, &log);
    assert_eq!(board.status_of("Researcher"), Some(AgentStatus::Retrying));

    let details: Vec<&str> = detail_log(&log, "Researcher")
        .into_iter()
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(details, vec!["2", "3", "4"]);
}

#[test]
fn unknown_agents_and_kinds_do_not_disturb_known_workers() {
    let workers = pipeline(&["Planner", "Writer"]);
    let log = vec![
        ev("1", "Planner", EventKind::Start),
        ev("2", "Ghost", EventKind::Error),
        ev("3", "Planner", EventKind::Other("paused".into())),
    ];

    let board = derive_agent_states(&workers, &log);
    assert_eq!(board.len(), 2);
    assert!(!board.contains("Ghost"));
    assert_eq!(board.status_of("Planner"), Some(AgentStatus::Running));
    assert_eq!(board.status_of("Writer"), Some(AgentStatus::Pending));
}

#[test]
fn revision_loop_restarts_writer() {
    let workers = pipeline(&["Writer", "Reviewer"]);
    let log = vec![
        ev("1", "Writer", EventKind::Start),
        ev("2", "Writer", EventKind::Success),
        ev("3", "Reviewer", EventKind::Start),
        ev("4", "Reviewer", EventKind::Success),
        ev("5", "Writer", EventKind::Start),
    ];

    let board = derive_agent_states(&workers, &log);
    assert_eq!(board.status_of("Writer"), Some(AgentStatus::Running));
    assert_eq!(board.status_of("Reviewer"), Some(AgentStatus::Done));
}

#[test]
fn board_follows_caller_pipeline_order_without_duplicates() {
    let workers = pipeline(&["Planner", "Writer", "Planner"]);
    let board = derive_agent_states(&workers, std::iter::empty());

    let names: Vec<&str> = board.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Planner", "Writer"]);
}
