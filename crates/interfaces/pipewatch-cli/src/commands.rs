use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use pipewatch_core::{
    AgentStatus, CreateTaskRequest, Event, TaskId, TaskOutcome, TaskSnapshot,
};
use pipewatch_infra::{default_http_client, TaskApiClient};
use pipewatch_tracker::{AgentRow, TaskTracker, TrackerConfig, TrackingView, Update};
use std::time::Duration;
use tracing::debug;

fn api_client(server: &str) -> Result<TaskApiClient> {
    let client = default_http_client().context("Failed to build HTTP client")?;
    TaskApiClient::new(client, server).with_context(|| format!("Invalid server url {server}"))
}

pub async fn cmd_submit(server: &str, prompt: &str, pipeline: Vec<String>) -> Result<TaskId> {
    println!(":: Submitting task...");
    println!("   Pipeline: {}", pipeline.join(" -> "));

    let api = api_client(server)?;
    let created = api
        .create_task(&CreateTaskRequest::new(prompt, pipeline))
        .await
        .context("Task submission failed")?;

    println!("   Task ID:  {}", created.task_id);
    Ok(created.task_id)
}

fn status_icon(status: AgentStatus) -> &'static str {
    match status {
        AgentStatus::Pending => "·",
        AgentStatus::Running => "▶",
        AgentStatus::Done => "✓",
        AgentStatus::Retrying => "↻",
        AgentStatus::Error => "✗",
    }
}

fn agent_line(row: &AgentRow) -> String {
    let msg = row.message.as_deref().unwrap_or("");
    format!("{} {:<9} {}", status_icon(row.status), row.status, msg)
}

/// Follow a task until its final snapshot arrives. Returns the last view.
pub async fn cmd_watch(
    server: &str,
    task_id: &str,
    pipeline: Vec<String>,
    poll_ms: u64,
) -> Result<TrackingView> {
    println!(":: Watching task {task_id}");

    let api = Arc::new(api_client(server)?);
    let mut tracker = TaskTracker::new(
        api.clone(),
        api,
        TrackerConfig::with_poll_interval_ms(poll_ms),
    );
    tracker.track(task_id, pipeline);

    let m = MultiProgress::new();
    let sty = ProgressStyle::with_template("{spinner:.green} {prefix:<12} {msg}")
        .context("Invalid progress template")?;
    let mut bars: HashMap<String, ProgressBar> = HashMap::new();
    if let Some(view) = tracker.view() {
        for row in &view.agents {
            let pb = m.add(ProgressBar::new_spinner());
            pb.set_style(sty.clone());
            pb.set_prefix(row.name.clone());
            pb.set_message(agent_line(row));
            bars.insert(row.name.clone(), pb);
        }
    }

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        let next = tokio::select! {
            update = tracker.next_update() => Some(update),
            _ = &mut interrupt => None,
        };
        let Some(update) = next else {
            tracker.stop();
            for pb in bars.values() {
                pb.abandon();
            }
            anyhow::bail!("Interrupted");
        };
        let Some(update) = update else {
            anyhow::bail!("Tracking ended before the task finished");
        };

        match &update {
            Update::EventLogged(ev) => log_event(&m, ev),
            Update::StreamClosed { reason: Some(reason) } => {
                let _ = m.println(format!("   Event stream closed: {reason}"));
            }
            Update::SnapshotFailed(message) => debug!(%message, "snapshot fetch failed"),
            _ => {}
        }

        let view = tracker
            .view()
            .context("Tracking session disappeared")?;
        for row in &view.agents {
            if let Some(pb) = bars.get(&row.name) {
                pb.set_message(agent_line(row));
                if row.status.is_active() {
                    pb.enable_steady_tick(Duration::from_millis(100));
                } else {
                    pb.disable_steady_tick();
                    pb.tick();
                }
            }
        }

        if view.final_snapshot.is_some() {
            for pb in bars.values() {
                pb.finish();
            }
            return Ok(view);
        }
    }
}

fn log_event(m: &MultiProgress, ev: &Event) {
    let at = ev
        .created_at_utc()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".into());
    let _ = m.println(format!("   [{at}] {} {}: {}", ev.agent_name, ev.event_type, ev.message));
}

/// Print the outcome of a finished task. A failed task is an error.
pub fn report_outcome(view: &TrackingView) -> Result<()> {
    match view.outcome() {
        Some(TaskOutcome::Completed { final_report }) => {
            println!("\n:: Task completed");
            match final_report {
                Some(report) => println!("{report}"),
                None => println!("   (no final report)"),
            }
            Ok(())
        }
        Some(TaskOutcome::Failed { error }) => anyhow::bail!("Task failed: {error}"),
        None => anyhow::bail!("Task has not finished"),
    }
}

pub async fn cmd_status(server: &str, task_id: &str) -> Result<TaskSnapshot> {
    let api = api_client(server)?;
    let snap = api
        .fetch_task(task_id)
        .await
        .with_context(|| format!("Failed to fetch task {task_id}"))?;

    println!(":: Task {}", snap.id);
    println!("   Status:  {}", snap.status);
    if let Some(created) = &snap.created_at {
        println!("   Created: {created}");
    }
    if let Some(updated) = &snap.updated_at {
        println!("   Updated: {updated}");
    }
    match snap.outcome() {
        Some(TaskOutcome::Completed {
            final_report: Some(report),
        }) => println!("\n{report}"),
        Some(TaskOutcome::Failed { error }) => println!("   Error:   {error}"),
        _ => {}
    }
    Ok(snap)
}

pub async fn cmd_list(server: &str) -> Result<Vec<TaskSnapshot>> {
    let api = api_client(server)?;
    let tasks = api.list_tasks().await.context("Failed to list tasks")?;

    if tasks.is_empty() {
        println!(":: No tasks");
    }
    for t in &tasks {
        let prompt: String = t.prompt.chars().take(48).collect();
        println!(
            "{:<38} {:<12} {:<26} {}",
            t.id,
            t.status,
            t.created_at.as_deref().unwrap_or("-"),
            prompt
        );
    }
    Ok(tasks)
}
