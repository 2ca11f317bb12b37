//! Roadplan CLI entry point

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use serde::Serialize;
use tracing::{debug, info};

use roadplan::cli::{Cli, Command, OutputFormat, get_log_path};
use roadplan::config::Config;
use roadplan::graph::validate_graph;
use roadplan::ordering::{check_chain, restore_order};
use roadplan::persist::{HttpTransport, SaveRequest, SaveTransport};
use roadplan::scheduler::AutoPlanMode;
use roadplan::{ChangeTracker, Planner, RoadmapData, calculate_data_changes};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<RoadmapData> {
    debug!(path = %path.display(), "read_snapshot: called");
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse snapshot {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => fs::write(path, json + "\n").context(format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        week_count = config.planning.week_count,
        policy = %config.planning.policy,
        "Roadplan loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Check { file } => cmd_check(&config, &file),
        Command::Plan { file, format, write } => cmd_plan(&config, &file, format, write),
        Command::Diff { old, new } => cmd_diff(&old, &new),
        Command::Push { old, new } => cmd_push(&config, &old, &new).await,
        Command::Pull { out } => cmd_pull(&config, out).await,
    }
}

fn cmd_check(config: &Config, file: &Path) -> Result<()> {
    debug!(file = %file.display(), "cmd_check: called");
    let data = read_snapshot(file)?;
    let mut problems = Vec::new();

    if let Err(cycle) = validate_graph(&data.tasks) {
        problems.push(format!("Blocker cycle: {}", cycle.join(" -> ")));
    }
    for task in &data.tasks {
        for blocker in &task.blocker_ids {
            if !data.tasks.iter().any(|t| t.id == *blocker) {
                problems.push(format!("Task {} is blocked by unknown task {}", task.id, blocker));
            }
        }
    }
    // Rows may arrive in any order; the pointers decide
    if let Err(e) = check_chain(&restore_order(data.resources.clone())) {
        problems.push(format!("Resources: {}", e));
    }
    if let Err(e) = check_chain(&restore_order(data.tasks.clone())) {
        problems.push(format!("Tasks: {}", e));
    }

    let week_count = config.planning.week_count;
    let lengths = data
        .resources
        .iter()
        .map(|r| (&r.id, r.weeks.len()))
        .chain(data.tasks.iter().map(|t| (&t.id, t.weeks.len())));
    for (id, len) in lengths {
        if len != week_count {
            problems.push(format!("Row {} has {} weeks, expected {}", id, len, week_count));
        }
    }

    if problems.is_empty() {
        println!(
            "{} Snapshot OK ({} resources, {} tasks, version {})",
            "✓".green(),
            data.resources.len(),
            data.tasks.len(),
            data.version
        );
        return Ok(());
    }

    for problem in &problems {
        println!("{} {}", "✗".red(), problem);
    }
    Err(eyre!("{} problem(s) found in {}", problems.len(), file.display()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskReport {
    id: String,
    task: String,
    mode: String,
    start_week: Option<u32>,
    end_week: Option<u32>,
    expected_start_week: Option<u32>,
    fact: f64,
    sprints: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceReport {
    id: String,
    function: String,
    /// 1-based overloaded weeks
    overloaded_weeks: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    tasks: Vec<TaskReport>,
    resources: Vec<ResourceReport>,
}

fn cmd_plan(config: &Config, file: &Path, format: OutputFormat, write: bool) -> Result<()> {
    debug!(file = %file.display(), ?format, write, "cmd_plan: called");
    let data = read_snapshot(file)?;
    let mut planner = Planner::new(data, config.planning.clone(), ChangeTracker::new());
    let changed = planner.replan();
    info!(changed, "Replanned snapshot");

    let tasks = planner
        .model()
        .tasks()
        .iter()
        .map(|t| TaskReport {
            id: t.id.to_string(),
            task: t.task.clone(),
            mode: AutoPlanMode::of(t).to_string(),
            start_week: t.start_week,
            end_week: t.end_week,
            expected_start_week: t.expected_start_week,
            fact: t.fact,
            sprints: t.sprints_auto.clone(),
        })
        .collect();
    let mut resources = Vec::new();
    for resource in planner.model().resources() {
        let overloaded_weeks = planner
            .overload_weeks(resource.id.as_str())?
            .iter()
            .enumerate()
            .filter(|(_, over)| **over)
            .map(|(idx, _)| idx + 1)
            .collect();
        resources.push(ResourceReport {
            id: resource.id.to_string(),
            function: resource.function.clone(),
            overloaded_weeks,
        });
    }
    let report = PlanReport { tasks, resources };

    match format {
        OutputFormat::Json => write_json(&report, None)?,
        OutputFormat::Text => print_plan(&report),
    }

    if write {
        write_json(&planner.to_data(), Some(file))?;
        println!("{} Wrote {} ({} fields changed)", "✓".green(), file.display(), changed);
    }
    Ok(())
}

fn print_plan(report: &PlanReport) {
    let week = |w: Option<u32>| w.map(|w| w.to_string()).unwrap_or_else(|| "-".to_string());
    println!("{}", "Tasks".bold());
    for task in &report.tasks {
        println!(
            "  {} {} [{}] weeks {}..{} fact {:.2}{}",
            task.id.yellow(),
            task.task,
            task.mode,
            week(task.start_week),
            week(task.end_week),
            task.fact,
            if task.sprints.is_empty() {
                String::new()
            } else {
                format!(" sprints {}", task.sprints.join(","))
            }
        );
    }

    println!("{}", "Resources".bold());
    for resource in &report.resources {
        if resource.overloaded_weeks.is_empty() {
            println!("  {} {} {}", resource.id.yellow(), resource.function, "ok".green());
        } else {
            let weeks: Vec<String> = resource.overloaded_weeks.iter().map(|w| w.to_string()).collect();
            println!(
                "  {} {} {} {}",
                resource.id.yellow(),
                resource.function,
                "overloaded in weeks".red(),
                weeks.join(",")
            );
        }
    }
}

fn cmd_diff(old: &Path, new: &Path) -> Result<()> {
    debug!(old = %old.display(), new = %new.display(), "cmd_diff: called");
    let log = calculate_data_changes(&read_snapshot(old)?, &read_snapshot(new)?)?;
    write_json(&log, None)
}

async fn cmd_push(config: &Config, old: &Path, new: &Path) -> Result<()> {
    debug!(old = %old.display(), new = %new.display(), "cmd_push: called");
    let old_data = read_snapshot(old)?;
    let log = calculate_data_changes(&old_data, &read_snapshot(new)?)?;
    if log.is_empty() {
        println!("Nothing to push");
        return Ok(());
    }

    let transport = HttpTransport::from_config(&config.server)?;
    let request = SaveRequest::new(old_data.version, config.server.user_id.clone(), log);
    let entries = request.changes.len();
    let version = transport.save(request).await?.into_result()?;

    info!(version, entries, "Pushed changes");
    println!("{} Pushed {} change(s), server version {}", "✓".green(), entries, version);
    Ok(())
}

async fn cmd_pull(config: &Config, out: Option<PathBuf>) -> Result<()> {
    debug!(?out, "cmd_pull: called");
    let transport = HttpTransport::from_config(&config.server)?;
    let data = transport.fetch().await?;
    write_json(&data, out.as_deref())?;
    if let Some(path) = out {
        println!("{} Pulled version {} into {}", "✓".green(), data.version, path.display());
    }
    Ok(())
}
