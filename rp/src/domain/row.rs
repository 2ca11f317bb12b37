//! Resource and task rows

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::RowId;

/// Task status shown in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Todo,
    Backlog,
    Cancelled,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "Todo"),
            Self::Backlog => write!(f, "Backlog"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "backlog" => Ok(Self::Backlog),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown task status: {}", s)),
        }
    }
}

/// Kind of an ordered grid row
///
/// Resources and tasks keep separate order chains and never interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Resource,
    Task,
}

impl RowKind {
    /// Entity kind used for change tracking
    pub fn entity(self) -> EntityKind {
        match self {
            Self::Resource => EntityKind::Resource,
            Self::Task => EntityKind::Task,
        }
    }
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::Task => write!(f, "task"),
        }
    }
}

/// Every entity kind that travels in a save payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Task,
    Resource,
    Team,
    Sprint,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [Self::Task, Self::Resource, Self::Team, Self::Sprint];

    /// Payload key for this kind ("tasks", "resources", ...)
    pub fn plural(self) -> &'static str {
        match self {
            Self::Task => "tasks",
            Self::Resource => "resources",
            Self::Team => "teams",
            Self::Sprint => "sprints",
        }
    }

    /// Ordered row kind, if entities of this kind live in an order chain
    pub fn row_kind(self) -> Option<RowKind> {
        match self {
            Self::Task => Some(RowKind::Task),
            Self::Resource => Some(RowKind::Resource),
            Self::Team | Self::Sprint => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task => write!(f, "task"),
            Self::Resource => write!(f, "resource"),
            Self::Team => write!(f, "team"),
            Self::Sprint => write!(f, "sprint"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// A resource row: a function with weekly capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRow {
    pub id: RowId,

    /// Team tags this capacity belongs to
    #[serde(default)]
    pub team: Vec<String>,

    /// Function tag matched against task functions
    #[serde(rename = "fn", default)]
    pub function: String,

    /// Optional named employee
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empl: Option<String>,

    /// Availability per week
    #[serde(default)]
    pub weeks: Vec<f64>,

    #[serde(default)]
    pub prev_id: Option<RowId>,

    #[serde(default)]
    pub next_id: Option<RowId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ResourceRow {
    /// Create a resource with a generated id and zero capacity
    pub fn new(function: impl Into<String>, week_count: usize) -> Self {
        Self::with_id(RowId::generate(), function, week_count)
    }

    /// Create a resource with a specific id
    pub fn with_id(id: impl Into<RowId>, function: impl Into<String>, week_count: usize) -> Self {
        let id = id.into();
        debug!(%id, week_count, "ResourceRow::with_id: called");
        Self {
            id,
            team: Vec::new(),
            function: function.into(),
            empl: None,
            weeks: vec![0.0; week_count],
            prev_id: None,
            next_id: None,
            color: None,
        }
    }

    /// Set the same availability for every week
    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.weeks.iter_mut().for_each(|w| *w = capacity);
        self
    }

    pub fn with_weeks(mut self, weeks: Vec<f64>) -> Self {
        self.weeks = weeks;
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team.push(team.into());
        self
    }

    pub fn with_empl(mut self, empl: impl Into<String>) -> Self {
        self.empl = Some(empl.into());
        self
    }

    /// Availability at a week index (0 outside the grid)
    pub fn availability(&self, week: usize) -> f64 {
        self.weeks.get(week).copied().unwrap_or(0.0)
    }
}

/// A task row: planned demand against a function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: RowId,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,

    /// Task title
    #[serde(default)]
    pub task: String,

    #[serde(default)]
    pub team: String,

    #[serde(rename = "fn", default)]
    pub function: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empl: Option<String>,

    /// Requested concurrent employment per week
    #[serde(default)]
    pub plan_empl: f64,

    /// Requested duration in weeks
    #[serde(default)]
    pub plan_weeks: u32,

    #[serde(default = "default_true")]
    pub auto_plan_enabled: bool,

    /// Allocation per week
    #[serde(default)]
    pub weeks: Vec<f64>,

    /// Tasks that must finish before this one
    #[serde(default)]
    pub blocker_ids: Vec<RowId>,

    /// 1-based week numbers this task may not start before
    #[serde(default)]
    pub week_blockers: Vec<u32>,

    #[serde(default)]
    pub prev_id: Option<RowId>,

    #[serde(default)]
    pub next_id: Option<RowId>,

    #[serde(default)]
    pub fact: f64,

    /// 1-based first planned week
    #[serde(default)]
    pub start_week: Option<u32>,

    /// 1-based last planned week
    #[serde(default)]
    pub end_week: Option<u32>,

    /// 1-based earliest start allowed by blockers
    #[serde(default)]
    pub expected_start_week: Option<u32>,

    #[serde(default)]
    pub sprints_auto: Vec<String>,
}

impl TaskRow {
    /// Create a task with a generated id, auto-plan on and an empty plan
    pub fn new(task: impl Into<String>, function: impl Into<String>, week_count: usize) -> Self {
        Self::with_id(RowId::generate(), task, function, week_count)
    }

    /// Create a task with a specific id
    pub fn with_id(
        id: impl Into<RowId>,
        task: impl Into<String>,
        function: impl Into<String>,
        week_count: usize,
    ) -> Self {
        let id = id.into();
        debug!(%id, week_count, "TaskRow::with_id: called");
        Self {
            id,
            status: TaskStatus::Todo,
            epic: None,
            task: task.into(),
            team: String::new(),
            function: function.into(),
            empl: None,
            plan_empl: 0.0,
            plan_weeks: 0,
            auto_plan_enabled: true,
            weeks: vec![0.0; week_count],
            blocker_ids: Vec::new(),
            week_blockers: Vec::new(),
            prev_id: None,
            next_id: None,
            fact: 0.0,
            start_week: None,
            end_week: None,
            expected_start_week: None,
            sprints_auto: Vec::new(),
        }
    }

    /// Set planEmpl/planWeeks
    pub fn with_plan(mut self, plan_empl: f64, plan_weeks: u32) -> Self {
        self.plan_empl = plan_empl;
        self.plan_weeks = plan_weeks;
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = team.into();
        self
    }

    pub fn with_blockers(mut self, blockers: &[&str]) -> Self {
        self.blocker_ids = blockers.iter().map(|b| RowId::from(*b)).collect();
        self
    }

    /// Switch the task to a manual plan
    pub fn with_manual_weeks(mut self, weeks: Vec<f64>) -> Self {
        self.auto_plan_enabled = false;
        self.weeks = weeks;
        self
    }

    /// Allocation at a week index (0 outside the grid)
    pub fn allocation(&self, week: usize) -> f64 {
        self.weeks.get(week).copied().unwrap_or(0.0)
    }

    /// 0-based index of the first non-zero week
    pub fn first_planned_week(&self) -> Option<usize> {
        self.weeks.iter().position(|w| *w > 0.0)
    }

    /// 0-based index of the last non-zero week
    pub fn last_planned_week(&self) -> Option<usize> {
        self.weeks.iter().rposition(|w| *w > 0.0)
    }
}
