//! Typed field changes per entity kind
//!
//! Each entity kind has a field enum (what can change) and a value enum
//! (the field together with its new value). Wire keys match the server's
//! camelCase JSON names.

use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::domain::{EntityKind, ResourceRow, RowId, Sprint, TaskRow, TaskStatus, Team};

/// Editable task fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskField {
    Status,
    Epic,
    Task,
    Team,
    Function,
    Empl,
    PlanEmpl,
    PlanWeeks,
    AutoPlanEnabled,
    Weeks,
    BlockerIds,
    WeekBlockers,
    PrevId,
    NextId,
    Fact,
    StartWeek,
    EndWeek,
    ExpectedStartWeek,
    SprintsAuto,
}

impl TaskField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Epic => "epic",
            Self::Task => "task",
            Self::Team => "team",
            Self::Function => "fn",
            Self::Empl => "empl",
            Self::PlanEmpl => "planEmpl",
            Self::PlanWeeks => "planWeeks",
            Self::AutoPlanEnabled => "autoPlanEnabled",
            Self::Weeks => "weeks",
            Self::BlockerIds => "blockerIds",
            Self::WeekBlockers => "weekBlockers",
            Self::PrevId => "prevId",
            Self::NextId => "nextId",
            Self::Fact => "fact",
            Self::StartWeek => "startWeek",
            Self::EndWeek => "endWeek",
            Self::ExpectedStartWeek => "expectedStartWeek",
            Self::SprintsAuto => "sprintsAuto",
        }
    }

    /// Whether a change to this field invalidates the auto plan
    pub fn drives_auto_plan(self) -> bool {
        matches!(self, Self::PlanEmpl | Self::PlanWeeks | Self::Function)
    }
}

/// A task field together with a value
#[derive(Debug, Clone, PartialEq)]
pub enum TaskValue {
    Status(TaskStatus),
    Epic(Option<String>),
    Task(String),
    Team(String),
    Function(String),
    Empl(Option<String>),
    PlanEmpl(f64),
    PlanWeeks(u32),
    AutoPlanEnabled(bool),
    Weeks(Vec<f64>),
    BlockerIds(Vec<RowId>),
    WeekBlockers(Vec<u32>),
    PrevId(Option<RowId>),
    NextId(Option<RowId>),
    Fact(f64),
    StartWeek(Option<u32>),
    EndWeek(Option<u32>),
    ExpectedStartWeek(Option<u32>),
    SprintsAuto(Vec<String>),
}

impl TaskValue {
    pub fn field(&self) -> TaskField {
        match self {
            Self::Status(_) => TaskField::Status,
            Self::Epic(_) => TaskField::Epic,
            Self::Task(_) => TaskField::Task,
            Self::Team(_) => TaskField::Team,
            Self::Function(_) => TaskField::Function,
            Self::Empl(_) => TaskField::Empl,
            Self::PlanEmpl(_) => TaskField::PlanEmpl,
            Self::PlanWeeks(_) => TaskField::PlanWeeks,
            Self::AutoPlanEnabled(_) => TaskField::AutoPlanEnabled,
            Self::Weeks(_) => TaskField::Weeks,
            Self::BlockerIds(_) => TaskField::BlockerIds,
            Self::WeekBlockers(_) => TaskField::WeekBlockers,
            Self::PrevId(_) => TaskField::PrevId,
            Self::NextId(_) => TaskField::NextId,
            Self::Fact(_) => TaskField::Fact,
            Self::StartWeek(_) => TaskField::StartWeek,
            Self::EndWeek(_) => TaskField::EndWeek,
            Self::ExpectedStartWeek(_) => TaskField::ExpectedStartWeek,
            Self::SprintsAuto(_) => TaskField::SprintsAuto,
        }
    }

    /// Current value of `field` on a task
    pub fn read(task: &TaskRow, field: TaskField) -> Self {
        match field {
            TaskField::Status => Self::Status(task.status),
            TaskField::Epic => Self::Epic(task.epic.clone()),
            TaskField::Task => Self::Task(task.task.clone()),
            TaskField::Team => Self::Team(task.team.clone()),
            TaskField::Function => Self::Function(task.function.clone()),
            TaskField::Empl => Self::Empl(task.empl.clone()),
            TaskField::PlanEmpl => Self::PlanEmpl(task.plan_empl),
            TaskField::PlanWeeks => Self::PlanWeeks(task.plan_weeks),
            TaskField::AutoPlanEnabled => Self::AutoPlanEnabled(task.auto_plan_enabled),
            TaskField::Weeks => Self::Weeks(task.weeks.clone()),
            TaskField::BlockerIds => Self::BlockerIds(task.blocker_ids.clone()),
            TaskField::WeekBlockers => Self::WeekBlockers(task.week_blockers.clone()),
            TaskField::PrevId => Self::PrevId(task.prev_id.clone()),
            TaskField::NextId => Self::NextId(task.next_id.clone()),
            TaskField::Fact => Self::Fact(task.fact),
            TaskField::StartWeek => Self::StartWeek(task.start_week),
            TaskField::EndWeek => Self::EndWeek(task.end_week),
            TaskField::ExpectedStartWeek => Self::ExpectedStartWeek(task.expected_start_week),
            TaskField::SprintsAuto => Self::SprintsAuto(task.sprints_auto.clone()),
        }
    }

    /// Write this value into a task
    pub fn apply(self, task: &mut TaskRow) {
        match self {
            Self::Status(v) => task.status = v,
            Self::Epic(v) => task.epic = v,
            Self::Task(v) => task.task = v,
            Self::Team(v) => task.team = v,
            Self::Function(v) => task.function = v,
            Self::Empl(v) => task.empl = v,
            Self::PlanEmpl(v) => task.plan_empl = v,
            Self::PlanWeeks(v) => task.plan_weeks = v,
            Self::AutoPlanEnabled(v) => task.auto_plan_enabled = v,
            Self::Weeks(v) => task.weeks = v,
            Self::BlockerIds(v) => task.blocker_ids = v,
            Self::WeekBlockers(v) => task.week_blockers = v,
            Self::PrevId(v) => task.prev_id = v,
            Self::NextId(v) => task.next_id = v,
            Self::Fact(v) => task.fact = v,
            Self::StartWeek(v) => task.start_week = v,
            Self::EndWeek(v) => task.end_week = v,
            Self::ExpectedStartWeek(v) => task.expected_start_week = v,
            Self::SprintsAuto(v) => task.sprints_auto = v,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Status(v) => json!(v),
            Self::Epic(v) | Self::Empl(v) => json!(v),
            Self::Task(v) | Self::Team(v) | Self::Function(v) => json!(v),
            Self::PlanEmpl(v) | Self::Fact(v) => json!(v),
            Self::PlanWeeks(v) => json!(v),
            Self::AutoPlanEnabled(v) => json!(v),
            Self::Weeks(v) => json!(v),
            Self::BlockerIds(v) => json!(v),
            Self::WeekBlockers(v) => json!(v),
            Self::PrevId(v) | Self::NextId(v) => json!(v),
            Self::StartWeek(v) | Self::EndWeek(v) | Self::ExpectedStartWeek(v) => json!(v),
            Self::SprintsAuto(v) => json!(v),
        }
    }
}

/// Editable resource fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceField {
    Team,
    Function,
    Empl,
    Weeks,
    PrevId,
    NextId,
    Color,
}

impl ResourceField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Function => "fn",
            Self::Empl => "empl",
            Self::Weeks => "weeks",
            Self::PrevId => "prevId",
            Self::NextId => "nextId",
            Self::Color => "color",
        }
    }
}

/// A resource field together with a value
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceValue {
    Team(Vec<String>),
    Function(String),
    Empl(Option<String>),
    Weeks(Vec<f64>),
    PrevId(Option<RowId>),
    NextId(Option<RowId>),
    Color(Option<String>),
}

impl ResourceValue {
    pub fn field(&self) -> ResourceField {
        match self {
            Self::Team(_) => ResourceField::Team,
            Self::Function(_) => ResourceField::Function,
            Self::Empl(_) => ResourceField::Empl,
            Self::Weeks(_) => ResourceField::Weeks,
            Self::PrevId(_) => ResourceField::PrevId,
            Self::NextId(_) => ResourceField::NextId,
            Self::Color(_) => ResourceField::Color,
        }
    }

    pub fn read(resource: &ResourceRow, field: ResourceField) -> Self {
        match field {
            ResourceField::Team => Self::Team(resource.team.clone()),
            ResourceField::Function => Self::Function(resource.function.clone()),
            ResourceField::Empl => Self::Empl(resource.empl.clone()),
            ResourceField::Weeks => Self::Weeks(resource.weeks.clone()),
            ResourceField::PrevId => Self::PrevId(resource.prev_id.clone()),
            ResourceField::NextId => Self::NextId(resource.next_id.clone()),
            ResourceField::Color => Self::Color(resource.color.clone()),
        }
    }

    pub fn apply(self, resource: &mut ResourceRow) {
        match self {
            Self::Team(v) => resource.team = v,
            Self::Function(v) => resource.function = v,
            Self::Empl(v) => resource.empl = v,
            Self::Weeks(v) => resource.weeks = v,
            Self::PrevId(v) => resource.prev_id = v,
            Self::NextId(v) => resource.next_id = v,
            Self::Color(v) => resource.color = v,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Team(v) => json!(v),
            Self::Function(v) => json!(v),
            Self::Empl(v) | Self::Color(v) => json!(v),
            Self::Weeks(v) => json!(v),
            Self::PrevId(v) | Self::NextId(v) => json!(v),
        }
    }
}

/// Editable team fields (teams are keyed by name)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TeamField {
    JiraProject,
    FeatureTeam,
    IssueType,
}

impl TeamField {
    pub fn key(self) -> &'static str {
        match self {
            Self::JiraProject => "jiraProject",
            Self::FeatureTeam => "featureTeam",
            Self::IssueType => "issueType",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TeamValue {
    JiraProject(String),
    FeatureTeam(String),
    IssueType(String),
}

impl TeamValue {
    pub fn field(&self) -> TeamField {
        match self {
            Self::JiraProject(_) => TeamField::JiraProject,
            Self::FeatureTeam(_) => TeamField::FeatureTeam,
            Self::IssueType(_) => TeamField::IssueType,
        }
    }

    pub fn read(team: &Team, field: TeamField) -> Self {
        match field {
            TeamField::JiraProject => Self::JiraProject(team.jira_project.clone()),
            TeamField::FeatureTeam => Self::FeatureTeam(team.feature_team.clone()),
            TeamField::IssueType => Self::IssueType(team.issue_type.clone()),
        }
    }

    pub fn apply(self, team: &mut Team) {
        match self {
            Self::JiraProject(v) => team.jira_project = v,
            Self::FeatureTeam(v) => team.feature_team = v,
            Self::IssueType(v) => team.issue_type = v,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::JiraProject(v) | Self::FeatureTeam(v) | Self::IssueType(v) => json!(v),
        }
    }
}

/// Editable sprint fields (sprints are keyed by code)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SprintField {
    Start,
    End,
}

impl SprintField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SprintValue {
    Start(NaiveDate),
    End(NaiveDate),
}

impl SprintValue {
    pub fn field(&self) -> SprintField {
        match self {
            Self::Start(_) => SprintField::Start,
            Self::End(_) => SprintField::End,
        }
    }

    pub fn read(sprint: &Sprint, field: SprintField) -> Self {
        match field {
            SprintField::Start => Self::Start(sprint.start),
            SprintField::End => Self::End(sprint.end),
        }
    }

    pub fn apply(self, sprint: &mut Sprint) {
        match self {
            Self::Start(v) => sprint.start = v,
            Self::End(v) => sprint.end = v,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Start(v) | Self::End(v) => json!(v),
        }
    }
}

/// Field of any entity kind, used as a tracker key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Task(TaskField),
    Resource(ResourceField),
    Team(TeamField),
    Sprint(SprintField),
}

impl FieldKey {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::Task(_) => EntityKind::Task,
            Self::Resource(_) => EntityKind::Resource,
            Self::Team(_) => EntityKind::Team,
            Self::Sprint(_) => EntityKind::Sprint,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Task(f) => f.key(),
            Self::Resource(f) => f.key(),
            Self::Team(f) => f.key(),
            Self::Sprint(f) => f.key(),
        }
    }
}

/// A value of any entity kind's field
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Task(TaskValue),
    Resource(ResourceValue),
    Team(TeamValue),
    Sprint(SprintValue),
}

impl Cell {
    pub fn field(&self) -> FieldKey {
        match self {
            Self::Task(v) => FieldKey::Task(v.field()),
            Self::Resource(v) => FieldKey::Resource(v.field()),
            Self::Team(v) => FieldKey::Team(v.field()),
            Self::Sprint(v) => FieldKey::Sprint(v.field()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.field().kind()
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Task(v) => v.to_json(),
            Self::Resource(v) => v.to_json(),
            Self::Team(v) => v.to_json(),
            Self::Sprint(v) => v.to_json(),
        }
    }
}

impl From<TaskValue> for Cell {
    fn from(v: TaskValue) -> Self {
        Self::Task(v)
    }
}

impl From<ResourceValue> for Cell {
    fn from(v: ResourceValue) -> Self {
        Self::Resource(v)
    }
}

impl From<TeamValue> for Cell {
    fn from(v: TeamValue) -> Self {
        Self::Team(v)
    }
}

impl From<SprintValue> for Cell {
    fn from(v: SprintValue) -> Self {
        Self::Sprint(v)
    }
}
