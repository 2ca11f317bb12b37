//! Reference data: teams, sprints and the full snapshot shape

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ResourceRow, TaskRow};

/// Team reference entry, keyed by name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub jira_project: String,

    #[serde(default)]
    pub feature_team: String,

    #[serde(default)]
    pub issue_type: String,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Key used to match teams across snapshots
    pub fn key(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }
}

/// Sprint calendar entry, keyed by code (e.g. `Q1S2`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Sprint {
    pub fn new(code: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            code: code.into(),
            start,
            end,
        }
    }
}

/// Full planning snapshot as exchanged with the server
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoadmapData {
    #[serde(default)]
    pub version: u64,

    #[serde(default)]
    pub teams: Vec<Team>,

    #[serde(default)]
    pub sprints: Vec<Sprint>,

    #[serde(default)]
    pub resources: Vec<ResourceRow>,

    #[serde(default)]
    pub tasks: Vec<TaskRow>,
}
