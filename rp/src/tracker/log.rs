//! Change log payload shared by the tracker and the diff engine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::EntityKind;

/// One entity in a change log: a full object for added rows, a partial
/// `{key, field: value}` object for updates
pub type EntityPatch = Map<String, Value>;

/// Ids of deleted entities per kind
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletedIds {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sprints: Vec<String>,
}

impl DeletedIds {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.resources.is_empty() && self.teams.is_empty() && self.sprints.is_empty()
    }

    pub fn of(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::Task => &self.tasks,
            EntityKind::Resource => &self.resources,
            EntityKind::Team => &self.teams,
            EntityKind::Sprint => &self.sprints,
        }
    }

    pub fn of_mut(&mut self, kind: EntityKind) -> &mut Vec<String> {
        match kind {
            EntityKind::Task => &mut self.tasks,
            EntityKind::Resource => &mut self.resources,
            EntityKind::Team => &mut self.teams,
            EntityKind::Sprint => &mut self.sprints,
        }
    }
}

/// Entities added or updated since the last save, grouped by kind, plus
/// deleted ids. Kinds without changes are omitted from the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeLog {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<EntityPatch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<EntityPatch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<EntityPatch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sprints: Vec<EntityPatch>,

    #[serde(default, skip_serializing_if = "DeletedIds::is_empty")]
    pub deleted: DeletedIds,
}

impl ChangeLog {
    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|k| self.entities(*k).is_empty()) && self.deleted.is_empty()
    }

    pub fn entities(&self, kind: EntityKind) -> &[EntityPatch] {
        match kind {
            EntityKind::Task => &self.tasks,
            EntityKind::Resource => &self.resources,
            EntityKind::Team => &self.teams,
            EntityKind::Sprint => &self.sprints,
        }
    }

    pub fn entities_mut(&mut self, kind: EntityKind) -> &mut Vec<EntityPatch> {
        match kind {
            EntityKind::Task => &mut self.tasks,
            EntityKind::Resource => &mut self.resources,
            EntityKind::Team => &mut self.teams,
            EntityKind::Sprint => &mut self.sprints,
        }
    }

    /// Find the entry for an entity by its key value
    pub fn find(&self, kind: EntityKind, id: &str) -> Option<&EntityPatch> {
        let key = id_key(kind);
        self.entities(kind)
            .iter()
            .find(|e| e.get(key).and_then(Value::as_str) == Some(id))
    }

    /// Number of added/updated entities plus deleted ids
    pub fn len(&self) -> usize {
        EntityKind::ALL
            .iter()
            .map(|k| self.entities(*k).len() + self.deleted.of(*k).len())
            .sum()
    }
}

/// JSON key identifying an entity of `kind`
pub fn id_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Task | EntityKind::Resource => "id",
        EntityKind::Team => "name",
        EntityKind::Sprint => "code",
    }
}
