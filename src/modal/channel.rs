//! Modal channels: the closed set of modal names and their payload types
//!
//! Each channel is a zero-sized marker type implementing [`Channel`], which
//! ties a [`ModalName`] to exactly one payload type. Publishing the wrong
//! payload to a channel does not compile.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::bus::ModalEventBus;

/// Identifies a modal channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModalName {
    GoalCreate,
    ProjectCreate,
    IssueCreate,
    GoalDelete,
    CommandPalette,
}

impl ModalName {
    pub const ALL: [ModalName; 5] = [
        ModalName::GoalCreate,
        ModalName::ProjectCreate,
        ModalName::IssueCreate,
        ModalName::GoalDelete,
        ModalName::CommandPalette,
    ];

    /// Event name used on the bus (`"GoalCreateModal"`)
    pub const fn event_name(self) -> &'static str {
        match self {
            ModalName::GoalCreate => "GoalCreateModal",
            ModalName::ProjectCreate => "ProjectCreateModal",
            ModalName::IssueCreate => "IssueCreateModal",
            ModalName::GoalDelete => "GoalDeleteModal",
            ModalName::CommandPalette => "CommandPaletteModal",
        }
    }

    /// Dispatch an empty-payload publish on this channel
    ///
    /// Used by shortcuts, which only ever open a modal without context.
    pub fn dispatch_empty(self, bus: &ModalEventBus) -> bool {
        match self {
            ModalName::GoalCreate => bus.dispatch::<GoalCreateModal>(None),
            ModalName::ProjectCreate => bus.dispatch::<ProjectCreateModal>(None),
            ModalName::IssueCreate => bus.dispatch::<IssueCreateModal>(None),
            ModalName::GoalDelete => bus.dispatch::<GoalDeleteModal>(None),
            ModalName::CommandPalette => bus.dispatch::<CommandPaletteModal>(None),
        }
    }
}

impl fmt::Display for ModalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

impl FromStr for ModalName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModalName::ALL
            .into_iter()
            .find(|name| name.event_name() == s || format!("{:?}", name) == s)
            .ok_or(())
    }
}

/// Binds a modal name to its payload type
pub trait Channel: 'static {
    const NAME: ModalName;
    type Payload: Clone + fmt::Debug + 'static;
}

/// Opaque identifier of a tracker entity (goal, project, issue)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalCreatePayload {
    /// Pre-selects the project field
    pub project: Option<EntityId>,
    pub parent_goal: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCreatePayload {
    pub goal: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCreatePayload {
    pub project: Option<EntityId>,
    pub goal: Option<EntityId>,
    /// Initial title text, e.g. carried over from a search field
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDeletePayload {
    pub goal: EntityId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPalettePayload {
    pub query: String,
}

pub enum GoalCreateModal {}

impl Channel for GoalCreateModal {
    const NAME: ModalName = ModalName::GoalCreate;
    type Payload = GoalCreatePayload;
}

pub enum ProjectCreateModal {}

impl Channel for ProjectCreateModal {
    const NAME: ModalName = ModalName::ProjectCreate;
    type Payload = ProjectCreatePayload;
}

pub enum IssueCreateModal {}

impl Channel for IssueCreateModal {
    const NAME: ModalName = ModalName::IssueCreate;
    type Payload = IssueCreatePayload;
}

pub enum GoalDeleteModal {}

impl Channel for GoalDeleteModal {
    const NAME: ModalName = ModalName::GoalDelete;
    type Payload = GoalDeletePayload;
}

pub enum CommandPaletteModal {}

impl Channel for CommandPaletteModal {
    const NAME: ModalName = ModalName::CommandPalette;
    type Payload = CommandPalettePayload;
}
