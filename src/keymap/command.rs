//! Command enum representing every action a global shortcut can trigger
//!
//! Commands are the bridge between keymap entries and the rest of the app:
//! each one resolves to a [`CommandTarget`] (a modal to open, a page to
//! navigate to, or the shortcut help overlay).

use std::fmt;
use std::str::FromStr;

use crate::modal::ModalName;
use crate::route::Route;

/// All commands that can be bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // ========================================================================
    // Modals
    // ========================================================================
    /// Open the "new goal" form
    OpenGoalCreate,
    /// Open the "new project" form
    OpenProjectCreate,
    /// Open the "new issue" form
    OpenIssueCreate,
    /// Open the command palette
    OpenCommandPalette,

    // ========================================================================
    // Navigation
    // ========================================================================
    GoToInbox,
    GoToGoals,
    GoToProjects,
    GoToIssues,
    GoToSettings,

    // ========================================================================
    // Special
    // ========================================================================
    /// Show the shortcut cheat sheet while the key is held
    ShowShortcutHelp,
    /// Removes a default binding when used in a user keymap
    Unbound,
}

/// Where a command sends the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTarget {
    Modal(ModalName),
    Route(Route),
    ShortcutHelp,
    None,
}

impl Command {
    pub const ALL: [Command; 11] = [
        Command::OpenGoalCreate,
        Command::OpenProjectCreate,
        Command::OpenIssueCreate,
        Command::OpenCommandPalette,
        Command::GoToInbox,
        Command::GoToGoals,
        Command::GoToProjects,
        Command::GoToIssues,
        Command::GoToSettings,
        Command::ShowShortcutHelp,
        Command::Unbound,
    ];

    pub fn target(self) -> CommandTarget {
        use Command::*;

        match self {
            OpenGoalCreate => CommandTarget::Modal(ModalName::GoalCreate),
            OpenProjectCreate => CommandTarget::Modal(ModalName::ProjectCreate),
            OpenIssueCreate => CommandTarget::Modal(ModalName::IssueCreate),
            OpenCommandPalette => CommandTarget::Modal(ModalName::CommandPalette),
            GoToInbox => CommandTarget::Route(Route::Inbox),
            GoToGoals => CommandTarget::Route(Route::Goals),
            GoToProjects => CommandTarget::Route(Route::Projects),
            GoToIssues => CommandTarget::Route(Route::Issues),
            GoToSettings => CommandTarget::Route(Route::Settings),
            ShowShortcutHelp => CommandTarget::ShortcutHelp,
            Unbound => CommandTarget::None,
        }
    }

    /// Hold-to-show commands fire on press and release instead of once
    pub fn is_hold(self) -> bool {
        matches!(self, Command::ShowShortcutHelp)
    }

    /// Human-readable name for the shortcut help overlay and command palette
    pub fn display_name(self) -> &'static str {
        use Command::*;

        match self {
            OpenGoalCreate => "New Goal",
            OpenProjectCreate => "New Project",
            OpenIssueCreate => "New Issue",
            OpenCommandPalette => "Command Palette",
            GoToInbox => "Go to Inbox",
            GoToGoals => "Go to Goals",
            GoToProjects => "Go to Projects",
            GoToIssues => "Go to Issues",
            GoToSettings => "Go to Settings",
            ShowShortcutHelp => "Keyboard Shortcuts",
            Unbound => "Unbound",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// Names as written in keymap.yaml
impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OpenGoalCreate" => Ok(Command::OpenGoalCreate),
            "OpenProjectCreate" => Ok(Command::OpenProjectCreate),
            "OpenIssueCreate" => Ok(Command::OpenIssueCreate),
            "OpenCommandPalette" => Ok(Command::OpenCommandPalette),
            "GoToInbox" => Ok(Command::GoToInbox),
            "GoToGoals" => Ok(Command::GoToGoals),
            "GoToProjects" => Ok(Command::GoToProjects),
            "GoToIssues" => Ok(Command::GoToIssues),
            "GoToSettings" => Ok(Command::GoToSettings),
            "ShowShortcutHelp" => Ok(Command::ShowShortcutHelp),
            "Unbound" => Ok(Command::Unbound),
            _ => Err(()),
        }
    }
}
