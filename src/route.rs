//! Top-level navigation targets reachable from keyboard shortcuts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Inbox,
    Goals,
    Projects,
    Issues,
    Settings,
}

impl Route {
    pub const ALL: [Route; 5] = [
        Route::Inbox,
        Route::Goals,
        Route::Projects,
        Route::Issues,
        Route::Settings,
    ];

    /// URL path of the page
    pub const fn path(self) -> &'static str {
        match self {
            Route::Inbox => "/inbox",
            Route::Goals => "/goals",
            Route::Projects => "/projects",
            Route::Issues => "/issues",
            Route::Settings => "/settings",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim_start_matches('/');
        Route::ALL
            .into_iter()
            .find(|route| route.path()[1..].eq_ignore_ascii_case(name))
            .ok_or(())
    }
}
