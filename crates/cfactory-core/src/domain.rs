//! Status and kind vocabularies shared by the ledger, the task runner, and the API.
//!
//! All of these are persisted as lowercase text columns; `as_str` is the
//! stored form and `FromStr` accepts exactly that form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The four job kinds the task runner knows how to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    Discovery,
    Harvest,
    Scoring,
    Generation,
}

impl RunKind {
    pub const ALL: [RunKind; 4] = [
        RunKind::Discovery,
        RunKind::Harvest,
        RunKind::Scoring,
        RunKind::Generation,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunKind::Discovery => "discovery",
            RunKind::Harvest => "harvest",
            RunKind::Scoring => "scoring",
            RunKind::Generation => "generation",
        }
    }
}

impl FromStr for RunKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownRunKind(s.to_string()))
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a run: `pending → running → {completed | failed}`, plus
/// `pending → failed` for runs rejected before they start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl FromStr for RunStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(CoreError::UnknownStatus {
                entity: "run",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow status of a harvested post.
///
/// `Scoring` is the short-lived claim held by a scoring worker between
/// `Pending` and `Scored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Pending,
    Scoring,
    Scored,
    Approved,
    Completed,
    Archived,
}

impl ContentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentStatus::Pending => "pending",
            ContentStatus::Scoring => "scoring",
            ContentStatus::Scored => "scored",
            ContentStatus::Approved => "approved",
            ContentStatus::Completed => "completed",
            ContentStatus::Archived => "archived",
        }
    }

    /// The status clients see. A scoring claim is an internal detail, so a
    /// claimed item still reads as pending.
    #[must_use]
    pub fn public(self) -> Self {
        match self {
            ContentStatus::Scoring => ContentStatus::Pending,
            other => other,
        }
    }
}

impl FromStr for ContentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ContentStatus::Pending),
            "scoring" => Ok(ContentStatus::Scoring),
            "scored" => Ok(ContentStatus::Scored),
            "approved" => Ok(ContentStatus::Approved),
            "completed" => Ok(ContentStatus::Completed),
            "archived" => Ok(ContentStatus::Archived),
            other => Err(CoreError::UnknownStatus {
                entity: "content item",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
    Ready,
    Published,
}

impl PlanStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::Ready => "ready",
            PlanStatus::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarouselStatus {
    Ready,
    Published,
}

impl CarouselStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CarouselStatus::Ready => "ready",
            CarouselStatus::Published => "published",
        }
    }
}

/// Slide colour palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Lenient parse: anything other than `light` renders with the dark palette.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("light") {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

/// Who asked for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Api,
    Cli,
    Scheduler,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Api => "api",
            TriggerSource::Cli => "cli",
            TriggerSource::Scheduler => "scheduler",
        }
    }
}

/// Borrowed view of a content item handed to the scoring and planning capabilities.
#[derive(Debug, Clone, Copy)]
pub struct ContentView<'a> {
    pub url: &'a str,
    pub caption: Option<&'a str>,
    pub metadata: &'a serde_json::Value,
}

impl ContentView<'_> {
    /// Integer metric from the metadata document, `0` when absent or non-numeric.
    #[must_use]
    pub fn metric(&self, key: &str) -> i64 {
        self.metadata
            .get(key)
            .and_then(serde_json::Value::as_i64)
            .unwrap_or(0)
    }

    #[must_use]
    pub fn author(&self) -> &str {
        self.metadata
            .get("author")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown")
    }
}
