//! Task records and the drafts they are built from.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// ISO calendar date format used in persisted state and on the command line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Stable identifier assigned when a task is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
        digits.parse::<u64>().map(TaskId).map_err(|_| {
            Error::InvalidArgument(format!("invalid task id '{trimmed}' (expected e.g. 3 or #3)"))
        })
    }
}

/// Reference to a file attached to a task.
///
/// Only metadata is kept; file contents are never copied into storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Attachment {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            path: None,
        }
    }

    /// Reference a regular file on disk by its file name and byte size.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|err| {
            Error::InvalidArgument(format!("cannot attach {}: {err}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(Error::InvalidArgument(format!(
                "cannot attach {}: not a regular file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::InvalidArgument(format!("cannot attach {}: no file name", path.display()))
            })?;
        let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            name,
            size: metadata.len(),
            path: Some(absolute),
        })
    }

    /// Identity used for duplicate detection
    pub fn same_file(&self, other: &Attachment) -> bool {
        self.name == other.name && self.size == other.size
    }
}

/// A saved to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "iso_date")]
    pub due_date: NaiveDate,
    #[serde(default)]
    pub assignee: String,
    #[serde(with = "iso_date")]
    pub created_date: NaiveDate,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.done && self.due_date < today
    }

    /// Form contents for editing this task
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.format(DATE_FORMAT).to_string(),
            assignee: self.assignee.clone(),
        }
    }
}

/// Raw form values as entered by the user, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub assignee: String,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            due_date: due_date.into(),
            ..Self::default()
        }
    }
}

pub(crate) mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}
