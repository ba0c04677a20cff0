//! Form validation for task submissions.
//!
//! Every violated rule is reported at once so a caller can flag all invalid
//! fields in one pass. The due-date range check only runs after both
//! required fields are present.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::task::{TaskDraft, DATE_FORMAT};

/// A single rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    MissingTitle,
    MissingDueDate,
    InvalidDueDate,
    DueDateInPast,
}

impl ValidationError {
    /// Form field the violation belongs to
    pub fn field(self) -> &'static str {
        match self {
            ValidationError::MissingTitle => "title",
            ValidationError::MissingDueDate
            | ValidationError::InvalidDueDate
            | ValidationError::DueDateInPast => "dueDate",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ValidationError::MissingTitle => "title is required",
            ValidationError::MissingDueDate => "due date is required",
            ValidationError::InvalidDueDate => "due date must be a date in YYYY-MM-DD form",
            ValidationError::DueDateInPast => {
                "due date cannot be in the past; pick today or a future date"
            }
        };
        f.write_str(message)
    }
}

/// All violations found in one draft, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn contains(&self, error: ValidationError) -> bool {
        self.errors.contains(&error)
    }

    pub fn title_invalid(&self) -> bool {
        self.errors.iter().any(|err| err.field() == "title")
    }

    pub fn due_date_invalid(&self) -> bool {
        self.errors.iter().any(|err| err.field() == "dueDate")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A draft that passed validation, with text fields trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTask {
    title: String,
    description: String,
    due_date: NaiveDate,
    assignee: String,
}

impl ValidatedTask {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    pub(crate) fn into_parts(self) -> (String, String, NaiveDate, String) {
        (self.title, self.description, self.due_date, self.assignee)
    }
}

pub fn validate(
    draft: &TaskDraft,
    today: NaiveDate,
) -> std::result::Result<ValidatedTask, ValidationErrors> {
    let mut errors = Vec::new();

    let title = draft.title.trim();
    if title.is_empty() {
        errors.push(ValidationError::MissingTitle);
    }

    let due_raw = draft.due_date.trim();
    if due_raw.is_empty() {
        errors.push(ValidationError::MissingDueDate);
    }

    if !errors.is_empty() {
        return Err(ValidationErrors { errors });
    }

    let due_date = match NaiveDate::parse_from_str(due_raw, DATE_FORMAT) {
        Ok(date) => date,
        Err(_) => {
            return Err(ValidationErrors {
                errors: vec![ValidationError::InvalidDueDate],
            })
        }
    };
    if due_date < today {
        return Err(ValidationErrors {
            errors: vec![ValidationError::DueDateInPast],
        });
    }

    Ok(ValidatedTask {
        title: title.to_string(),
        description: draft.description.trim().to_string(),
        due_date,
        assignee: draft.assignee.trim().to_string(),
    })
}
