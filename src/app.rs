//! Application state: the task store, the attachment staging set and the
//! edit mode, owned together and driven by user intents.
//!
//! ```text
//!            begin_edit(id)
//!   Idle ───────────────────▶ Editing(id)
//!    ▲ │                          │
//!    │ └─ submit (create) ─┐      │ submit (update) / cancel /
//!    │                     ▼      │ delete of the target
//!    └────────────────────────────┘
//! ```

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::staging::AttachmentStaging;
use crate::storage::KeyValueStore;
use crate::store::TaskStore;
use crate::task::{Attachment, Task, TaskDraft, TaskId};
use crate::validate::validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Next submission creates a task
    Idle,
    /// Next submission overwrites this task
    Editing(TaskId),
}

/// What a successful submission did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "lowercase")]
pub enum Submitted {
    Created(TaskId),
    Updated(TaskId),
}

impl Submitted {
    pub fn id(self) -> TaskId {
        match self {
            Submitted::Created(id) | Submitted::Updated(id) => id,
        }
    }
}

pub struct TodoApp<S: KeyValueStore, C: Clock> {
    store: TaskStore<S>,
    staging: AttachmentStaging,
    mode: EditMode,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> TodoApp<S, C> {
    pub fn new(store: TaskStore<S>, clock: C) -> Self {
        Self {
            store,
            staging: AttachmentStaging::new(),
            mode: EditMode::Idle,
            clock,
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    pub fn list(&self) -> &[Task] {
        self.store.list()
    }

    pub fn staging(&self) -> &AttachmentStaging {
        &self.staging
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Label for the submit action in the current mode
    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            EditMode::Idle => "Add Task",
            EditMode::Editing(_) => "Update Task",
        }
    }

    pub fn stage_attachment(&mut self, file: Attachment) -> Result<()> {
        self.staging.add(file)
    }

    pub fn unstage_attachment(&mut self, position: usize) -> Result<Attachment> {
        self.staging.remove(position)
    }

    pub fn unstage_named(&mut self, name: &str) -> usize {
        self.staging.remove_named(name)
    }

    pub fn clear_staging(&mut self) {
        self.staging.clear();
    }

    /// Target `id` for the next submission and return its form contents.
    ///
    /// Staging is seeded with the task's current attachments.
    pub fn begin_edit(&mut self, id: TaskId) -> Result<TaskDraft> {
        let task = self.store.get(id)?;
        let draft = task.to_draft();
        self.staging.seed(&task.attachments);
        self.mode = EditMode::Editing(id);
        debug!(%id, "editing task");
        Ok(draft)
    }

    /// Drop any edit target and staged files.
    pub fn cancel(&mut self) {
        self.mode = EditMode::Idle;
        self.staging.clear();
    }

    /// Validate `draft` and create or update depending on the edit mode.
    ///
    /// Validation and write failures leave the store, staging and mode
    /// untouched, so the same draft can be submitted again.
    /// An update keeps the task's id, creation date and done flag.
    pub fn submit(&mut self, draft: &TaskDraft) -> Result<Submitted> {
        let today = self.clock.today();
        let valid = validate(draft, today)?;
        let attachments = self.staging.snapshot();

        let submitted = match self.mode {
            EditMode::Idle => {
                let id = self.store.create(valid, attachments, today)?;
                Submitted::Created(id)
            }
            EditMode::Editing(id) => {
                let existing = self.store.get(id)?;
                let created_date = existing.created_date;
                let done = existing.done;
                let (title, description, due_date, assignee) = valid.into_parts();
                self.store.update_by_id(Task {
                    id,
                    title,
                    description,
                    due_date,
                    assignee,
                    created_date,
                    attachments,
                    done,
                })?;
                Submitted::Updated(id)
            }
        };

        self.mode = EditMode::Idle;
        self.staging.clear();
        debug!(?submitted, "submission applied");
        Ok(submitted)
    }

    pub fn toggle_done(&mut self, id: TaskId) -> Result<bool> {
        self.store.toggle_done_by_id(id)
    }

    /// Delete `id`. If it was the edit target, editing is cancelled.
    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        let removed = self.store.delete_by_id(id)?;
        if self.mode == EditMode::Editing(id) {
            self.cancel();
        }
        Ok(removed)
    }

    /// Look up a task, for callers holding only an id
    pub fn task(&self, id: TaskId) -> Result<&Task> {
        self.store.get(id)
    }

    pub fn into_store(self) -> TaskStore<S> {
        self.store
    }
}
