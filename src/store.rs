//! Ordered in-memory task collection with write-through persistence.
//!
//! The collection is hydrated once from the backing [`KeyValueStore`] and
//! rewritten in full after every create, update, toggle and delete. Records
//! are addressable by position (their slot in the ordered list) or by their
//! stable [`TaskId`]; an id → position index is kept in step with every
//! structural change.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::storage::KeyValueStore;
use crate::task::{Attachment, Task, TaskId, DATE_FORMAT};
use crate::validate::ValidatedTask;

/// Result of replacing the collection from persisted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateOutcome {
    /// The document was an array; `skipped` elements could not be read.
    Loaded { tasks: usize, skipped: usize },
    /// The document was not a JSON array; the collection was left alone.
    Rejected,
}

pub struct TaskStore<S: KeyValueStore> {
    backend: S,
    key: String,
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    next_id: u64,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Empty store writing to `key` in `backend`
    pub fn new(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            tasks: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
        }
    }

    /// Read `key` from `backend` and hydrate from it.
    ///
    /// A missing key gives an empty store. Malformed content is logged and
    /// also gives an empty store; only backend read failures are errors.
    pub fn load(backend: S, key: impl Into<String>) -> Result<(Self, Option<HydrateOutcome>)> {
        let mut store = Self::new(backend, key);
        let outcome = match store.backend.get(&store.key)? {
            Some(raw) => Some(store.hydrate(&raw)),
            None => None,
        };
        Ok((store, outcome))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn position_of(&self, id: TaskId) -> Result<usize> {
        self.index
            .get(&id)
            .copied()
            .ok_or(Error::TaskNotFound(id.0))
    }

    pub fn get(&self, id: TaskId) -> Result<&Task> {
        let position = self.position_of(id)?;
        Ok(&self.tasks[position])
    }

    pub fn task_at(&self, position: usize) -> Result<&Task> {
        self.check_position(position)?;
        Ok(&self.tasks[position])
    }

    /// Append a new record and persist.
    pub fn create(
        &mut self,
        candidate: ValidatedTask,
        attachments: Vec<Attachment>,
        created: NaiveDate,
    ) -> Result<TaskId> {
        let id = self.allocate_id().ok_or_else(|| {
            Error::OperationFailed("task id space exhausted".to_string())
        })?;
        let (title, description, due_date, assignee) = candidate.into_parts();
        self.tasks.push(Task {
            id,
            title,
            description,
            due_date,
            assignee,
            created_date: created,
            attachments,
            done: false,
        });
        self.index.insert(id, self.tasks.len() - 1);
        if let Err(err) = self.persist() {
            self.tasks.pop();
            self.index.remove(&id);
            self.next_id = id.0;
            return Err(err);
        }
        Ok(id)
    }

    /// Overwrite the record at `position` wholesale and persist.
    ///
    /// No merging happens here: `task` must already carry the existing
    /// `created_date`. Its id must match the record being replaced.
    pub fn update(&mut self, position: usize, task: Task) -> Result<()> {
        self.check_position(position)?;
        let current = self.tasks[position].id;
        if task.id != current {
            return Err(Error::InvalidArgument(format!(
                "update at position {position} cannot change id {current} to {}",
                task.id
            )));
        }
        let previous = std::mem::replace(&mut self.tasks[position], task);
        if let Err(err) = self.persist() {
            self.tasks[position] = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Flip `done` at `position`, persist, and return the new value.
    pub fn toggle_done(&mut self, position: usize) -> Result<bool> {
        self.check_position(position)?;
        let task = &mut self.tasks[position];
        task.done = !task.done;
        let done = task.done;
        if let Err(err) = self.persist() {
            self.tasks[position].done = !done;
            return Err(err);
        }
        Ok(done)
    }

    /// Remove the record at `position`; later records shift down by one.
    pub fn delete(&mut self, position: usize) -> Result<Task> {
        self.check_position(position)?;
        let removed = self.tasks.remove(position);
        self.reindex();
        if let Err(err) = self.persist() {
            self.tasks.insert(position, removed);
            self.reindex();
            return Err(err);
        }
        Ok(removed)
    }

    pub fn update_by_id(&mut self, task: Task) -> Result<()> {
        let position = self.position_of(task.id)?;
        self.update(position, task)
    }

    pub fn toggle_done_by_id(&mut self, id: TaskId) -> Result<bool> {
        let position = self.position_of(id)?;
        self.toggle_done(position)
    }

    pub fn delete_by_id(&mut self, id: TaskId) -> Result<Task> {
        let position = self.position_of(id)?;
        self.delete(position)
    }

    /// Replace the whole collection with records parsed from `raw`.
    ///
    /// Never fails: text that is not a JSON array is logged and ignored,
    /// unreadable elements are skipped. Records without a usable id (or
    /// with one already taken) get a fresh id after the highest seen.
    pub fn hydrate(&mut self, raw: &str) -> HydrateOutcome {
        let value: serde_json::Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = %self.key, error = %err, "malformed persisted state: not JSON");
                return HydrateOutcome::Rejected;
            }
        };
        let elements = match value {
            serde_json::Value::Array(elements) => elements,
            other => {
                warn!(
                    key = %self.key,
                    kind = json_kind(&other),
                    "malformed persisted state: expected an array"
                );
                return HydrateOutcome::Rejected;
            }
        };

        let mut records = Vec::with_capacity(elements.len());
        let mut skipped = 0;
        for (position, element) in elements.into_iter().enumerate() {
            match StoredTask::deserialize(element) {
                Ok(stored) => match stored.into_parts() {
                    Ok(parts) => records.push(parts),
                    Err(reason) => {
                        warn!(position, reason = %reason, "skipping persisted task");
                        skipped += 1;
                    }
                },
                Err(err) => {
                    warn!(position, error = %err, "skipping persisted task");
                    skipped += 1;
                }
            }
        }

        let mut seen = HashSet::new();
        let max_id = records
            .iter()
            .filter_map(|(id, _)| *id)
            .filter(|id| id.0 < u64::MAX)
            .map(|id| id.0)
            .max()
            .unwrap_or(0);
        self.next_id = max_id + 1;
        let mut tasks = Vec::with_capacity(records.len());
        for (id, mut task) in records {
            task.id = match id {
                Some(id) if id.0 > 0 && id.0 < u64::MAX && seen.insert(id) => id,
                _ => {
                    let Some(fresh) = self.allocate_id() else {
                        warn!(task = %task.title, "no task id left; skipping persisted task");
                        skipped += 1;
                        continue;
                    };
                    if id.is_some() {
                        warn!(task = %task.title, assigned = %fresh, "replacing unusable task id");
                    }
                    seen.insert(fresh);
                    fresh
                }
            };
            tasks.push(task);
        }

        self.tasks = tasks;
        self.reindex();
        debug!(key = %self.key, tasks = self.tasks.len(), skipped, "hydrated task store");
        HydrateOutcome::Loaded {
            tasks: self.tasks.len(),
            skipped,
        }
    }

    /// Persisted form of the current collection
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.tasks)?)
    }

    fn persist(&mut self) -> Result<()> {
        let json = self.serialize()?;
        self.backend.set(&self.key, &json)?;
        debug!(key = %self.key, tasks = self.tasks.len(), "wrote task list");
        Ok(())
    }

    /// Hand out the next id. `u64::MAX` is never issued so `next_id`
    /// cannot overflow.
    fn allocate_id(&mut self) -> Option<TaskId> {
        if self.next_id == u64::MAX {
            return None;
        }
        let id = TaskId(self.next_id);
        self.next_id += 1;
        Some(id)
    }

    fn check_position(&self, position: usize) -> Result<()> {
        if position >= self.tasks.len() {
            return Err(Error::IndexOutOfRange {
                index: position,
                len: self.tasks.len(),
            });
        }
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .tasks
            .iter()
            .enumerate()
            .map(|(position, task)| (task.id, position))
            .collect();
    }
}

/// Lenient on-disk shape. Older documents have no `id`, and attachment
/// entries may be empty objects where file handles failed to serialize.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    #[serde(default)]
    id: Option<TaskId>,
    title: String,
    #[serde(default)]
    description: Option<String>,
    due_date: String,
    #[serde(default)]
    assignee: Option<String>,
    created_date: String,
    #[serde(default)]
    attachments: Vec<serde_json::Value>,
    #[serde(default)]
    done: bool,
}

impl StoredTask {
    fn into_parts(self) -> std::result::Result<(Option<TaskId>, Task), String> {
        let due_date = parse_date("dueDate", &self.due_date)?;
        let created_date = parse_date("createdDate", &self.created_date)?;
        let mut attachments = Vec::with_capacity(self.attachments.len());
        for raw in self.attachments {
            match serde_json::from_value::<Attachment>(raw) {
                Ok(attachment) => attachments.push(attachment),
                Err(err) => {
                    warn!(task = %self.title, error = %err, "dropping unreadable attachment reference");
                }
            }
        }
        let task = Task {
            id: TaskId(0),
            title: self.title,
            description: self.description.unwrap_or_default(),
            due_date,
            assignee: self.assignee.unwrap_or_default(),
            created_date,
            attachments,
            done: self.done,
        };
        Ok((self.id, task))
    }
}

fn parse_date(field: &str, raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|err| format!("{field} '{raw}' is not a YYYY-MM-DD date: {err}"))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::task::TaskDraft;
    use crate::validate::validate;

    const KEY: &str = "todos";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn candidate(title: &str) -> ValidatedTask {
        validate(&TaskDraft::new(title, "2099-01-01"), today()).expect("valid draft")
    }

    fn store_with(titles: &[&str]) -> TaskStore<MemoryStore> {
        let mut store = TaskStore::new(MemoryStore::new(), KEY);
        for title in titles {
            store
                .create(candidate(title), Vec::new(), today())
                .expect("create");
        }
        store
    }

    fn titles(store: &TaskStore<MemoryStore>) -> Vec<&str> {
        store.list().iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn create_appends_and_persists() {
        let store = store_with(&["a", "b"]);
        assert_eq!(titles(&store), vec!["a", "b"]);
        assert_eq!(store.list()[0].id, TaskId(1));
        assert_eq!(store.list()[1].id, TaskId(2));
        assert!(!store.list()[0].done);
        assert_eq!(store.list()[0].created_date, today());

        let raw = store.backend().raw(KEY).expect("persisted");
        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
    }

    #[test]
    fn toggle_twice_restores_record() {
        let mut store = store_with(&["a"]);
        let before = store.list()[0].clone();
        assert!(store.toggle_done(0).unwrap());
        assert!(!store.toggle_done(0).unwrap());
        assert_eq!(store.list()[0], before);
    }

    #[test]
    fn delete_shifts_later_positions() {
        let mut store = store_with(&["a", "b", "c", "d"]);
        let removed = store.delete(1).unwrap();
        assert_eq!(removed.title, "b");
        assert_eq!(titles(&store), vec!["a", "c", "d"]);
        assert_eq!(store.position_of(TaskId(3)).unwrap(), 1);
        assert_eq!(store.position_of(TaskId(4)).unwrap(), 2);
        assert!(matches!(
            store.position_of(TaskId(2)),
            Err(Error::TaskNotFound(2))
        ));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = store_with(&["a", "b"]);
        store.delete_by_id(TaskId(2)).unwrap();
        let id = store.create(candidate("c"), Vec::new(), today()).unwrap();
        assert_eq!(id, TaskId(3));
    }

    #[test]
    fn out_of_range_positions_are_errors() {
        let mut store = store_with(&["a"]);
        assert!(matches!(
            store.toggle_done(1),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        ));
        assert!(matches!(store.delete(9), Err(Error::IndexOutOfRange { .. })));
        let task = store.list()[0].clone();
        assert!(matches!(
            store.update(3, task),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_overwrites_wholesale() {
        let mut store = store_with(&["a", "b"]);
        let mut task = store.list()[1].clone();
        task.title = "renamed".to_string();
        task.created_date = NaiveDate::from_ymd_opt(2020, 5, 5).unwrap();
        store.update(1, task).unwrap();
        assert_eq!(store.list()[1].title, "renamed");
        assert_eq!(
            store.list()[1].created_date,
            NaiveDate::from_ymd_opt(2020, 5, 5).unwrap()
        );
    }

    #[test]
    fn update_refuses_id_change() {
        let mut store = store_with(&["a", "b"]);
        let task = store.list()[0].clone();
        let err = store.update(1, task).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(titles(&store), vec!["a", "b"]);
    }

    #[test]
    fn hydrate_round_trips_serialized_list() {
        let mut store = store_with(&["a", "b"]);
        store.toggle_done(1).unwrap();
        let raw = store.serialize().unwrap();

        let mut fresh = TaskStore::new(MemoryStore::new(), KEY);
        assert_eq!(
            fresh.hydrate(&raw),
            HydrateOutcome::Loaded {
                tasks: 2,
                skipped: 0
            }
        );
        assert_eq!(fresh.list(), store.list());
    }

    #[test]
    fn hydrate_rejects_non_array_and_keeps_state() {
        let mut store = store_with(&["keep"]);
        assert_eq!(
            store.hydrate(r#""not an array""#),
            HydrateOutcome::Rejected
        );
        assert_eq!(store.hydrate("{oops"), HydrateOutcome::Rejected);
        assert_eq!(store.hydrate(r#"{"title":"x"}"#), HydrateOutcome::Rejected);
        assert_eq!(titles(&store), vec!["keep"]);
    }

    #[test]
    fn load_treats_malformed_value_as_empty() {
        let backend = MemoryStore::with_value(KEY, "not an array");
        let (store, outcome) = TaskStore::load(backend, KEY).unwrap();
        assert!(store.is_empty());
        assert_eq!(outcome, Some(HydrateOutcome::Rejected));

        let (store, outcome) = TaskStore::load(MemoryStore::new(), KEY).unwrap();
        assert!(store.is_empty());
        assert_eq!(outcome, None);
    }

    #[test]
    fn hydrate_accepts_legacy_records_without_ids() {
        let raw = r#"[
            {"title":"legacy","description":"","dueDate":"2030-01-01","assignee":"",
             "createdDate":"2025-01-01","attachments":[{}],"done":true},
            {"id":7,"title":"kept","dueDate":"2030-01-02","createdDate":"2025-01-01"},
            {"id":7,"title":"dupe","dueDate":"2030-01-03","createdDate":"2025-01-01"},
            {"title":"bad date","dueDate":"soon","createdDate":"2025-01-01"},
            42
        ]"#;
        let mut store = TaskStore::new(MemoryStore::new(), KEY);
        assert_eq!(
            store.hydrate(raw),
            HydrateOutcome::Loaded {
                tasks: 3,
                skipped: 2
            }
        );

        let ids: Vec<TaskId> = store.list().iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![TaskId(8), TaskId(7), TaskId(9)]);
        assert!(store.list()[0].attachments.is_empty());
        assert!(store.list()[0].done);

        let id = store.create(candidate("new"), Vec::new(), today()).unwrap();
        assert_eq!(id, TaskId(10));
    }

    #[test]
    fn failed_write_rolls_back_and_reports() {
        let mut store = store_with(&["a", "b"]);
        let before = store.list().to_vec();
        store.backend_mut().fail_writes(true);

        let err = store.toggle_done(0).unwrap_err();
        assert!(matches!(err, Error::OperationFailed(_)));
        assert!(store.create(candidate("c"), Vec::new(), today()).is_err());
        let mut renamed = store.list()[1].clone();
        renamed.title = "renamed".to_string();
        assert!(store.update(1, renamed).is_err());
        assert!(store.delete(0).is_err());

        assert_eq!(store.list(), before.as_slice());
        assert_eq!(store.position_of(TaskId(2)).unwrap(), 1);

        store.backend_mut().fail_writes(false);
        let id = store.create(candidate("c"), Vec::new(), today()).unwrap();
        assert_eq!(id, TaskId(3));
        assert_eq!(titles(&store), vec!["a", "b", "c"]);
    }

    #[test]
    fn hydrate_replaces_max_id_instead_of_overflowing() {
        let raw = r#"[
            {"id":18446744073709551615,"title":"huge","dueDate":"2099-01-01","createdDate":"2026-01-01"},
            {"id":5,"title":"five","dueDate":"2099-01-01","createdDate":"2026-01-01"}
        ]"#;
        let mut store = TaskStore::new(MemoryStore::new(), KEY);
        assert_eq!(
            store.hydrate(raw),
            HydrateOutcome::Loaded {
                tasks: 2,
                skipped: 0
            }
        );
        let ids: Vec<TaskId> = store.list().iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![TaskId(6), TaskId(5)]);
        assert_eq!(
            store.create(candidate("next"), Vec::new(), today()).unwrap(),
            TaskId(7)
        );
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let raw = r#"[{"id":18446744073709551614,"title":"last","dueDate":"2099-01-01","createdDate":"2026-01-01"}]"#;
        let mut store = TaskStore::new(MemoryStore::new(), KEY);
        store.hydrate(raw);
        assert_eq!(store.list()[0].id, TaskId(u64::MAX - 1));

        let err = store
            .create(candidate("overflow"), Vec::new(), today())
            .unwrap_err();
        assert!(matches!(err, Error::OperationFailed(_)));
        assert_eq!(store.len(), 1);
    }
}
