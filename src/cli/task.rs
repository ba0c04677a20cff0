//! todo task command implementations.

use std::path::{Path, PathBuf};

use crate::app::{Submitted, TodoApp};
use crate::clock::SystemClock;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::FileStore;
use crate::store::{HydrateOutcome, TaskStore};
use crate::task::{Attachment, Task, TaskDraft, TaskId, DATE_FORMAT};

pub struct AddOptions {
    pub title: Option<String>,
    pub due: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub attach: Vec<PathBuf>,
    pub dir: PathBuf,
    pub output: OutputOptions,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub due: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub attach: Vec<PathBuf>,
    pub detach: Vec<String>,
    pub clear_attachments: bool,
    pub dir: PathBuf,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub pending: bool,
    pub done: bool,
    pub overdue: bool,
    pub assignee: Option<String>,
    pub dir: PathBuf,
    pub output: OutputOptions,
}

pub struct IdOptions {
    pub id: String,
    pub dir: PathBuf,
    pub output: OutputOptions,
}

struct TaskContext {
    app: TodoApp<FileStore, SystemClock>,
    config: Config,
    warnings: Vec<String>,
}

#[derive(serde::Serialize)]
struct TaskSubmitOutput<'a> {
    #[serde(flatten)]
    submitted: Submitted,
    task: &'a Task,
}

#[derive(serde::Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    tasks: Vec<&'a Task>,
}

#[derive(serde::Serialize)]
struct TaskToggleOutput {
    id: TaskId,
    done: bool,
}

#[derive(serde::Serialize)]
struct TaskDeleteOutput {
    id: TaskId,
    title: String,
    remaining: usize,
}

/// Use `--dir`/`TODO_DIR` if given, else the platform data directory.
pub fn resolve_data_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir);
    }
    directories::ProjectDirs::from("", "", "todo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::OperationFailed(
                "cannot determine a data directory; pass --dir or set TODO_DIR".to_string(),
            )
        })
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(&options.dir, true)?;
    stage_files(&mut ctx.app, &options.attach)?;

    let draft = TaskDraft {
        title: options.title.unwrap_or_default(),
        description: options.description.unwrap_or_default(),
        due_date: options.due.unwrap_or_default(),
        assignee: options.assignee.unwrap_or_default(),
    };
    let submitted = ctx.app.submit(&draft)?;
    let task = ctx.app.task(submitted.id())?;

    let mut human = HumanOutput::new("Task created");
    push_task_summary(&mut human, task);
    push_warnings(&mut human, &ctx.warnings);

    emit_success(
        options.output,
        "add",
        &TaskSubmitOutput { submitted, task },
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let id: TaskId = options.id.parse()?;
    let mut ctx = load_context(&options.dir, true)?;
    let mut draft = ctx.app.begin_edit(id)?;

    if let Some(title) = options.title {
        draft.title = title;
    }
    if let Some(description) = options.description {
        draft.description = description;
    }
    if let Some(due) = options.due {
        draft.due_date = due;
    }
    if let Some(assignee) = options.assignee {
        draft.assignee = assignee;
    }

    if options.clear_attachments {
        ctx.app.clear_staging();
    }
    for name in &options.detach {
        if ctx.app.unstage_named(name) == 0 {
            return Err(Error::InvalidArgument(format!(
                "task {id} has no attachment named '{name}'"
            )));
        }
    }
    stage_files(&mut ctx.app, &options.attach)?;

    let submitted = ctx.app.submit(&draft)?;
    let task = ctx.app.task(submitted.id())?;

    let mut human = HumanOutput::new("Task updated");
    push_task_summary(&mut human, task);
    push_warnings(&mut human, &ctx.warnings);

    emit_success(
        options.output,
        "edit",
        &TaskSubmitOutput { submitted, task },
        Some(&human),
    )
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(&options.dir, false)?;
    let today = ctx.app.today();
    let hide_done = ctx.config.list.hide_done && !options.done;
    let assignee = options.assignee.as_deref().map(str::trim);

    let tasks: Vec<&Task> = ctx
        .app
        .list()
        .iter()
        .filter(|task| !(options.pending || hide_done) || !task.done)
        .filter(|task| !options.done || task.done)
        .filter(|task| !options.overdue || task.is_overdue(today))
        .filter(|task| assignee.map_or(true, |name| task.assignee.eq_ignore_ascii_case(name)))
        .collect();

    let mut human = HumanOutput::new(format!("Tasks ({})", tasks.len()));
    for task in &tasks {
        human.push_detail(format_task_line(task, today));
    }
    if ctx.app.list().is_empty() {
        human.push_next_step("todo add \"<title>\" --due YYYY-MM-DD");
    }
    push_warnings(&mut human, &ctx.warnings);

    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    emit_success(options.output, "list", &output, Some(&human))
}

pub fn run_show(options: IdOptions) -> Result<()> {
    let id: TaskId = options.id.parse()?;
    let ctx = load_context(&options.dir, false)?;
    let task = ctx.app.task(id)?;

    let mut human = HumanOutput::new(format!("Task {id}"));
    push_task_summary(&mut human, task);
    if task.is_overdue(ctx.app.today()) {
        human.push_warning("past due");
    }
    push_warnings(&mut human, &ctx.warnings);

    emit_success(options.output, "show", task, Some(&human))
}

pub fn run_toggle(options: IdOptions) -> Result<()> {
    let id: TaskId = options.id.parse()?;
    let mut ctx = load_context(&options.dir, true)?;
    let done = ctx.app.toggle_done(id)?;

    let mut human = HumanOutput::new(if done {
        "Task completed"
    } else {
        "Task reopened"
    });
    human.push_summary("ID", id.to_string());
    human.push_summary("Done", done.to_string());
    push_warnings(&mut human, &ctx.warnings);

    emit_success(
        options.output,
        "toggle",
        &TaskToggleOutput { id, done },
        Some(&human),
    )
}

pub fn run_rm(options: IdOptions) -> Result<()> {
    let id: TaskId = options.id.parse()?;
    let mut ctx = load_context(&options.dir, true)?;
    let removed = ctx.app.delete(id)?;

    let mut human = HumanOutput::new("Task deleted");
    human.push_summary("ID", id.to_string());
    human.push_summary("Title", removed.title.clone());
    push_warnings(&mut human, &ctx.warnings);

    let output = TaskDeleteOutput {
        id,
        title: removed.title,
        remaining: ctx.app.list().len(),
    };
    emit_success(options.output, "rm", &output, Some(&human))
}

/// Open the task list in `dir`. With `exclusive`, the store lock is held
/// from before the read until the context is dropped.
fn load_context(dir: &Path, exclusive: bool) -> Result<TaskContext> {
    let config = Config::load_from_dir(dir);
    let mut backend =
        FileStore::new(dir.to_path_buf()).with_lock_timeout(config.storage.lock_timeout_ms);
    if exclusive {
        backend.lock_key(&config.storage.key)?;
    }
    let (store, outcome) = TaskStore::load(backend, config.storage.key.clone())?;

    let mut warnings = Vec::new();
    match outcome {
        Some(HydrateOutcome::Rejected) => warnings.push(format!(
            "stored task list '{}' is malformed; starting empty",
            config.storage.key
        )),
        Some(HydrateOutcome::Loaded { skipped, .. }) if skipped > 0 => {
            warnings.push(format!("skipped {skipped} unreadable task record(s)"))
        }
        _ => {}
    }

    let app = TodoApp::new(store, SystemClock::new(config.dates.today));
    Ok(TaskContext {
        app,
        config,
        warnings,
    })
}

fn stage_files(app: &mut TodoApp<FileStore, SystemClock>, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        app.stage_attachment(Attachment::from_path(path)?)?;
    }
    Ok(())
}

fn push_task_summary(human: &mut HumanOutput, task: &Task) {
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    if !task.description.is_empty() {
        human.push_summary("Description", task.description.clone());
    }
    human.push_summary("Due", task.due_date.format(DATE_FORMAT).to_string());
    if !task.assignee.is_empty() {
        human.push_summary("Assignee", task.assignee.clone());
    }
    human.push_summary("Created", task.created_date.format(DATE_FORMAT).to_string());
    human.push_summary("Done", task.done.to_string());
    for attachment in &task.attachments {
        human.push_detail(format!(
            "attachment: {} ({} bytes)",
            attachment.name, attachment.size
        ));
    }
}

fn push_warnings(human: &mut HumanOutput, warnings: &[String]) {
    for warning in warnings {
        human.push_warning(warning.clone());
    }
}

fn format_task_line(task: &Task, today: chrono::NaiveDate) -> String {
    let mark = if task.done { "[x]" } else { "[ ]" };
    let mut line = format!(
        "{mark} {} {} (due {})",
        task.id,
        task.title,
        task.due_date.format(DATE_FORMAT)
    );
    if !task.assignee.is_empty() {
        line.push_str(&format!(" @{}", task.assignee));
    }
    if !task.attachments.is_empty() {
        line.push_str(&format!(" +{} file(s)", task.attachments.len()));
    }
    if task.is_overdue(today) {
        line.push_str(" OVERDUE");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(done: bool) -> Task {
        Task {
            id: TaskId(7),
            title: "Pay rent".to_string(),
            description: String::new(),
            due_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            assignee: "sam".to_string(),
            created_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            attachments: vec![Attachment::new("lease.pdf", 10)],
            done,
        }
    }

    #[test]
    fn task_line_marks_overdue_pending_tasks() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(
            format_task_line(&task(false), today),
            "[ ] #7 Pay rent (due 2026-10-01) @sam +1 file(s) OVERDUE"
        );
        assert_eq!(
            format_task_line(&task(true), today),
            "[x] #7 Pay rent (due 2026-10-01) @sam +1 file(s)"
        );
    }

    #[test]
    fn explicit_dir_wins() {
        let dir = PathBuf::from("/tmp/todo-data");
        assert_eq!(resolve_data_dir(Some(dir.clone())).unwrap(), dir);
    }
}
