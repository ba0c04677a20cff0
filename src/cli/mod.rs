//! Command-line interface for todo
//!
//! This module defines the CLI structure using clap derive macros.
//! Task commands live in the `task` submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

mod task;

/// todo - a local to-do list
///
/// Create, edit, complete and delete tasks with due dates, assignees and
/// file attachments. Every change is written straight to disk.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the task list (defaults to the platform data dir)
    #[arg(long, global = true, env = "TODO_DIR")]
    pub dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    Add {
        /// Task title
        title: Option<String>,

        /// Due date (YYYY-MM-DD), today or later
        #[arg(long)]
        due: Option<String>,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Person responsible
        #[arg(short, long)]
        assignee: Option<String>,

        /// Attach a file (repeatable)
        #[arg(long = "attach", value_name = "PATH")]
        attach: Vec<PathBuf>,
    },

    /// Edit a task; unspecified fields keep their current values
    Edit {
        /// Task ID (e.g. 3 or #3)
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New due date (YYYY-MM-DD), today or later
        #[arg(long)]
        due: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New assignee
        #[arg(short, long)]
        assignee: Option<String>,

        /// Attach another file (repeatable)
        #[arg(long = "attach", value_name = "PATH")]
        attach: Vec<PathBuf>,

        /// Remove an attachment by file name (repeatable)
        #[arg(long = "detach", value_name = "NAME")]
        detach: Vec<String>,

        /// Remove all current attachments before applying --attach
        #[arg(long)]
        clear_attachments: bool,
    },

    /// List tasks
    #[command(alias = "ls")]
    List {
        /// Only tasks not yet done
        #[arg(long, conflicts_with = "done")]
        pending: bool,

        /// Only completed tasks
        #[arg(long)]
        done: bool,

        /// Only pending tasks past their due date
        #[arg(long)]
        overdue: bool,

        /// Only tasks for this assignee
        #[arg(long)]
        assignee: Option<String>,
    },

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// Flip a task between done and not done
    Toggle {
        /// Task ID
        id: String,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task ID
        id: String,
    },

    /// Show the effective configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let dir = task::resolve_data_dir(self.dir)?;
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        match self.command {
            Commands::Add {
                title,
                due,
                description,
                assignee,
                attach,
            } => task::run_add(task::AddOptions {
                title,
                due,
                description,
                assignee,
                attach,
                dir,
                output,
            }),
            Commands::Edit {
                id,
                title,
                due,
                description,
                assignee,
                attach,
                detach,
                clear_attachments,
            } => task::run_edit(task::EditOptions {
                id,
                title,
                due,
                description,
                assignee,
                attach,
                detach,
                clear_attachments,
                dir,
                output,
            }),
            Commands::List {
                pending,
                done,
                overdue,
                assignee,
            } => task::run_list(task::ListOptions {
                pending,
                done,
                overdue,
                assignee,
                dir,
                output,
            }),
            Commands::Show { id } => task::run_show(task::IdOptions { id, dir, output }),
            Commands::Toggle { id } => task::run_toggle(task::IdOptions { id, dir, output }),
            Commands::Rm { id } => task::run_rm(task::IdOptions { id, dir, output }),
            Commands::Config => run_config(dir, output),
        }
    }
}

fn run_config(dir: PathBuf, output: OutputOptions) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE);
    let config = Config::load_from_dir(&dir);

    #[derive(serde::Serialize)]
    struct ConfigOutput<'a> {
        dir: &'a std::path::Path,
        config_file: Option<&'a std::path::Path>,
        config: &'a Config,
    }

    let mut human = HumanOutput::new("Configuration");
    human.push_summary("Data dir", dir.display().to_string());
    if config_path.exists() {
        human.push_summary("Config file", config_path.display().to_string());
    } else {
        human.push_summary("Config file", "(none, using defaults)");
    }
    human.push_summary("storage.key", config.storage.key.clone());
    human.push_summary(
        "storage.lock_timeout_ms",
        config.storage.lock_timeout_ms.to_string(),
    );
    human.push_summary("dates.today", format!("{:?}", config.dates.today).to_lowercase());
    human.push_summary("list.hide_done", config.list.hide_done.to_string());

    let data = ConfigOutput {
        dir: &dir,
        config_file: config_path.exists().then_some(config_path.as_path()),
        config: &config,
    };
    emit_success(output, "config", &data, Some(&human))
}
