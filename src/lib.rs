//! Automation bridge for the Things 3 desktop app.
//!
//! The host exposes no IPC API, so the bridge drives it through three
//! side channels: generated AppleScript programs run out of process
//! via `osascript`, read-mostly access to its SQLite store via the
//! `sqlite3` CLI, and `things:///` URL requests for the writes the
//! scripting interface cannot express. Each operation validates its
//! input, escapes every value for the sink it is spliced into, and
//! decodes the host's tab-delimited output back into typed records.
//!
//! [`Bridge`] is the entry point; construct one from a [`Config`] and
//! call its task, project, area, and checklist operations.

pub mod bridge;
pub mod config;
pub mod error;
pub mod escape;
pub mod model;
pub mod record;
pub mod runner;
pub mod script;
pub mod store;

pub use bridge::Bridge;
pub use config::Config;
pub use error::{Error, ErrorKind};
pub use model::{
    Area, AreaPatch, BuiltinList, ChecklistItem, ChecklistItemPatch, NewArea, NewChecklistItem,
    NewProject, NewTask, Project, Task, TaskFilter, TaskPatch,
};
pub use runner::{Osascript, ScriptRunner};
pub use store::{Sqlite3Cli, Store, StoreExec};
