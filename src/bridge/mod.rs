//! The bridge facade. Owns the script runner and the store bridge and
//! routes each operation to the side that can express it: tasks,
//! projects, and areas through generated automation programs,
//! checklist items through the store.

mod projects;
mod tasks;

use log::debug;

use crate::config::Config;
use crate::error::Error;
use crate::model::{ChecklistItem, ChecklistItemPatch, NewChecklistItem};
use crate::runner::{self, Osascript, ScriptRunner};
use crate::store::{self, Sqlite3Cli, Store, StoreExec};

pub struct Bridge {
    runner: Box<dyn ScriptRunner>,
    store: Store,
    config: Config,
}

impl Bridge {
    /// Production wiring: osascript runner, sqlite3 CLI against the
    /// configured or discovered store path.
    pub fn new(config: Config) -> Result<Self, Error> {
        let db_path = match &config.store_path {
            Some(path) => path.clone(),
            None => store::discover_store_path()?,
        };
        debug!("using store at {}", db_path.display());
        let exec = Box::new(Sqlite3Cli::new(db_path));
        Ok(Self::with_parts(Box::new(Osascript::new()), exec, config))
    }

    /// Wires a bridge from explicit parts. The constructor tests use.
    pub fn with_parts(
        runner: Box<dyn ScriptRunner>,
        exec: Box<dyn StoreExec>,
        config: Config,
    ) -> Self {
        let store = Store::new(exec, config.poll.clone());
        Bridge {
            runner,
            store,
            config,
        }
    }

    /// Whether the host application's process is currently alive.
    pub fn is_app_running(&self) -> bool {
        runner::is_app_running()
    }

    // --- checklist items, served by the store bridge ---------------------

    pub fn checklist(&self, task_id: &str) -> Result<Vec<ChecklistItem>, Error> {
        self.store.checklist_items(task_id)
    }

    /// Adds a checklist item to an existing task. With an auth token
    /// configured the write is delegated through the URL scheme so the
    /// host applies it itself; without one the row is inserted
    /// directly.
    pub fn add_checklist_item(
        &self,
        task_id: &str,
        req: &NewChecklistItem,
    ) -> Result<ChecklistItem, Error> {
        req.validate()?;
        match &self.config.url_auth_token {
            Some(token) => {
                self.store
                    .append_checklist_item(self.runner.as_ref(), task_id, &req.title, token)
            }
            None => self.store.add_checklist_item_direct(task_id, &req.title),
        }
    }

    pub fn update_checklist_item(
        &self,
        task_id: &str,
        item_id: &str,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem, Error> {
        patch.validate()?;
        self.store.update_checklist_item(task_id, item_id, patch)
    }

    pub fn delete_checklist_item(&self, task_id: &str, item_id: &str) -> Result<(), Error> {
        self.store.delete_checklist_item(task_id, item_id)
    }
}
