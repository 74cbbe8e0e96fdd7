//! Bridge to the host's on-disk SQLite store. Checklist items are the
//! one record kind the scripting interface cannot create, so they are
//! read and written here: directly by row mutation, or indirectly via
//! the quick-add URL scheme followed by polling until the delegated
//! write becomes durable.

pub mod poll;
pub mod quick_add;

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::thread;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::Error;
use crate::escape::sql_literal;
use crate::model::{validate_record_id, ChecklistItem, ChecklistItemPatch, NewTask};
use crate::record;
use crate::runner::ScriptRunner;
use poll::{PollPlan, Reconciliation};

/// The host's group container under the user's profile. The data
/// directory inside it carries a session-specific suffix and must be
/// discovered by listing, never assumed.
pub const GROUP_CONTAINER: &str = "Library/Group Containers/JLMPQHK86H.com.culturedcode.ThingsMac";
pub const DATA_DIR_PREFIX: &str = "ThingsData-";
pub const DB_FILE: &str = "Things Database.thingsdatabase/main.sqlite";

pub const DEFAULT_QUERY_TOOL: &str = "sqlite3";

/// Locates the live store file, or errors when the host has no data
/// directory on this machine.
pub fn discover_store_path() -> Result<PathBuf, Error> {
    let home = dirs::home_dir()
        .ok_or_else(|| Error::Store("cannot determine home directory".to_string()))?;
    discover_store_path_in(&home.join(GROUP_CONTAINER))
}

fn discover_store_path_in(container: &std::path::Path) -> Result<PathBuf, Error> {
    let entries = fs::read_dir(container)
        .map_err(|e| Error::Store(format!("cannot read Things container: {e}")))?;
    for entry in entries.flatten() {
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if !is_dir || !entry.file_name().to_string_lossy().starts_with(DATA_DIR_PREFIX) {
            continue;
        }
        let db_path = entry.path().join(DB_FILE);
        if db_path.exists() {
            return Ok(db_path);
        }
    }
    Err(Error::Store("Things 3 database not found".to_string()))
}

/// Executes one SQL statement against the store and returns its
/// tab-separated output. The seam the store bridge is tested through.
pub trait StoreExec: Send + Sync {
    fn query(&self, sql: &str) -> Result<String, Error>;
}

/// Production executor: shells out to the sqlite3 CLI with a tab
/// separator, same failure discipline as the script runner.
pub struct Sqlite3Cli {
    command: String,
    db_path: PathBuf,
}

impl Sqlite3Cli {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Sqlite3Cli {
            command: DEFAULT_QUERY_TOOL.to_string(),
            db_path: db_path.into(),
        }
    }

    pub fn with_command(command: impl Into<String>, db_path: impl Into<PathBuf>) -> Self {
        Sqlite3Cli {
            command: command.into(),
            db_path: db_path.into(),
        }
    }
}

impl StoreExec for Sqlite3Cli {
    fn query(&self, sql: &str) -> Result<String, Error> {
        debug!("running {} ({} bytes)", self.command, sql.len());
        let output = Command::new(&self.command)
            .args(["-separator", "\t"])
            .arg(&self.db_path)
            .arg(sql)
            .output()
            .map_err(|e| Error::Store(format!("failed to launch {}: {e}", self.command)))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        let text = String::from_utf8_lossy(&combined).trim().to_string();

        if output.status.success() {
            Ok(text)
        } else {
            let message = if text.is_empty() {
                format!("{} exited with {}", self.command, output.status)
            } else {
                text
            };
            Err(Error::Store(message))
        }
    }
}

/// The store bridge proper. Holds no state beyond its executor and
/// polling cadence; every operation re-queries the live store.
pub struct Store {
    exec: Box<dyn StoreExec>,
    poll: PollPlan,
}

impl Store {
    pub fn new(exec: Box<dyn StoreExec>, poll: PollPlan) -> Self {
        Store { exec, poll }
    }

    /// All checklist rows for a task, in checklist order.
    pub fn checklist_items(&self, task_id: &str) -> Result<Vec<ChecklistItem>, Error> {
        validate_record_id(task_id)?;
        let sql = format!(
            "SELECT uuid, title, status FROM TMChecklistItem WHERE task='{}' ORDER BY \"index\" ASC",
            sql_literal(task_id)
        );
        Ok(record::checklist_items(&self.exec.query(&sql)?))
    }

    /// Creates a task with checklist items through the quick-add URL
    /// scheme, then polls for the resulting row. Correlation is
    /// best-effort: the most recently created task with the exact
    /// title that owns at least one checklist row. Returns the new
    /// task's identifier.
    pub fn create_task_with_checklist(
        &self,
        runner: &dyn ScriptRunner,
        req: &NewTask,
    ) -> Result<String, Error> {
        runner.open_url(&quick_add::add_task_url(req))?;

        let sql = format!(
            "SELECT t.uuid FROM TMTask t \
             JOIN TMChecklistItem ci ON ci.task = t.uuid \
             WHERE t.title='{}' \
             GROUP BY t.uuid \
             ORDER BY t.creationDate DESC LIMIT 1",
            sql_literal(&req.title)
        );
        let outcome = poll::run(&self.poll, thread::sleep, || self.probe_single(&sql));
        match outcome {
            Reconciliation::Visible(uuid) => Ok(uuid),
            Reconciliation::Expired => Err(Error::Timeout(
                "task was sent via the URL scheme but its row never appeared in the store"
                    .to_string(),
            )),
        }
    }

    /// Appends a checklist item to an existing task through the URL
    /// scheme (requires the host's auth token), then polls for the
    /// appended row.
    pub fn append_checklist_item(
        &self,
        runner: &dyn ScriptRunner,
        task_id: &str,
        title: &str,
        auth_token: &str,
    ) -> Result<ChecklistItem, Error> {
        validate_record_id(task_id)?;
        runner.open_url(&quick_add::append_checklist_url(
            task_id,
            title,
            Some(auth_token),
        ))?;

        let sql = format!(
            "SELECT uuid, title, status FROM TMChecklistItem \
             WHERE task='{}' AND title='{}' \
             ORDER BY \"index\" DESC LIMIT 1",
            sql_literal(task_id),
            sql_literal(title)
        );
        let outcome = poll::run(&self.poll, thread::sleep, || {
            self.probe_query(&sql)
                .and_then(|out| record::checklist_items(&out).into_iter().next())
        });
        match outcome {
            Reconciliation::Visible(item) => Ok(item),
            Reconciliation::Expired => Err(Error::Timeout(
                "checklist item was sent via the URL scheme but never appeared in the store"
                    .to_string(),
            )),
        }
    }

    /// Direct row insert, used when no URL-scheme token is
    /// configured. Immediately consistent for readers of the store,
    /// though the host's UI may lag until its next store reload.
    pub fn add_checklist_item_direct(
        &self,
        task_id: &str,
        title: &str,
    ) -> Result<ChecklistItem, Error> {
        validate_record_id(task_id)?;
        let uuid = generate_record_id();
        let now = core_data_timestamp(Utc::now());
        let task = sql_literal(task_id);
        let sql = format!(
            "INSERT INTO TMChecklistItem \
             (uuid, task, title, status, \"index\", creationDate, userModificationDate, leavesTombstone) \
             VALUES ('{}', '{task}', '{}', 0, \
             (SELECT COALESCE(MAX(\"index\"), 0) + 1 FROM TMChecklistItem WHERE task='{task}'), \
             {now:.6}, {now:.6}, 1)",
            sql_literal(&uuid),
            sql_literal(title),
        );
        self.exec.query(&sql)?;
        Ok(ChecklistItem {
            id: uuid,
            title: title.to_string(),
            completed: false,
        })
    }

    /// Updates title and/or completion of one checklist row, then
    /// reads it back. Completing stamps `stopDate`; reopening clears
    /// it. `userModificationDate` is bumped either way.
    pub fn update_checklist_item(
        &self,
        task_id: &str,
        item_id: &str,
        patch: &ChecklistItemPatch,
    ) -> Result<ChecklistItem, Error> {
        validate_record_id(task_id)?;
        validate_record_id(item_id)?;

        let now = core_data_timestamp(Utc::now());
        let mut sets = Vec::new();
        if let Some(title) = &patch.title {
            sets.push(format!("title='{}'", sql_literal(title)));
        }
        if let Some(completed) = patch.completed {
            if completed {
                sets.push("status=3".to_string());
                sets.push(format!("stopDate={now:.6}"));
            } else {
                sets.push("status=0".to_string());
                sets.push("stopDate=NULL".to_string());
            }
        }
        sets.push(format!("userModificationDate={now:.6}"));

        let item = sql_literal(item_id);
        let task = sql_literal(task_id);
        let sql = format!(
            "UPDATE TMChecklistItem SET {} WHERE uuid='{item}' AND task='{task}'",
            sets.join(", "),
        );
        self.exec.query(&sql)?;

        let read_back = format!(
            "SELECT uuid, title, status FROM TMChecklistItem WHERE uuid='{item}' AND task='{task}'",
        );
        let out = self.exec.query(&read_back)?;
        record::checklist_items(&out)
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound("checklist item not found".to_string()))
    }

    pub fn delete_checklist_item(&self, task_id: &str, item_id: &str) -> Result<(), Error> {
        validate_record_id(task_id)?;
        validate_record_id(item_id)?;
        let sql = format!(
            "DELETE FROM TMChecklistItem WHERE uuid='{}' AND task='{}'",
            sql_literal(item_id),
            sql_literal(task_id)
        );
        self.exec.query(&sql)?;
        Ok(())
    }

    /// One poll probe expecting a single scalar; query failures are
    /// logged and retried rather than aborting the reconciliation.
    fn probe_single(&self, sql: &str) -> Option<String> {
        self.probe_query(sql)
            .map(|out| out.trim().to_string())
            .filter(|out| !out.is_empty())
    }

    fn probe_query(&self, sql: &str) -> Option<String> {
        match self.exec.query(sql) {
            Ok(out) => Some(out),
            Err(err) => {
                warn!("store probe failed, retrying: {err}");
                None
            }
        }
    }
}

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of the identifiers the host assigns to its records.
pub const RECORD_ID_LEN: usize = 22;

/// Generates a host-compatible 22-character base-62 identifier from
/// OS randomness, falling back to the nanosecond clock when the
/// random source is unavailable.
pub fn generate_record_id() -> String {
    let mut bytes = [0u8; RECORD_ID_LEN];
    if OsRng.try_fill_bytes(&mut bytes).is_err() {
        let nanos = format!(
            "{:022}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        bytes.copy_from_slice(&nanos.as_bytes()[..RECORD_ID_LEN]);
    }
    bytes
        .iter()
        .map(|b| BASE62[usize::from(*b) % BASE62.len()] as char)
        .collect()
}

/// The store encodes instants as seconds since 2001-01-01T00:00:00Z.
pub const CORE_DATA_EPOCH_UNIX: i64 = 978_307_200;

/// Converts a wall-clock instant into the store's floating-second
/// encoding, microsecond precision.
pub fn core_data_timestamp(now: DateTime<Utc>) -> f64 {
    (now.timestamp() - CORE_DATA_EPOCH_UNIX) as f64
        + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}
