//! Decoders for the tab-delimited records the automation scripts and
//! the sqlite3 CLI print. The wire format stays at this boundary;
//! everything past it is typed.
//!
//! The codec never fails: blank lines and lines with too few fields
//! for their record kind are dropped, and malformed numeric fields
//! fall back to zero.

use crate::model::{Area, ChecklistItem, Project, Task};

/// The host's sentinel for an absent optional value.
pub const MISSING_VALUE: &str = "missing value";

/// One decoded line. Field accessors apply the sentinel mapping so
/// per-kind decoders only describe their schema.
struct Fields<'a>(Vec<&'a str>);

impl<'a> Fields<'a> {
    fn decode(line: &'a str, min: usize) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < min {
            return None;
        }
        Some(Fields(fields))
    }

    fn required(&self, idx: usize) -> String {
        self.0.get(idx).copied().unwrap_or_default().to_string()
    }

    /// Optional field: trims, maps the `missing value` sentinel and
    /// emptiness to `None`.
    fn optional(&self, idx: usize) -> Option<String> {
        self.0.get(idx).copied().and_then(clean_missing)
    }

    /// Integer field; zero when absent or unparsable.
    fn count(&self, idx: usize) -> i64 {
        self.0
            .get(idx)
            .and_then(|f| f.trim().parse().ok())
            .unwrap_or(0)
    }
}

fn clean_missing(field: &str) -> Option<String> {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed == MISSING_VALUE {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Maps raw host status strings into the closed set. Unknown values
/// pass through verbatim rather than failing the record.
pub fn normalize_status(raw: &str) -> String {
    match raw.trim() {
        "open" => "open".to_string(),
        "completed" => "completed".to_string(),
        "canceled" | "cancelled" => "canceled".to_string(),
        other => other.to_string(),
    }
}

/// Splits the host's comma-joined tag field. The `", "` separator is
/// the host's observed convention; a tag name containing a literal
/// comma-space would split incorrectly, but the host's own escaping
/// rules for that case are undocumented.
pub fn split_tags(raw: &str) -> Vec<String> {
    match clean_missing(raw) {
        None => Vec::new(),
        Some(joined) => joined
            .split(", ")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Schema: `id \t title \t notes \t status \t project \t area \t tags
/// \t due \t created`. The first four fields are required.
pub fn tasks(output: &str) -> Vec<Task> {
    output
        .lines()
        .filter_map(|line| {
            let fields = Fields::decode(line, 4)?;
            Some(Task {
                id: fields.required(0),
                title: fields.required(1),
                notes: fields.optional(2),
                status: normalize_status(&fields.required(3)),
                project: fields.optional(4),
                area: fields.optional(5),
                tags: split_tags(fields.0.get(6).copied().unwrap_or_default()),
                due: fields.optional(7),
                created_at: fields.optional(8),
                checklist_items: Vec::new(),
            })
        })
        .collect()
}

pub fn task(output: &str) -> Option<Task> {
    tasks(output).into_iter().next()
}

/// Schema: `id \t name \t notes \t area \t taskCount`; id and name
/// required.
pub fn projects(output: &str) -> Vec<Project> {
    output
        .lines()
        .filter_map(|line| {
            let fields = Fields::decode(line, 2)?;
            Some(Project {
                id: fields.required(0),
                name: fields.required(1),
                notes: fields.optional(2),
                area: fields.optional(3),
                task_count: fields.count(4),
            })
        })
        .collect()
}

pub fn project(output: &str) -> Option<Project> {
    projects(output).into_iter().next()
}

/// Schema: `id \t name`.
pub fn areas(output: &str) -> Vec<Area> {
    output
        .lines()
        .filter_map(|line| {
            let fields = Fields::decode(line, 2)?;
            Some(Area {
                id: fields.required(0),
                name: fields.required(1),
                projects: Vec::new(),
            })
        })
        .collect()
}

pub fn area(output: &str) -> Option<Area> {
    areas(output).into_iter().next()
}

/// Schema: `uuid \t title \t status`, as printed by the store query
/// tool; a checklist row is completed iff its status column is 3.
pub fn checklist_items(output: &str) -> Vec<ChecklistItem> {
    output
        .lines()
        .filter_map(|line| {
            let fields = Fields::decode(line, 3)?;
            Some(ChecklistItem {
                id: fields.required(0),
                title: fields.required(1),
                completed: fields.required(2) == "3",
            })
        })
        .collect()
}
