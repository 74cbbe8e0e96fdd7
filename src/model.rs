use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A to-do as reconstructed from the host's automation output. Every
/// read builds these fresh; the bridge holds no cache of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Normalized into {open, completed, canceled}; unrecognized raw
    /// values from the host pass through verbatim.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist_items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default)]
    pub task_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    /// Populated only on single-area fetch.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,
}

/// The host's built-in task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinList {
    Inbox,
    Today,
    Upcoming,
    Anytime,
    Someday,
    Trash,
}

impl BuiltinList {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinList::Inbox => "Inbox",
            BuiltinList::Today => "Today",
            BuiltinList::Upcoming => "Upcoming",
            BuiltinList::Anytime => "Anytime",
            BuiltinList::Someday => "Someday",
            BuiltinList::Trash => "Trash",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "checklistItems")]
    pub checklist_items: Vec<String>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.title.len() > 1000 {
            return Err(Error::validation("title must be under 1000 characters"));
        }
        if self.notes.as_deref().unwrap_or_default().len() > 10000 {
            return Err(Error::validation("notes must be under 10000 characters"));
        }
        if let Some(due) = non_empty(&self.due) {
            validate_iso_date(due, "due")?;
        }
        if let Some(when) = non_empty(&self.when) {
            When::parse(when, WhenScope::Task)?;
        }
        validate_tags(&self.tags)?;
        validate_container_name(&self.project, "project")?;
        validate_container_name(&self.area, "area")?;
        if self.checklist_items.len() > 100 {
            return Err(Error::validation("maximum 100 checklist items allowed"));
        }
        for item in &self.checklist_items {
            if item.is_empty() {
                return Err(Error::validation("checklist item title cannot be empty"));
            }
            if item.len() > 1000 {
                return Err(Error::validation(
                    "checklist item title must be under 1000 characters",
                ));
            }
        }
        Ok(())
    }
}

/// Partial update for a task. `None` leaves a field untouched;
/// `Some("")` on `due`/`when` clears the date, and on `project` moves
/// the task back to the Inbox.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl TaskPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(title) = &self.title {
            if title.is_empty() {
                return Err(Error::validation("title cannot be empty"));
            }
            if title.len() > 1000 {
                return Err(Error::validation("title must be under 1000 characters"));
            }
        }
        if self.notes.as_deref().unwrap_or_default().len() > 10000 {
            return Err(Error::validation("notes must be under 10000 characters"));
        }
        if let Some(due) = non_empty(&self.due) {
            validate_iso_date(due, "due")?;
        }
        if let Some(when) = non_empty(&self.when) {
            When::parse(when, WhenScope::Task)?;
        }
        if let Some(tags) = &self.tags {
            validate_tags(tags)?;
        }
        validate_container_name(&self.project, "project")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::validation("name is required"));
        }
        if self.name.len() > 500 {
            return Err(Error::validation("name must be under 500 characters"));
        }
        if self.notes.as_deref().unwrap_or_default().len() > 10000 {
            return Err(Error::validation("notes must be under 10000 characters"));
        }
        validate_container_name(&self.area, "area")?;
        if let Some(when) = non_empty(&self.when) {
            When::parse(when, WhenScope::Project)?;
        }
        Ok(())
    }
}

/// `Some("")` on `area` detaches the project from its area.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
}

impl ProjectPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(Error::validation("name cannot be empty"));
            }
            if name.len() > 500 {
                return Err(Error::validation("name must be under 500 characters"));
            }
        }
        if self.notes.as_deref().unwrap_or_default().len() > 10000 {
            return Err(Error::validation("notes must be under 10000 characters"));
        }
        validate_container_name(&self.area, "area")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewArea {
    pub name: String,
}

impl NewArea {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::validation("name is required"));
        }
        if self.name.len() > 500 {
            return Err(Error::validation("name must be under 500 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaPatch {
    #[serde(default)]
    pub name: Option<String>,
}

impl AreaPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(name) = &self.name {
            if name.is_empty() {
                return Err(Error::validation("name cannot be empty"));
            }
            if name.len() > 500 {
                return Err(Error::validation("name must be under 500 characters"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChecklistItem {
    pub title: String,
}

impl NewChecklistItem {
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.is_empty() {
            return Err(Error::validation("title is required"));
        }
        if self.title.len() > 1000 {
            return Err(Error::validation("title must be under 1000 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChecklistItemPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl ChecklistItemPatch {
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(title) = &self.title {
            if title.is_empty() {
                return Err(Error::validation("title cannot be empty"));
            }
            if title.len() > 1000 {
                return Err(Error::validation("title must be under 1000 characters"));
            }
        }
        if self.title.is_none() && self.completed.is_none() {
            return Err(Error::validation(
                "at least one field (title or completed) is required",
            ));
        }
        Ok(())
    }
}

/// Filter for task enumeration; at least one criterion must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

impl TaskFilter {
    pub fn validate(&self) -> Result<(), Error> {
        if non_empty(&self.project).is_none()
            && non_empty(&self.area).is_none()
            && non_empty(&self.tag).is_none()
        {
            return Err(Error::validation(
                "at least one filter is required: project, area, or tag",
            ));
        }
        for value in [&self.project, &self.area, &self.tag].into_iter().flatten() {
            if value.len() > 500 {
                return Err(Error::validation(
                    "filter values must be under 500 characters",
                ));
            }
        }
        Ok(())
    }
}

/// Scheduling keywords the host understands. Tasks accept the full
/// vocabulary; projects have no evening or tomorrow shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum When {
    Today,
    Evening,
    Tomorrow,
    Someday,
    Anytime,
    Date(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenScope {
    Task,
    Project,
}

impl When {
    pub fn parse(raw: &str, scope: WhenScope) -> Result<Self, Error> {
        match (raw, scope) {
            ("today", _) => Ok(When::Today),
            ("someday", _) => Ok(When::Someday),
            ("anytime", _) => Ok(When::Anytime),
            ("evening", WhenScope::Task) => Ok(When::Evening),
            ("tomorrow", WhenScope::Task) => Ok(When::Tomorrow),
            _ => {
                if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
                    Ok(When::Date(raw.to_string()))
                } else {
                    Err(Error::validation(match scope {
                        WhenScope::Task => {
                            "when must be one of: today, evening, tomorrow, someday, anytime, or a date (YYYY-MM-DD)"
                        }
                        WhenScope::Project => {
                            "when must be one of: today, someday, anytime, or a date (YYYY-MM-DD)"
                        }
                    }))
                }
            }
        }
    }
}

/// Identifiers assigned by the host (and the checklist ids generated
/// here) are opaque strings of letters, digits, and hyphens. Checked
/// before any identifier reaches a generated program or query.
pub fn validate_record_id(id: &str) -> Result<(), Error> {
    if id.is_empty() {
        return Err(Error::validation("id is required"));
    }
    if id.len() > 100 || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(Error::validation("invalid id format"));
    }
    Ok(())
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn validate_iso_date(value: &str, field: &str) -> Result<(), Error> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| Error::validation(format!("{field} must be an ISO 8601 date (YYYY-MM-DD)")))
}

fn validate_tags(tags: &[String]) -> Result<(), Error> {
    if tags.len() > 50 {
        return Err(Error::validation("maximum 50 tags allowed"));
    }
    for tag in tags {
        if tag.len() > 200 {
            return Err(Error::validation("each tag must be under 200 characters"));
        }
    }
    Ok(())
}

fn validate_container_name(value: &Option<String>, field: &str) -> Result<(), Error> {
    if value.as_deref().unwrap_or_default().len() > 500 {
        return Err(Error::validation(format!(
            "{field} name must be under 500 characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_ids_accept_alphanumerics_and_hyphens() {
        assert!(validate_record_id("Abc-123").is_ok());
        assert!(validate_record_id("3nrePkwnrXUF2ZbqMmVbXa").is_ok());
    }

    #[test]
    fn record_ids_reject_spaces_emptiness_and_overlength() {
        assert!(validate_record_id("abc 123").is_err());
        assert!(validate_record_id("").is_err());
        assert!(validate_record_id(&"a".repeat(101)).is_err());
        assert!(validate_record_id(&"a".repeat(100)).is_ok());
        assert!(validate_record_id("abc'; DROP TABLE TMTask;--").is_err());
    }

    #[test]
    fn new_task_requires_a_title() {
        let req = NewTask::default();
        let err = req.validate().expect_err("empty title");
        assert_eq!(err.to_string(), "title is required");
    }

    #[test]
    fn new_task_rejects_malformed_due_date() {
        let req = NewTask {
            title: "Buy milk".into(),
            due: Some("tomorrow".into()),
            ..Default::default()
        };
        let err = req.validate().expect_err("bad due");
        assert_eq!(err.to_string(), "due must be an ISO 8601 date (YYYY-MM-DD)");
    }

    #[test]
    fn new_task_accepts_keywords_and_dates_for_when() {
        for when in ["today", "evening", "tomorrow", "someday", "anytime", "2026-09-01"] {
            let req = NewTask {
                title: "t".into(),
                when: Some(when.into()),
                ..Default::default()
            };
            assert!(req.validate().is_ok(), "when = {when}");
        }
    }

    #[test]
    fn project_when_vocabulary_excludes_evening_and_tomorrow() {
        assert!(When::parse("evening", WhenScope::Project).is_err());
        assert!(When::parse("tomorrow", WhenScope::Project).is_err());
        assert_eq!(
            When::parse("someday", WhenScope::Project).expect("someday"),
            When::Someday
        );
        assert!(When::parse("2026-09-01", WhenScope::Project).is_ok());
    }

    #[test]
    fn new_task_bounds_tags_and_checklist_items() {
        let req = NewTask {
            title: "t".into(),
            tags: vec!["x".into(); 51],
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = NewTask {
            title: "t".into(),
            checklist_items: vec!["step".into(); 101],
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = NewTask {
            title: "t".into(),
            checklist_items: vec!["".into()],
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn task_patch_allows_empty_strings_as_clear_markers() {
        let patch = TaskPatch {
            due: Some("".into()),
            when: Some("".into()),
            project: Some("".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn task_patch_rejects_empty_title() {
        let patch = TaskPatch {
            title: Some("".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn checklist_patch_needs_at_least_one_field() {
        assert!(ChecklistItemPatch::default().validate().is_err());
        let patch = ChecklistItemPatch {
            completed: Some(true),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn task_serialization_omits_absent_optionals() {
        let task = Task {
            id: "T-1".into(),
            title: "Buy milk".into(),
            status: "open".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&task).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"id": "T-1", "title": "Buy milk", "status": "open"})
        );

        let parsed: NewTask = serde_json::from_str(
            r#"{"title": "Pack", "checklistItems": ["passport"], "tags": ["travel"]}"#,
        )
        .expect("deserialize");
        assert_eq!(parsed.checklist_items, vec!["passport"]);
        assert_eq!(parsed.tags, vec!["travel"]);
    }

    #[test]
    fn task_filter_requires_a_criterion() {
        assert!(TaskFilter::default().validate().is_err());
        let filter = TaskFilter {
            tag: Some("urgent".into()),
            ..Default::default()
        };
        assert!(filter.validate().is_ok());
        let filter = TaskFilter {
            project: Some("x".repeat(501)),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }
}
