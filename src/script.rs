//! AppleScript program generation. Pure text: nothing here touches a
//! process or the filesystem. Every user-supplied value is routed
//! through [`escape::script_literal`] before splicing.

use crate::escape::script_literal;
use crate::model::{
    non_empty, AreaPatch, BuiltinList, NewProject, NewTask, ProjectPatch, TaskPatch,
};

pub const APP_NAME: &str = "Things3";

/// Line-oriented program accumulator wrapping statements in the
/// application-scoping block.
struct Program {
    lines: Vec<String>,
}

impl Program {
    fn new() -> Self {
        Program {
            lines: vec![format!("tell application \"{APP_NAME}\"")],
        }
    }

    fn stmt(&mut self, statement: impl Into<String>) -> &mut Self {
        self.lines.push(format!("\t{}", statement.into()));
        self
    }

    /// Appends a pre-indented multi-line snippet verbatim.
    fn block(&mut self, snippet: impl Into<String>) -> &mut Self {
        self.lines.push(snippet.into());
        self
    }

    fn finish(mut self) -> String {
        self.lines.push("end tell".to_string());
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FindKind {
    Project,
    Area,
}

impl FindKind {
    fn singular(self) -> &'static str {
        match self {
            FindKind::Project => "project",
            FindKind::Area => "area",
        }
    }

    fn collection(self) -> &'static str {
        match self {
            FindKind::Project => "projects",
            FindKind::Area => "areas",
        }
    }
}

/// Name lookup shim for projects and areas. The host pads names with
/// trailing spaces inconsistently and its `whose name is` predicate
/// silently misses padded records, so the only reliable match is a
/// linear scan: prefix test, strip trailing spaces one at a time,
/// exact compare, bind and stop. A full scan with no match raises a
/// program-level error whose text the runner boundary classifies as
/// not-found.
pub(crate) fn find_by_name(kind: FindKind, var: &str, name: &str) -> String {
    let escaped = script_literal(name);
    let singular = kind.singular();
    let collection = kind.collection();
    format!(
        "\tset {var} to missing value
\trepeat with _item in {collection}
\t\tif (name of _item) starts with \"{escaped}\" then
\t\t\tset trimmedName to name of _item
\t\t\trepeat while trimmedName ends with \" \"
\t\t\t\tset trimmedName to text 1 thru -2 of trimmedName
\t\t\tend repeat
\t\t\tif trimmedName is \"{escaped}\" then
\t\t\t\tset {var} to _item
\t\t\t\texit repeat
\t\t\tend if
\t\tend if
\tend repeat
\tif {var} is missing value then error \"Cannot find {singular} named \\\"{escaped}\\\"\""
    )
}

// --- task record capture -------------------------------------------------

const TASK_RECORD_EXPR: &str = "taskId & tab & taskName & tab & taskNotes & tab & (taskStatus as string) & tab & projName & tab & areaName & tab & tagList & tab & dueVal & tab & createdVal";

/// Captures one task's fields into locals, with `try` guards around
/// the lookups that error on detached tasks.
fn capture_task_fields(var: &str, indent: &str) -> String {
    let lines: Vec<String> = vec![
        format!("set taskId to id of {var}"),
        format!("set taskName to name of {var}"),
        format!("set taskNotes to notes of {var}"),
        format!("set taskStatus to status of {var}"),
        "set projName to \"\"".to_string(),
        "try".to_string(),
        format!("\tset projName to name of project of {var}"),
        "end try".to_string(),
        "set areaName to \"\"".to_string(),
        "try".to_string(),
        format!("\tset areaName to name of area of {var}"),
        "end try".to_string(),
        "set tagList to \"\"".to_string(),
        "try".to_string(),
        format!("\tset tagList to tag names of {var}"),
        "end try".to_string(),
        "set dueVal to \"missing value\"".to_string(),
        "try".to_string(),
        format!("\tset dueVal to due date of {var} as string"),
        "end try".to_string(),
        "set createdVal to \"missing value\"".to_string(),
        "try".to_string(),
        format!("\tset createdVal to creation date of {var} as string"),
        "end try".to_string(),
    ];
    lines
        .into_iter()
        .map(|l| format!("{indent}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn task_emit_loop(source: &str) -> String {
    format!(
        "\trepeat with t in {source}\n{}\n\t\tset output to output & {TASK_RECORD_EXPR} & linefeed\n\tend repeat",
        capture_task_fields("t", "\t\t")
    )
}

// --- task programs -------------------------------------------------------

/// Enumerates every task in a built-in list, one tab-delimited record
/// per line.
pub fn list_tasks(list: BuiltinList) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set taskList to to dos of list \"{}\"",
        list.as_str()
    ))
    .stmt("set output to \"\"")
    .block(task_emit_loop("taskList"))
    .stmt("return output");
    p.finish()
}

pub fn tasks_in_project(project: &str) -> String {
    let mut p = Program::new();
    p.block(find_by_name(FindKind::Project, "proj", project))
        .stmt("set taskList to to dos of proj")
        .stmt("set output to \"\"")
        .block(task_emit_loop("taskList"))
        .stmt("return output");
    p.finish()
}

pub fn tasks_in_area(area: &str) -> String {
    let mut p = Program::new();
    p.block(find_by_name(FindKind::Area, "a", area))
        .stmt("set taskList to to dos of a")
        .stmt("set output to \"\"")
        .block(task_emit_loop("taskList"))
        .stmt("return output");
    p.finish()
}

pub fn tasks_with_tag(tag: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set taskList to to dos whose tag names contains \"{}\"",
        script_literal(tag)
    ))
    .stmt("set output to \"\"")
    .block(task_emit_loop("taskList"))
    .stmt("return output");
    p.finish()
}

/// Single task by identifier; one record, no trailing newline. The
/// lookup errors if the id does not exist, which surfaces through the
/// runner's not-found classification.
pub fn task_by_id(id: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set t to first to do whose id is \"{}\"",
        script_literal(id)
    ))
    .block(capture_task_fields("t", "\t"))
    .stmt(format!("return {TASK_RECORD_EXPR}"));
    p.finish()
}

/// Emits exactly one scheduling statement for a `when` value: a list
/// move, a relative date add, or an absolute date assignment.
/// `evening` gets the Today move alone; the host infers the evening
/// slot from it and an extra activation write would double-schedule.
fn schedule(p: &mut Program, var: &str, when: &str) {
    match when {
        "today" | "evening" => {
            p.stmt(format!("move {var} to list \"Today\""));
        }
        "someday" => {
            p.stmt(format!("move {var} to list \"Someday\""));
        }
        "anytime" => {
            p.stmt(format!("move {var} to list \"Anytime\""));
        }
        "tomorrow" => {
            p.stmt(format!(
                "set activation date of {var} to (current date) + 1 * days"
            ));
        }
        date => {
            p.stmt(format!(
                "set activation date of {var} to date \"{}\"",
                script_literal(date)
            ));
        }
    }
}

fn joined_tag_literal(tags: &[String]) -> String {
    tags.iter()
        .map(|t| script_literal(t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Creates a task and returns its new identifier. A project target
/// takes precedence over an area target.
pub fn create_task(req: &NewTask) -> String {
    let mut props = format!("name:\"{}\"", script_literal(&req.title));
    if let Some(notes) = non_empty(&req.notes) {
        props.push_str(&format!(", notes:\"{}\"", script_literal(notes)));
    }

    let mut p = Program::new();
    let project = non_empty(&req.project);
    match project {
        Some(project) => {
            p.block(find_by_name(FindKind::Project, "proj", project))
                .stmt(format!(
                    "set newTask to make new to do in proj with properties {{{props}}}"
                ));
        }
        None => {
            p.stmt(format!(
                "set newTask to make new to do with properties {{{props}}}"
            ));
        }
    }
    if let Some(due) = non_empty(&req.due) {
        p.stmt(format!(
            "set due date of newTask to date \"{}\"",
            script_literal(due)
        ));
    }
    if let Some(when) = non_empty(&req.when) {
        schedule(&mut p, "newTask", when);
    }
    if !req.tags.is_empty() {
        p.stmt(format!(
            "set tag names of newTask to \"{}\"",
            joined_tag_literal(&req.tags)
        ));
    }
    if project.is_none() {
        if let Some(area) = non_empty(&req.area) {
            p.block(find_by_name(FindKind::Area, "targetArea", area))
                .stmt("set area of newTask to targetArea");
        }
    }
    p.stmt("return id of newTask");
    p.finish()
}

/// Applies a patch to an existing task; returns nothing. Empty-string
/// patch values clear: due/when become `missing value`, an empty
/// project moves the task back to the Inbox.
pub fn update_task(id: &str, patch: &TaskPatch) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set t to first to do whose id is \"{}\"",
        script_literal(id)
    ));
    if let Some(title) = &patch.title {
        p.stmt(format!("set name of t to \"{}\"", script_literal(title)));
    }
    if let Some(notes) = &patch.notes {
        p.stmt(format!("set notes of t to \"{}\"", script_literal(notes)));
    }
    if let Some(due) = &patch.due {
        if due.is_empty() {
            p.stmt("set due date of t to missing value");
        } else {
            p.stmt(format!(
                "set due date of t to date \"{}\"",
                script_literal(due)
            ));
        }
    }
    if let Some(when) = &patch.when {
        if when.is_empty() {
            p.stmt("set activation date of t to missing value");
        } else {
            schedule(&mut p, "t", when);
        }
    }
    if let Some(tags) = &patch.tags {
        p.stmt(format!(
            "set tag names of t to \"{}\"",
            joined_tag_literal(tags)
        ));
    }
    if let Some(project) = &patch.project {
        if project.is_empty() {
            p.stmt(format!("move t to list \"{}\"", BuiltinList::Inbox.as_str()));
        } else {
            p.block(find_by_name(FindKind::Project, "proj", project))
                .stmt("move t to proj");
        }
    }
    p.finish()
}

pub fn complete_task(id: &str) -> String {
    set_task_status(id, "completed")
}

pub fn cancel_task(id: &str) -> String {
    set_task_status(id, "canceled")
}

fn set_task_status(id: &str, status: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set t to first to do whose id is \"{}\"",
        script_literal(id)
    ))
    .stmt(format!("set status of t to {status}"));
    p.finish()
}

/// Deleting is a move to the Trash list; the host has no hard delete.
pub fn delete_task(id: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "move (first to do whose id is \"{}\") to list \"{}\"",
        script_literal(id),
        BuiltinList::Trash.as_str()
    ));
    p.finish()
}

// --- project programs ----------------------------------------------------

const PROJECT_RECORD_EXPR: &str =
    "pId & tab & pName & tab & pNotes & tab & pArea & tab & (taskCount as string)";

fn capture_project_fields(var: &str, indent: &str) -> String {
    let lines: Vec<String> = vec![
        format!("set pId to id of {var}"),
        format!("set pName to name of {var}"),
        format!("set pNotes to notes of {var}"),
        "set pArea to \"\"".to_string(),
        "try".to_string(),
        format!("\tset pArea to name of area of {var}"),
        "end try".to_string(),
        format!("set taskCount to count of to dos of {var}"),
    ];
    lines
        .into_iter()
        .map(|l| format!("{indent}{l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn list_projects() -> String {
    let mut p = Program::new();
    p.stmt("set output to \"\"")
        .block(format!(
            "\trepeat with p in projects\n{}\n\t\tset output to output & {PROJECT_RECORD_EXPR} & linefeed\n\tend repeat",
            capture_project_fields("p", "\t\t")
        ))
        .stmt("return output");
    p.finish()
}

pub fn project_by_id(id: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set p to first project whose id is \"{}\"",
        script_literal(id)
    ))
    .block(capture_project_fields("p", "\t"))
    .stmt(format!("return {PROJECT_RECORD_EXPR}"));
    p.finish()
}

/// Projects inside one area; the area column is emitted empty since
/// the caller already knows it.
pub fn projects_in_area(area_id: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set a to first area whose id is \"{}\"",
        script_literal(area_id)
    ))
    .stmt("set output to \"\"")
    .block(
        "\trepeat with p in projects of a
\t\tset pId to id of p
\t\tset pName to name of p
\t\tset pNotes to notes of p
\t\tset taskCount to count of to dos of p
\t\tset output to output & pId & tab & pName & tab & pNotes & tab & \"\" & tab & (taskCount as string) & linefeed
\tend repeat",
    )
    .stmt("return output");
    p.finish()
}

pub fn create_project(req: &NewProject) -> String {
    let mut props = format!("name:\"{}\"", script_literal(&req.name));
    if let Some(notes) = non_empty(&req.notes) {
        props.push_str(&format!(", notes:\"{}\"", script_literal(notes)));
    }

    let mut p = Program::new();
    p.stmt(format!(
        "set newProj to make new project with properties {{{props}}}"
    ));
    if let Some(area) = non_empty(&req.area) {
        p.block(find_by_name(FindKind::Area, "targetArea", area))
            .stmt("set area of newProj to targetArea");
    }
    if let Some(when) = non_empty(&req.when) {
        schedule(&mut p, "newProj", when);
    }
    p.stmt("return id of newProj");
    p.finish()
}

/// `Some("")` on area detaches the project.
pub fn update_project(id: &str, patch: &ProjectPatch) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set p to first project whose id is \"{}\"",
        script_literal(id)
    ));
    if let Some(name) = &patch.name {
        p.stmt(format!("set name of p to \"{}\"", script_literal(name)));
    }
    if let Some(notes) = &patch.notes {
        p.stmt(format!("set notes of p to \"{}\"", script_literal(notes)));
    }
    if let Some(area) = &patch.area {
        if area.is_empty() {
            p.stmt("set area of p to missing value");
        } else {
            p.block(find_by_name(FindKind::Area, "targetArea", area))
                .stmt("set area of p to targetArea");
        }
    }
    p.finish()
}

pub fn complete_project(id: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set p to first project whose id is \"{}\"",
        script_literal(id)
    ))
    .stmt("set status of p to completed");
    p.finish()
}

// --- area programs -------------------------------------------------------

pub fn list_areas() -> String {
    let mut p = Program::new();
    p.stmt("set output to \"\"")
        .block(
            "\trepeat with a in areas
\t\tset aId to id of a
\t\tset aName to name of a
\t\tset output to output & aId & tab & aName & linefeed
\tend repeat",
        )
        .stmt("return output");
    p.finish()
}

pub fn area_by_id(id: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set a to first area whose id is \"{}\"",
        script_literal(id)
    ))
    .stmt("set aId to id of a")
    .stmt("set aName to name of a")
    .stmt("return aId & tab & aName");
    p.finish()
}

pub fn create_area(name: &str) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set newArea to make new area with properties {{name:\"{}\"}}",
        script_literal(name)
    ))
    .stmt("return id of newArea");
    p.finish()
}

pub fn update_area(id: &str, patch: &AreaPatch) -> String {
    let mut p = Program::new();
    p.stmt(format!(
        "set a to first area whose id is \"{}\"",
        script_literal(id)
    ));
    if let Some(name) = &patch.name {
        p.stmt(format!("set name of a to \"{}\"", script_literal(name)));
    }
    p.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn programs_are_wrapped_in_the_app_scope() {
        let program = list_tasks(BuiltinList::Inbox);
        assert!(program.starts_with("tell application \"Things3\"\n"));
        assert!(program.ends_with("\nend tell"));
        assert!(program.contains("set taskList to to dos of list \"Inbox\""));
        assert!(program.contains("set output to output & taskId & tab & taskName"));
    }

    #[test]
    fn task_by_id_escapes_the_identifier_literal() {
        let program = task_by_id(r#"weird"id"#);
        assert!(program.contains(r#"set t to first to do whose id is "weird\"id""#));
        assert!(program.contains("return taskId & tab & taskName"));
        assert!(!program.contains("linefeed"));
    }

    #[test]
    fn find_by_name_emits_the_scan_and_trim_shim() {
        let snippet = find_by_name(FindKind::Project, "proj", "Groceries");
        assert!(snippet.contains("repeat with _item in projects"));
        assert!(snippet.contains("if (name of _item) starts with \"Groceries\""));
        assert!(snippet.contains("repeat while trimmedName ends with \" \""));
        assert!(snippet.contains("set trimmedName to text 1 thru -2 of trimmedName"));
        assert!(snippet.contains("if trimmedName is \"Groceries\""));
        assert!(snippet
            .contains("if proj is missing value then error \"Cannot find project named \\\"Groceries\\\"\""));
    }

    #[test]
    fn find_by_name_escapes_quoted_names() {
        let snippet = find_by_name(FindKind::Area, "a", r#"Say "hi""#);
        assert!(snippet.contains(r#"starts with "Say \"hi\"""#));
        assert!(!snippet.contains(r#"starts with "Say "hi"""#));
    }

    #[test]
    fn create_task_in_project_uses_the_shim_and_returns_the_id() {
        let req = NewTask {
            title: "Buy milk".into(),
            notes: Some("2%".into()),
            project: Some("Groceries".into()),
            area: Some("Home".into()),
            ..Default::default()
        };
        let program = create_task(&req);
        assert!(program.contains("repeat with _item in projects"));
        assert!(program
            .contains("set newTask to make new to do in proj with properties {name:\"Buy milk\", notes:\"2%\"}"));
        // Project takes precedence: no area assignment when both given.
        assert!(!program.contains("targetArea"));
        assert!(program.contains("\treturn id of newTask"));
    }

    #[test]
    fn create_task_without_project_assigns_the_area() {
        let req = NewTask {
            title: "t".into(),
            area: Some("Home".into()),
            ..Default::default()
        };
        let program = create_task(&req);
        assert!(program.contains("repeat with _item in areas"));
        assert!(program.contains("set area of newTask to targetArea"));
    }

    #[test]
    fn when_mapping_emits_exactly_one_scheduling_statement() {
        let cases = [
            ("today", "move newTask to list \"Today\""),
            ("evening", "move newTask to list \"Today\""),
            ("someday", "move newTask to list \"Someday\""),
            ("anytime", "move newTask to list \"Anytime\""),
            (
                "tomorrow",
                "set activation date of newTask to (current date) + 1 * days",
            ),
            (
                "2026-09-01",
                "set activation date of newTask to date \"2026-09-01\"",
            ),
        ];
        for (when, expected) in cases {
            let req = NewTask {
                title: "t".into(),
                when: Some(when.into()),
                ..Default::default()
            };
            let program = create_task(&req);
            assert!(program.contains(expected), "when = {when}");
            let scheduling_statements = program
                .lines()
                .filter(|l| l.contains("move newTask to list") || l.contains("set activation date"))
                .count();
            assert_eq!(scheduling_statements, 1, "when = {when}");
        }
    }

    #[test]
    fn create_task_joins_escaped_tags() {
        let req = NewTask {
            title: "t".into(),
            tags: vec!["work".into(), "ur\"gent".into()],
            ..Default::default()
        };
        let program = create_task(&req);
        assert!(program.contains(r#"set tag names of newTask to "work, ur\"gent""#));
    }

    #[test]
    fn update_task_clears_fields_for_empty_strings() {
        let patch = TaskPatch {
            due: Some("".into()),
            when: Some("".into()),
            project: Some("".into()),
            ..Default::default()
        };
        let program = update_task("T-1", &patch);
        assert!(program.contains("set due date of t to missing value"));
        assert!(program.contains("set activation date of t to missing value"));
        assert!(program.contains("move t to list \"Inbox\""));
    }

    #[test]
    fn update_task_moves_into_a_found_project() {
        let patch = TaskPatch {
            project: Some("Groceries".into()),
            ..Default::default()
        };
        let program = update_task("T-1", &patch);
        assert!(program.contains("repeat with _item in projects"));
        assert!(program.contains("\tmove t to proj"));
    }

    #[test]
    fn status_changes_assign_the_status_property() {
        assert!(complete_task("T-1").contains("set status of t to completed"));
        assert!(cancel_task("T-1").contains("set status of t to canceled"));
    }

    #[test]
    fn delete_task_moves_to_trash() {
        let program = delete_task("T-1");
        assert!(program.contains("move (first to do whose id is \"T-1\") to list \"Trash\""));
    }

    #[test]
    fn project_programs_carry_the_task_count() {
        let program = list_projects();
        assert!(program.contains("set taskCount to count of to dos of p"));
        assert!(program.contains("(taskCount as string)"));
        assert!(project_by_id("P-1").contains("first project whose id is \"P-1\""));
    }

    #[test]
    fn projects_in_area_emits_an_empty_area_column() {
        let program = projects_in_area("A-1");
        assert!(program.contains("repeat with p in projects of a"));
        assert!(program.contains("& tab & \"\" & tab &"));
    }

    #[test]
    fn update_project_detaches_area_on_empty_string() {
        let patch = ProjectPatch {
            area: Some("".into()),
            ..Default::default()
        };
        assert!(update_project("P-1", &patch).contains("set area of p to missing value"));
    }

    #[test]
    fn area_programs_are_two_field_records() {
        assert!(list_areas().contains("set output to output & aId & tab & aName & linefeed"));
        assert!(area_by_id("A-1").contains("return aId & tab & aName"));
        assert!(create_area("Wo\"rk").contains(r#"{name:"Wo\"rk"}"#));
    }
}
