//! Task operations. Each one validates its input, generates a
//! program, runs it, and decodes the output; mutations re-read the
//! task so callers always get the host's view, never an echo of the
//! request.

use log::warn;

use crate::error::Error;
use crate::model::{non_empty, BuiltinList, NewTask, Task, TaskFilter, TaskPatch};
use crate::model::validate_record_id;
use crate::record;
use crate::script;

use super::Bridge;

impl Bridge {
    /// Every task in one of the host's built-in lists.
    pub fn tasks_in(&self, list: BuiltinList) -> Result<Vec<Task>, Error> {
        let out = self.runner.run(&script::list_tasks(list))?;
        Ok(record::tasks(&out))
    }

    /// Tasks matching a filter. Exactly one criterion applies, in
    /// fixed precedence: project, then area, then tag.
    pub fn filtered_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, Error> {
        filter.validate()?;
        let program = if let Some(project) = non_empty(&filter.project) {
            script::tasks_in_project(project)
        } else if let Some(area) = non_empty(&filter.area) {
            script::tasks_in_area(area)
        } else {
            // validate() guarantees a tag when the other two are absent.
            let tag = non_empty(&filter.tag).ok_or_else(|| {
                Error::validation("at least one filter is required: project, area, or tag")
            })?;
            script::tasks_with_tag(tag)
        };
        let out = self.runner.run(&program)?;
        Ok(record::tasks(&out))
    }

    pub fn task(&self, id: &str) -> Result<Task, Error> {
        validate_record_id(id)?;
        let out = self.runner.run(&script::task_by_id(id))?;
        record::task(&out).ok_or_else(|| Error::NotFound(format!("task {id} not found")))
    }

    /// Creates a task and returns it as the host now sees it. Requests
    /// carrying checklist items cannot be expressed as a program and
    /// are delegated through the store bridge's URL path instead.
    pub fn create_task(&self, req: &NewTask) -> Result<Task, Error> {
        req.validate()?;
        if !req.checklist_items.is_empty() {
            let id = self
                .store
                .create_task_with_checklist(self.runner.as_ref(), req)?;
            let mut task = self.task(&id)?;
            match self.store.checklist_items(&id) {
                Ok(items) => task.checklist_items = items,
                Err(err) => warn!("created task {id} but cannot read its checklist: {err}"),
            }
            return Ok(task);
        }
        let id = self.runner.run(&script::create_task(req))?.trim().to_string();
        self.task(&id)
    }

    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, Error> {
        validate_record_id(id)?;
        patch.validate()?;
        self.runner.run(&script::update_task(id, patch))?;
        self.task(id)
    }

    pub fn complete_task(&self, id: &str) -> Result<(), Error> {
        validate_record_id(id)?;
        self.runner.run(&script::complete_task(id))?;
        Ok(())
    }

    pub fn cancel_task(&self, id: &str) -> Result<(), Error> {
        validate_record_id(id)?;
        self.runner.run(&script::cancel_task(id))?;
        Ok(())
    }

    /// Moves the task to the Trash list; the host has no hard delete.
    pub fn delete_task(&self, id: &str) -> Result<(), Error> {
        validate_record_id(id)?;
        self.runner.run(&script::delete_task(id))?;
        Ok(())
    }
}
