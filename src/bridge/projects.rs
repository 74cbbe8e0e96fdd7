//! Project and area operations, same shape as the task side: create
//! and update re-fetch the record so the caller sees what the host
//! actually stored.

use log::warn;

use crate::error::Error;
use crate::model::{validate_record_id, Area, AreaPatch, NewArea, NewProject, Project, ProjectPatch};
use crate::record;
use crate::script;

use super::Bridge;

impl Bridge {
    pub fn projects(&self) -> Result<Vec<Project>, Error> {
        let out = self.runner.run(&script::list_projects())?;
        Ok(record::projects(&out))
    }

    pub fn project(&self, id: &str) -> Result<Project, Error> {
        validate_record_id(id)?;
        let out = self.runner.run(&script::project_by_id(id))?;
        record::project(&out).ok_or_else(|| Error::NotFound(format!("project {id} not found")))
    }

    pub fn create_project(&self, req: &NewProject) -> Result<Project, Error> {
        req.validate()?;
        let id = self
            .runner
            .run(&script::create_project(req))?
            .trim()
            .to_string();
        self.project(&id)
    }

    pub fn update_project(&self, id: &str, patch: &ProjectPatch) -> Result<Project, Error> {
        validate_record_id(id)?;
        patch.validate()?;
        self.runner.run(&script::update_project(id, patch))?;
        self.project(id)
    }

    pub fn complete_project(&self, id: &str) -> Result<(), Error> {
        validate_record_id(id)?;
        self.runner.run(&script::complete_project(id))?;
        Ok(())
    }

    pub fn areas(&self) -> Result<Vec<Area>, Error> {
        let out = self.runner.run(&script::list_areas())?;
        Ok(record::areas(&out))
    }

    /// Single area with its projects attached. The project listing is
    /// best-effort: a failure there degrades to an empty list rather
    /// than failing an area that demonstrably exists.
    pub fn area(&self, id: &str) -> Result<Area, Error> {
        validate_record_id(id)?;
        let out = self.runner.run(&script::area_by_id(id))?;
        let mut area =
            record::area(&out).ok_or_else(|| Error::NotFound(format!("area {id} not found")))?;
        match self.runner.run(&script::projects_in_area(id)) {
            Ok(out) => area.projects = record::projects(&out),
            Err(err) => warn!("cannot list projects of area {id}: {err}"),
        }
        Ok(area)
    }

    pub fn create_area(&self, req: &NewArea) -> Result<Area, Error> {
        req.validate()?;
        let id = self
            .runner
            .run(&script::create_area(&req.name))?
            .trim()
            .to_string();
        self.area(&id)
    }

    pub fn update_area(&self, id: &str, patch: &AreaPatch) -> Result<Area, Error> {
        validate_record_id(id)?;
        patch.validate()?;
        self.runner.run(&script::update_area(id, patch))?;
        self.area(id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{bridge, test_config, FakeExec, FakeRunner, PanickingRunner};
    use super::super::Bridge;
    use crate::error::{classify_script_failure, Error, ErrorKind};
    use crate::model::{AreaPatch, NewArea, NewProject, ProjectPatch};
    use pretty_assertions::assert_eq;

    const PROJECT_LINE: &str = "P-1\tGroceries\tmissing value\tHome\t3";

    #[test]
    fn project_listing_decodes_records() {
        let runner = FakeRunner::new(vec![Ok(format!("{PROJECT_LINE}\n"))]);
        let bridge = bridge(runner.clone(), FakeExec::new(vec![]));
        let projects = bridge.projects().expect("projects");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].task_count, 3);
        assert!(runner.programs()[0].contains("repeat with p in projects"));
    }

    #[test]
    fn missing_project_is_not_found() {
        let runner = FakeRunner::new(vec![Err(classify_script_failure(
            "Cannot find project named \"Groceries\"".to_string(),
        ))]);
        let bridge = bridge(runner, FakeExec::new(vec![]));
        let err = bridge.project("P-404").expect_err("missing");
        assert!(err.is_not_found());
    }

    #[test]
    fn create_project_refetches_by_the_returned_id() {
        let runner = FakeRunner::new(vec![
            Ok("P-1\n".to_string()),
            Ok(PROJECT_LINE.to_string()),
        ]);
        let bridge = bridge(runner.clone(), FakeExec::new(vec![]));
        let project = bridge
            .create_project(&NewProject {
                name: "Groceries".into(),
                ..Default::default()
            })
            .expect("created");
        assert_eq!(project.id, "P-1");
        let programs = runner.programs();
        assert!(programs[0].contains("make new project"));
        assert!(programs[1].contains("first project whose id is \"P-1\""));
    }

    #[test]
    fn update_project_validates_before_running() {
        let bridge = Bridge::with_parts(
            Box::new(PanickingRunner),
            Box::new(FakeExec::new(vec![])),
            test_config(),
        );
        let patch = ProjectPatch {
            name: Some("".into()),
            ..Default::default()
        };
        let err = bridge.update_project("P-1", &patch).expect_err("empty name");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn area_fetch_attaches_its_projects() {
        let runner = FakeRunner::new(vec![
            Ok("A-1\tHome".to_string()),
            Ok("P-1\tGroceries\t\t\t3\nP-2\tGarden\t\t\t1".to_string()),
        ]);
        let bridge = bridge(runner.clone(), FakeExec::new(vec![]));
        let area = bridge.area("A-1").expect("area");
        assert_eq!(area.name, "Home");
        assert_eq!(area.projects.len(), 2);
        assert_eq!(area.projects[1].name, "Garden");
        assert!(runner.programs()[1].contains("repeat with p in projects of a"));
    }

    #[test]
    fn area_fetch_degrades_to_no_projects_on_listing_failure() {
        let runner = FakeRunner::new(vec![
            Ok("A-1\tHome".to_string()),
            Err(Error::Script("interpreter crashed".to_string())),
        ]);
        let bridge = bridge(runner, FakeExec::new(vec![]));
        let area = bridge.area("A-1").expect("area still resolves");
        assert!(area.projects.is_empty());
    }

    #[test]
    fn create_and_update_area_round_trip_through_refetch() {
        let runner = FakeRunner::new(vec![
            Ok("A-1\n".to_string()),
            Ok("A-1\tWork".to_string()),
            Ok(String::new()),
        ]);
        let bridge = bridge(runner.clone(), FakeExec::new(vec![]));
        let area = bridge
            .create_area(&NewArea { name: "Work".into() })
            .expect("created");
        assert_eq!(area.id, "A-1");

        let runner = FakeRunner::new(vec![
            Ok(String::new()),
            Ok("A-1\tOffice".to_string()),
            Ok(String::new()),
        ]);
        let bridge = super::super::test_support::bridge(runner.clone(), FakeExec::new(vec![]));
        let patch = AreaPatch {
            name: Some("Office".into()),
        };
        let area = bridge.update_area("A-1", &patch).expect("updated");
        assert_eq!(area.name, "Office");
        assert!(runner.programs()[0].contains("set name of a to \"Office\""));
    }

    #[test]
    fn complete_project_returns_unit() {
        let runner = FakeRunner::new(vec![Ok(String::new())]);
        let bridge = bridge(runner.clone(), FakeExec::new(vec![]));
        bridge.complete_project("P-1").expect("completed");
        assert!(runner.programs()[0].contains("set status of p to completed"));
    }
}
