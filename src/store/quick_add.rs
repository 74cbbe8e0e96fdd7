//! Construction of the host's quick-add URLs. The scheme expects
//! strict percent-encoding: a space must arrive as `%20`, never as
//! the form-encoded `+`, or the host stores literal plus signs.

use url::form_urlencoded::Serializer;

use crate::model::{non_empty, NewTask};

pub const ADD_ACTION: &str = "things:///add";
pub const UPDATE_ACTION: &str = "things:///update";

/// `things:///add` request creating a task together with its
/// checklist items, the one write the scripting interface cannot
/// express. A project target wins over an area target for the `list`
/// parameter.
pub fn add_task_url(req: &NewTask) -> String {
    let mut query = Serializer::new(String::new());
    query.append_pair("title", &req.title);
    query.append_pair("checklist-items", &req.checklist_items.join("\n"));
    if let Some(notes) = non_empty(&req.notes) {
        query.append_pair("notes", notes);
    }
    if let Some(project) = non_empty(&req.project) {
        query.append_pair("list", project);
    } else if let Some(area) = non_empty(&req.area) {
        query.append_pair("list", area);
    }
    if let Some(due) = non_empty(&req.due) {
        query.append_pair("deadline", due);
    }
    if let Some(when) = non_empty(&req.when) {
        query.append_pair("when", when);
    }
    if !req.tags.is_empty() {
        query.append_pair("tags", &req.tags.join(","));
    }
    query.append_pair("show-quick-entry", "false");
    format!("{ADD_ACTION}?{}", percent_spaces(query.finish()))
}

/// `things:///update` request appending one checklist item to an
/// existing task. Requires the host's URL-scheme auth token.
pub fn append_checklist_url(task_id: &str, title: &str, auth_token: Option<&str>) -> String {
    let mut query = Serializer::new(String::new());
    query.append_pair("id", task_id);
    query.append_pair("append-checklist-items", title);
    if let Some(token) = auth_token.filter(|t| !t.is_empty()) {
        query.append_pair("auth-token", token);
    }
    format!("{UPDATE_ACTION}?{}", percent_spaces(query.finish()))
}

/// Rewrites form-encoded spaces to `%20`. Safe because a literal `+`
/// in a value is already serialized as `%2B`.
fn percent_spaces(query: String) -> String {
    query.replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::{add_task_url, append_checklist_url};
    use crate::model::NewTask;
    use pretty_assertions::assert_eq;

    fn request() -> NewTask {
        NewTask {
            title: "Buy milk today".into(),
            notes: Some("from the corner shop".into()),
            project: Some("Groceries".into()),
            area: Some("Home".into()),
            due: Some("2026-09-01".into()),
            when: Some("today".into()),
            tags: vec!["errand".into(), "weekly".into()],
            checklist_items: vec!["skimmed".into(), "oat".into()],
        }
    }

    #[test]
    fn spaces_encode_as_percent_twenty_never_plus() {
        let url = add_task_url(&request());
        assert!(url.contains("title=Buy%20milk%20today"), "{url}");
        assert!(!url.contains('+'), "{url}");
    }

    #[test]
    fn literal_plus_signs_survive_the_space_rewrite() {
        let req = NewTask {
            title: "1+1".into(),
            ..Default::default()
        };
        let url = add_task_url(&req);
        assert!(url.contains("title=1%2B1"), "{url}");
    }

    #[test]
    fn add_url_carries_all_parameters() {
        let url = add_task_url(&request());
        assert!(url.starts_with("things:///add?"));
        assert!(url.contains("checklist-items=skimmed%0Aoat"));
        assert!(url.contains("notes=from%20the%20corner%20shop"));
        assert!(url.contains("deadline=2026-09-01"));
        assert!(url.contains("when=today"));
        assert!(url.contains("tags=errand%2Cweekly"));
        assert!(url.contains("show-quick-entry=false"));
    }

    #[test]
    fn project_takes_precedence_over_area_for_list() {
        let url = add_task_url(&request());
        assert!(url.contains("list=Groceries"), "{url}");
        assert!(!url.contains("list=Home"), "{url}");

        let mut req = request();
        req.project = None;
        let url = add_task_url(&req);
        assert!(url.contains("list=Home"), "{url}");
    }

    #[test]
    fn append_url_includes_token_only_when_present() {
        let url = append_checklist_url("T-1", "new step", Some("secret token"));
        assert_eq!(
            url,
            "things:///update?id=T-1&append-checklist-items=new%20step&auth-token=secret%20token"
        );

        let url = append_checklist_url("T-1", "new step", None);
        assert!(!url.contains("auth-token"));
    }
}
