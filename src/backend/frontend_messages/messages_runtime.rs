use super::messages_scope::{request_id, DashboardMessage, DashboardMessageResponse};
use crate::backend::common::dtos::{Group, GroupPatch};
use crate::backend::project_groups::ProjectService;
use crate::backend::project_open::{resolve_open_plan, OpenPlan};
use crate::error::DashboardResult;

enum MessageOutcome {
    Groups(Vec<Group>),
    Open(OpenPlan),
}

/// Parses a raw view message and applies it. Failures are reported in the
/// response rather than returned.
pub fn handle_dashboard_message(service: &ProjectService, raw: &str) -> DashboardMessageResponse {
    let message = match serde_json::from_str::<DashboardMessage>(raw) {
        Ok(message) => message,
        Err(error) => {
            return DashboardMessageResponse::failed(format!(
                "Failed to parse dashboard message: {error}"
            ));
        }
    };

    match dispatch_dashboard_message(service, message) {
        Ok(outcome) => {
            let (groups, open_plan) = match outcome {
                MessageOutcome::Groups(groups) => (Some(groups), None),
                MessageOutcome::Open(plan) => (None, Some(plan)),
            };
            DashboardMessageResponse {
                request_id: request_id(),
                ok: true,
                groups,
                open_plan,
                error: None,
            }
        }
        Err(error) => DashboardMessageResponse::failed(error.to_string()),
    }
}

fn dispatch_dashboard_message(
    service: &ProjectService,
    message: DashboardMessage,
) -> DashboardResult<MessageOutcome> {
    match message {
        DashboardMessage::ReorderedProjects { group_orders } => {
            service.reorder_groups(&group_orders).map(MessageOutcome::Groups)
        }
        DashboardMessage::CollapseGroup {
            group_id,
            collapsed,
        } => {
            if let Some(group) = service.get_group(&group_id)? {
                let patch = GroupPatch {
                    collapsed: Some(collapsed.unwrap_or(!group.collapsed)),
                    ..GroupPatch::default()
                };
                service.update_group(&group_id, &patch)?;
            }
            service.get_groups().map(MessageOutcome::Groups)
        }
        DashboardMessage::RemoveProject { project_id } => {
            service.remove_project(&project_id).map(MessageOutcome::Groups)
        }
        DashboardMessage::RemoveGroup {
            group_id,
            test_if_empty,
        } => service
            .remove_group(&group_id, test_if_empty)
            .map(MessageOutcome::Groups),
        DashboardMessage::SelectedProject {
            project_id,
            action,
            open_folders,
        } => {
            let Some(project) = service.get_project(&project_id)? else {
                return Ok(MessageOutcome::Open(OpenPlan::Rejected {
                    reason: format!("Project {project_id} no longer exists."),
                }));
            };
            resolve_open_plan(&project, action, &open_folders).map(MessageOutcome::Open)
        }
    }
}
