use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::backend::common::dtos::{Group, GroupOrder};
use crate::backend::project_open::{OpenAction, OpenPlan};

pub(crate) fn request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Messages posted by the dashboard view, tagged by their `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum DashboardMessage {
    ReorderedProjects {
        #[serde(default)]
        group_orders: Vec<GroupOrder>,
    },
    /// `collapsed` absent toggles the current state.
    CollapseGroup {
        group_id: String,
        #[serde(default)]
        collapsed: Option<bool>,
    },
    RemoveProject {
        project_id: String,
    },
    RemoveGroup {
        group_id: String,
        #[serde(default)]
        test_if_empty: bool,
    },
    SelectedProject {
        project_id: String,
        #[serde(default)]
        action: OpenAction,
        #[serde(default)]
        open_folders: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMessageResponse {
    pub request_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_plan: Option<OpenPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DashboardMessageResponse {
    pub(crate) fn failed(error: impl Into<String>) -> Self {
        Self {
            request_id: request_id(),
            ok: false,
            groups: None,
            open_plan: None,
            error: Some(error.into()),
        }
    }
}
