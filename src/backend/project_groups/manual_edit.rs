use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::backend::common::dtos::Group;
use crate::error::{DashboardError, DashboardResult};

const LEGACY_GROUP_NAME_KEY: &str = "name";
const GROUP_NAME_KEY: &str = "groupName";
const PROJECTS_KEY: &str = "projects";
const REQUIRED_PROJECT_KEYS: [&str; 3] = ["id", "name", "path"];

pub fn render_manual_edit_document(groups: &[Group]) -> DashboardResult<String> {
    let mut document = serde_json::to_string_pretty(groups).map_err(|error| {
        DashboardError::storage(format!("Failed to serialize manual edit document: {error}"))
    })?;
    document.push('\n');
    Ok(document)
}

/// Validates an edited document as a whole. Groups with a null name and no
/// projects are deletion markers and are dropped; any other violation rejects
/// the entire document.
pub fn parse_manual_edit_document(document: &str) -> DashboardResult<Vec<Group>> {
    let value = serde_json::from_str::<Value>(document).map_err(|error| {
        DashboardError::validation(format!("Failed to parse manual edit document: {error}"))
    })?;
    let Value::Array(entries) = value else {
        return Err(DashboardError::validation(
            "Manual edit document must be a JSON array of groups.",
        ));
    };

    let mut groups = Vec::with_capacity(entries.len());
    let mut project_ids = HashSet::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let Value::Object(mut fields) = entry else {
            return Err(invalid_group(index, "expected an object"));
        };

        migrate_legacy_group_name(&mut fields);
        if is_deletion_marker(&fields) {
            continue;
        }

        validate_group_fields(index, &fields)?;
        let group = serde_json::from_value::<Group>(Value::Object(fields))
            .map_err(|error| invalid_group(index, &error.to_string()))?;

        for project in &group.projects {
            if !project_ids.insert(project.id.clone()) {
                return Err(invalid_group(
                    index,
                    &format!("project id {} is used more than once", project.id),
                ));
            }
        }
        groups.push(group);
    }

    Ok(groups)
}

fn migrate_legacy_group_name(fields: &mut Map<String, Value>) {
    if fields.contains_key(GROUP_NAME_KEY) {
        return;
    }
    if let Some(name) = fields.remove(LEGACY_GROUP_NAME_KEY) {
        fields.insert(GROUP_NAME_KEY.to_string(), name);
    }
}

fn is_deletion_marker(fields: &Map<String, Value>) -> bool {
    let unnamed = fields.get(GROUP_NAME_KEY).map_or(true, Value::is_null);
    let empty = match fields.get(PROJECTS_KEY) {
        None | Some(Value::Null) => true,
        Some(Value::Array(projects)) => projects.is_empty(),
        Some(_) => false,
    };
    unnamed && empty
}

fn validate_group_fields(index: usize, fields: &Map<String, Value>) -> DashboardResult<()> {
    if fields.get("id").map_or(true, Value::is_null) {
        return Err(invalid_group(index, "missing `id`"));
    }
    match fields.get(GROUP_NAME_KEY) {
        None => return Err(invalid_group(index, "missing `groupName`")),
        Some(Value::Null | Value::String(_)) => {}
        Some(_) => return Err(invalid_group(index, "`groupName` must be a string")),
    }

    let Some(Value::Array(projects)) = fields.get(PROJECTS_KEY) else {
        return Err(invalid_group(index, "`projects` must be an array"));
    };
    for (project_index, project) in projects.iter().enumerate() {
        let Value::Object(project) = project else {
            return Err(invalid_group(
                index,
                &format!("project {project_index} is not an object"),
            ));
        };
        if let Some(key) = REQUIRED_PROJECT_KEYS
            .iter()
            .find(|key| project.get(**key).map_or(true, Value::is_null))
        {
            return Err(invalid_group(
                index,
                &format!("project {project_index} is missing `{key}`"),
            ));
        }
    }

    Ok(())
}

fn invalid_group(index: usize, reason: &str) -> DashboardError {
    DashboardError::validation(format!("Invalid group at index {index}: {reason}."))
}
