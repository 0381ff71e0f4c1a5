use std::collections::HashMap;

use super::groups_runtime::ProjectService;
use crate::backend::common::constants::PLACEHOLDER_GROUP_NAME_PREFIX;
use crate::backend::common::dtos::{Group, GroupOrder, Project};
use crate::error::DashboardResult;

/// Rebuilds the store from a complete drag-and-drop snapshot. Groups and
/// projects missing from `order` are dropped; ids that no longer resolve are
/// skipped. Unknown group ids become new placeholder groups.
pub(crate) fn reconcile_group_order(groups: Vec<Group>, order: &[GroupOrder]) -> Vec<Group> {
    let mut projects_by_id = groups
        .iter()
        .flat_map(|group| group.projects.iter())
        .map(|project| (project.id.clone(), project.clone()))
        .collect::<HashMap<String, Project>>();
    let mut groups_by_id = groups
        .into_iter()
        .map(|group| (group.id.clone(), group))
        .collect::<HashMap<String, Group>>();

    let mut synthesized = 0usize;
    order
        .iter()
        .map(|entry| {
            let mut group = groups_by_id.remove(&entry.group_id).unwrap_or_else(|| {
                synthesized += 1;
                Group::new(
                    Some(format!("{PLACEHOLDER_GROUP_NAME_PREFIX}{synthesized}")),
                    Vec::new(),
                )
            });

            group.projects = entry
                .project_ids
                .iter()
                .filter_map(|project_id| {
                    let project = projects_by_id.remove(project_id);
                    if project.is_none() {
                        tracing::debug!(project_id = %project_id, "dropping unresolved project id from reorder");
                    }
                    project
                })
                .collect();
            group
        })
        .collect()
}

impl ProjectService {
    pub fn reorder_groups(&self, order: &[GroupOrder]) -> DashboardResult<Vec<Group>> {
        let _guard = self.lock_writes();
        let (kind, groups) = self.read_active_groups()?;
        self.write_groups(kind, reconcile_group_order(groups, order))
    }
}
