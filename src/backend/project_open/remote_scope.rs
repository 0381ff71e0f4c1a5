use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::backend::common::constants::{REMOTE_URI_PREFIX, SSH_REMOTE_KIND};
use crate::backend::common::dtos::Project;

static SSH_TARGET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<authority>(?:(?P<user>[^@/]+)@)?(?P<host>[^@/]+))(?P<folder>/.*)?$")
        .expect("valid ssh target pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RemoteType {
    None,
    Ssh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SshRemoteTarget {
    /// `[user@]host`, as VS Code expects after `ssh-remote+`.
    pub authority: String,
    pub user: Option<String>,
    pub host: String,
    pub folder: Option<String>,
}

impl SshRemoteTarget {
    pub fn remote_authority(&self) -> String {
        format!("{SSH_REMOTE_KIND}+{}", self.authority)
    }

    pub fn folder_uri(&self) -> Option<String> {
        self.folder
            .as_ref()
            .map(|folder| format!("{REMOTE_URI_PREFIX}{}{folder}", self.remote_authority()))
    }
}

fn ssh_prefix() -> String {
    format!("{REMOTE_URI_PREFIX}{SSH_REMOTE_KIND}+")
}

pub fn remote_type(path: &str) -> RemoteType {
    if path.starts_with(&ssh_prefix()) {
        RemoteType::Ssh
    } else {
        RemoteType::None
    }
}

pub fn project_remote_type(project: &Project) -> RemoteType {
    remote_type(&project.path)
}

/// Splits an SSH project path into its authority and optional folder.
/// Returns `None` for local paths and for malformed remote ones.
pub fn parse_ssh_remote(path: &str) -> Option<SshRemoteTarget> {
    let target = path.strip_prefix(&ssh_prefix())?;
    let captures = SSH_TARGET_PATTERN.captures(target)?;

    Some(SshRemoteTarget {
        authority: captures.name("authority")?.as_str().to_string(),
        user: captures.name("user").map(|value| value.as_str().to_string()),
        host: captures.name("host")?.as_str().to_string(),
        folder: captures.name("folder").map(|value| value.as_str().to_string()),
    })
}
