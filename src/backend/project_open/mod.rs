mod open_runtime;
mod remote_scope;

pub use open_runtime::{
    classify_local_path, read_workspace_manifest_folders, resolve_open_plan, OpenAction, OpenPlan,
    ProjectPathKind,
};
pub use remote_scope::{parse_ssh_remote, project_remote_type, remote_type, RemoteType, SshRemoteTarget};
