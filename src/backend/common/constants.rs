pub(crate) const PROJECTS_KEY: &str = "projects";
pub(crate) const PROJECT_DATA_KEY: &str = "projectData";
pub(crate) const RECENT_COLORS_KEY: &str = "recentColors";

pub(crate) const STORE_PROJECTS_IN_SETTINGS_KEY: &str = "storeProjectsInSettings";
pub(crate) const RECENT_COLORS_TO_REMEMBER_KEY: &str = "recentColorsToRemember";
pub(crate) const ADD_NEW_PROJECTS_TO_FRONT_KEY: &str = "addNewProjectsToFront";
pub(crate) const SETTINGS_KEYS: [&str; 3] = [
    STORE_PROJECTS_IN_SETTINGS_KEY,
    RECENT_COLORS_TO_REMEMBER_KEY,
    ADD_NEW_PROJECTS_TO_FRONT_KEY,
];
pub(crate) const DEFAULT_RECENT_COLORS_TO_REMEMBER: usize = 15;

pub(crate) const GLOBAL_STATE_FILE: &str = "global-state.json";
pub(crate) const SETTINGS_FILE: &str = "settings.json";
pub(crate) const DATA_DIR_ENV: &str = "DASHBOARD_DATA_DIR";
pub(crate) const DEFAULT_DATA_DIR_NAME: &str = ".project-dashboard";

pub(crate) const MAX_ID_PREFIX_LEN: usize = 24;
pub(crate) const ID_RANDOM_SUFFIX_LEN: usize = 9;
pub(crate) const PLACEHOLDER_GROUP_NAME_PREFIX: &str = "Group #";

pub(crate) const REMOTE_URI_PREFIX: &str = "vscode-remote://";
pub(crate) const SSH_REMOTE_KIND: &str = "ssh-remote";
pub(crate) const WORKSPACE_FILE_EXTENSION: &str = "code-workspace";

pub(crate) const PREDEFINED_COLORS: [(&str, &str); 6] = [
    (
        "Green",
        "var(--vscode-gitDecoration-untrackedResourceForeground)",
    ),
    (
        "Brown",
        "var(--vscode-gitDecoration-modifiedResourceForeground)",
    ),
    ("Red", "var(--vscode-gitDecoration-deletedResourceForeground)"),
    ("Grey", "var(--vscode-gitDecoration-ignoredResourceForeground)"),
    (
        "Dark Blue",
        "var(--vscode-gitDecoration-conflictingResourceForeground)",
    ),
    (
        "Light Blue",
        "var(--vscode-gitDecoration-submoduleResourceForeground)",
    ),
];
