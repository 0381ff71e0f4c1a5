use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use project_dashboard::{
    render_manual_edit_document, resolve_open_plan, Dashboard, DashboardError, DashboardResult,
    GroupPatch, OpenAction, Project,
};

const LOG_FILTER_ENV: &str = "DASHBOARD_LOG";

#[derive(Parser, Debug)]
#[command(name = "project-dashboard", version, about = "Manage dashboard project groups")]
struct Cli {
    /// Data directory (defaults to $DASHBOARD_DATA_DIR, then ~/.project-dashboard)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print all groups and their projects
    List {
        #[arg(long)]
        json: bool,
    },
    AddGroup {
        name: String,
    },
    AddProject {
        name: String,
        path: String,
        #[arg(long)]
        color: Option<String>,
        /// Target group id; falls back to the first group
        #[arg(long)]
        group: Option<String>,
    },
    RemoveProject {
        id: String,
    },
    RemoveGroup {
        id: String,
        /// Keep the group if it still has projects
        #[arg(long)]
        if_empty: bool,
    },
    RenameGroup {
        id: String,
        name: String,
    },
    /// Copy groups into the active backend if it was never written
    Migrate,
    RecentColors,
    RandomColor {
        #[arg(long)]
        predefined: bool,
    },
    /// Show how a project would be opened
    OpenPlan {
        project_id: String,
        #[arg(long, value_enum, default_value_t = OpenActionArg::Default)]
        action: OpenActionArg,
        /// Folders already open in the target workspace
        #[arg(long = "open-folder")]
        open_folders: Vec<PathBuf>,
    },
    /// Write the store as an editable JSON document
    Export {
        path: PathBuf,
    },
    /// Replace the store with an edited JSON document
    Import {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OpenActionArg {
    Default,
    NewWindow,
    AddToWorkspace,
}

impl From<OpenActionArg> for OpenAction {
    fn from(value: OpenActionArg) -> Self {
        match value {
            OpenActionArg::Default => OpenAction::Default,
            OpenActionArg::NewWindow => OpenAction::NewWindow,
            OpenActionArg::AddToWorkspace => OpenAction::AddToWorkspace,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> DashboardResult<()> {
    let dashboard = Dashboard::open(cli.data_dir.as_deref())?;
    let projects = dashboard.projects();

    match cli.command {
        Command::List { json } => {
            let groups = projects.get_groups()?;
            if json {
                print!("{}", render_manual_edit_document(&groups)?);
                return Ok(());
            }
            for group in groups {
                let name = if group.is_unnamed() { "(unnamed)" } else { group.display_name() };
                println!("{name} [{}]", group.id);
                for project in &group.projects {
                    let color = project.color.as_deref().unwrap_or("-");
                    println!("  {} [{}] {} {color}", project.name, project.id, project.path);
                }
            }
        }
        Command::AddGroup { name } => {
            let group = projects.add_group(Some(&name), Vec::new())?;
            println!("{}", group.id);
        }
        Command::AddProject {
            name,
            path,
            color,
            group,
        } => {
            let project = Project::new(name, path, color);
            let project_id = project.id.clone();
            projects.add_project(project, group.as_deref())?;
            println!("{project_id}");
        }
        Command::RemoveProject { id } => {
            projects.remove_project(&id)?;
        }
        Command::RemoveGroup { id, if_empty } => {
            projects.remove_group(&id, if_empty)?;
        }
        Command::RenameGroup { id, name } => {
            let patch = GroupPatch {
                group_name: Some(Some(name)),
                ..GroupPatch::default()
            };
            projects.update_group(&id, &patch)?;
        }
        Command::Migrate => {
            let migrated = projects.migrate_if_needed()?;
            println!("{}", if migrated { "migrated" } else { "nothing to migrate" });
        }
        Command::RecentColors => {
            for (code, name) in dashboard.colors().get_recent_colors()? {
                println!("{code}\t{}", name.unwrap_or_default());
            }
        }
        Command::RandomColor { predefined } => {
            println!("{}", dashboard.colors().get_random_color(predefined));
        }
        Command::OpenPlan {
            project_id,
            action,
            open_folders,
        } => {
            let Some(project) = projects.get_project(&project_id)? else {
                println!("project {project_id} not found");
                return Ok(());
            };
            let plan = resolve_open_plan(&project, action.into(), &open_folders)?;
            print_json(&plan)?;
        }
        Command::Export { path } => {
            projects.export_manual_edit_document(&path)?;
            println!("{}", path.display());
        }
        Command::Import { path } => {
            let document = fs::read_to_string(&path).map_err(|error| {
                DashboardError::path(format!("Failed to read {}: {error}", path.display()))
            })?;
            let groups = projects.apply_manual_edit_document(&document)?;
            println!("imported {} groups", groups.len());
        }
    }

    Ok(())
}

fn print_json(value: &impl Serialize) -> DashboardResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| DashboardError::storage(format!("Failed to serialize output: {error}")))?;
    println!("{rendered}");
    Ok(())
}
