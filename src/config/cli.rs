//! Command-line surface of the `collabdesk` console.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the collabdesk binary.
#[derive(Debug, Parser)]
#[command(
    name = "collabdesk",
    version,
    about = "Administrative console for the research collaboration platform"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "COLLABDESK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the admin API base URL.
    #[arg(long = "api-base-url", global = true, value_name = "URL")]
    pub api_base_url: Option<String>,

    /// Read the bearer token from this file instead of the configuration.
    #[arg(
        long = "api-token-file",
        global = true,
        env = "COLLABDESK_API_TOKEN_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub api_token_file: Option<PathBuf>,

    /// Override the request timeout.
    #[arg(long = "api-timeout-seconds", global = true, value_name = "SECONDS")]
    pub api_timeout_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        global = true,
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Serve every request from a JSON fixture instead of the platform.
    #[arg(long = "fixtures", global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub fixtures: Option<PathBuf>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Blog moderation.
    Blogs(BlogsArgs),
    /// Research project moderation.
    Projects(ProjectsArgs),
    /// Community resources: projects without an assigned instructor.
    Resources(ResourcesArgs),
    /// User account management.
    Users(UsersArgs),
    /// Partner institutions (read only).
    Institutions(ReadOnlyArgs),
    /// Platform events (read only).
    Events(ReadOnlyArgs),
    /// Q&A threads (read only).
    Threads(ReadOnlyArgs),
    /// Bulk onboarding of instructors and students.
    #[command(name = "bulk-import")]
    BulkImport(BulkImportArgs),
}

/// Filters and paging shared by every `list` subcommand.
#[derive(Debug, Args, Clone, Default)]
pub struct ListArgs {
    /// Case-insensitive text search.
    #[arg(long)]
    pub search: Option<String>,

    /// Status key, or `all`.
    #[arg(long)]
    pub status: Option<String>,

    /// Exact category, type or role.
    #[arg(long)]
    pub category: Option<String>,

    /// as_fetched|newest|oldest|title
    #[arg(long)]
    pub sort: Option<String>,

    /// 1-based page to show.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Rows per page; defaults to `listing.page_size`.
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Print the page as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Target and confirmation input of a row action.
#[derive(Debug, Args, Clone)]
pub struct ActionArgs {
    #[arg(long)]
    pub id: Uuid,

    /// Reason recorded with the action; at least 20 characters for deletions.
    #[arg(long)]
    pub reason: Option<String>,

    /// Confirmation phrase; deletions require `PERMANENTLY DELETE`.
    #[arg(long = "confirm", value_name = "PHRASE")]
    pub confirm: Option<String>,

    /// Optional note for non-destructive actions.
    #[arg(long)]
    pub message: Option<String>,
}

/// Row addressed by `show`.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[arg(long)]
    pub id: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct BlogsArgs {
    #[command(subcommand)]
    pub action: BlogsCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum BlogsCmd {
    /// List blogs with optional filters
    List(ListArgs),
    /// Show every field of one row
    Show(ShowArgs),
    Publish(ActionArgs),
    Unpublish(ActionArgs),
    Archive(ActionArgs),
    /// Permanently delete a blog
    Delete(ActionArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub action: ProjectsCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ProjectsCmd {
    /// List projects with optional filters
    List(ListArgs),
    /// Show every field of one row
    Show(ShowArgs),
    Activate(ActionArgs),
    Deactivate(ActionArgs),
    /// Permanently delete a project
    Delete(ActionArgs),
    /// Update project fields and attachments
    Update(Box<ProjectUpdateArgs>),
}

#[derive(Debug, Args, Clone)]
pub struct ResourcesArgs {
    #[command(subcommand)]
    pub action: ResourcesCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ResourcesCmd {
    /// List community resources with optional filters
    List(ListArgs),
    /// Show every field of one row
    Show(ShowArgs),
    Activate(ActionArgs),
    Deactivate(ActionArgs),
    Delete(ActionArgs),
}

#[derive(Debug, Args, Clone)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub action: UsersCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum UsersCmd {
    /// List users; `--category` filters by role
    List(ListArgs),
    /// Show every field of one row
    Show(ShowArgs),
    Activate(ActionArgs),
    Deactivate(ActionArgs),
}

#[derive(Debug, Args, Clone)]
pub struct ReadOnlyArgs {
    #[command(subcommand)]
    pub action: ReadOnlyCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ReadOnlyCmd {
    List(ListArgs),
    /// Show every field of one row
    Show(ShowArgs),
}

#[derive(Debug, Args, Clone, Default)]
pub struct ProjectUpdateArgs {
    #[arg(long)]
    pub id: Uuid,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long = "abstract")]
    pub abstract_text: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// pending|active|inactive|completed
    #[arg(long)]
    pub status: Option<String>,

    /// Replacement logo image.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub logo: Option<PathBuf>,

    /// Project file to attach; repeatable.
    #[arg(long = "file", value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BulkImportArgs {
    #[command(subcommand)]
    pub action: BulkImportCmd,
}

#[derive(Debug, Subcommand, Clone)]
pub enum BulkImportCmd {
    /// Parse a roster spreadsheet and print the extracted rows
    Parse {
        #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Validate a roster and start bulk creation
    Submit {
        /// Roster spreadsheet (xlsx, xls or csv).
        #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "roster")]
        file: Option<PathBuf>,

        /// Roster as JSON (`{"instructors": [...], "students": [...]}`).
        #[arg(long, value_hint = ValueHint::FilePath)]
        roster: Option<PathBuf>,

        /// Poll until the job finishes.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
    /// Show the status of a bulk creation job
    Status {
        #[arg(long)]
        id: Uuid,

        /// Poll until the job finishes.
        #[arg(long, default_value_t = false)]
        watch: bool,
    },
}

impl Command {
    /// Page size requested on the command line, if any.
    pub fn page_size_override(&self) -> Option<usize> {
        let list = match self {
            Command::Blogs(BlogsArgs {
                action: BlogsCmd::List(list),
            })
            | Command::Projects(ProjectsArgs {
                action: ProjectsCmd::List(list),
            })
            | Command::Resources(ResourcesArgs {
                action: ResourcesCmd::List(list),
            })
            | Command::Users(UsersArgs {
                action: UsersCmd::List(list),
            })
            | Command::Institutions(ReadOnlyArgs {
                action: ReadOnlyCmd::List(list),
            })
            | Command::Events(ReadOnlyArgs {
                action: ReadOnlyCmd::List(list),
            })
            | Command::Threads(ReadOnlyArgs {
                action: ReadOnlyCmd::List(list),
            }) => list,
            _ => return None,
        };
        list.page_size
    }
}
