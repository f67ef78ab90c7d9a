//! CLI module for GLIMPS
//!
//! Command-line parsing for the `glimps` binary. Uses clap for argument
//! parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use crate::types::{JobStatus, MoleculeType};
use crate::viewer::StructureFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// GLIMPS - molecular backmapping platform client
#[derive(Parser, Debug)]
#[command(
    name = "glimps",
    version,
    about = "GLIMPS - molecular backmapping platform client",
    long_about = "Manage projects, molecules, GLIMPS models and jobs on a GLIMPS backend,\n\
                  and export 3D structure views as standalone HTML pages.",
    after_help = "EXAMPLES:\n    \
                  glimps login --email ada@example.com\n    \
                  glimps projects list\n    \
                  glimps molecules upload --project <ID> lysozyme.pdb\n    \
                  glimps models train <MODEL> --cg <CG_ID> --atomistic <AA_ID>\n    \
                  glimps jobs watch --project <ID>\n    \
                  glimps molecules view <ID> -o lysozyme.html"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "glimps.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "GLIMPS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,

        #[arg(long)]
        full_name: String,

        /// Prompted for when omitted
        #[arg(short, long, env = "GLIMPS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Project, model and job overview
    Dashboard,

    /// Show the effective configuration
    Config {
        /// Only check that the configuration is valid
        #[arg(long)]
        validate: bool,
    },

    /// Render a local file or remote URL to an HTML viewer page
    View(ViewArgs),

    /// Manage projects
    #[command(subcommand)]
    Projects(ProjectCommands),

    /// Manage molecules
    #[command(subcommand)]
    Molecules(MoleculeCommands),

    /// Manage GLIMPS models
    #[command(subcommand)]
    Models(ModelCommands),

    /// Inspect and control jobs
    #[command(subcommand)]
    Jobs(JobCommands),
}

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Structure file path or http(s) URL
    pub source: String,

    /// Structure format (defaults to the file extension, then pdb)
    #[arg(short, long)]
    pub format: Option<StructureFormat>,

    /// Molecule type, selects the drawing style
    #[arg(short = 't', long = "type")]
    pub molecule_type: Option<MoleculeType>,

    #[command(flatten)]
    pub page: PageArgs,
}

/// Options for exported viewer pages.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Output HTML file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Embed 3Dmol.js in the page instead of loading it at view time
    #[arg(long)]
    pub inline: bool,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    List {
        #[arg(long, default_value_t = 50)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    Show {
        id: String,
    },

    Create {
        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Rename or re-describe a project
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum MoleculeCommands {
    List {
        #[arg(short, long)]
        project: String,

        #[arg(long, default_value_t = 100)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    Show {
        id: String,
    },

    /// Upload a structure file (pdb, gro, xtc, dcd, mol2, xyz)
    Upload {
        #[arg(short, long)]
        project: String,

        file: PathBuf,

        /// Defaults to the file name
        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short = 't', long = "type", default_value = "atomistic")]
        molecule_type: MoleculeType,
    },

    Delete {
        id: String,

        #[arg(short, long)]
        yes: bool,
    },

    /// Save the structure file
    Download {
        id: String,

        /// Target directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Export the molecule as an HTML viewer page
    View {
        id: String,

        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModelCommands {
    List {
        #[arg(short, long)]
        project: String,

        #[arg(long, default_value_t = 100)]
        limit: u32,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    Show {
        id: String,
    },

    Create {
        #[arg(short, long)]
        project: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Train on a coarse-grained / atomistic molecule pair
    Train {
        id: String,

        /// Coarse-grained molecule id
        #[arg(long)]
        cg: String,

        /// Atomistic molecule id
        #[arg(long)]
        atomistic: String,

        #[arg(long)]
        pca: bool,

        #[arg(long)]
        no_refine: bool,

        #[arg(long)]
        no_shave: bool,

        #[arg(long)]
        triangulate: bool,
    },

    /// Backmap a coarse-grained molecule
    Infer {
        id: String,

        /// Coarse-grained input molecule id
        #[arg(short, long)]
        input: String,
    },

    Delete {
        id: String,

        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct JobFilterArgs {
    #[arg(short, long)]
    pub project: Option<String>,

    #[arg(short, long)]
    pub status: Option<JobStatus>,

    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum JobCommands {
    List {
        #[command(flatten)]
        filter: JobFilterArgs,
    },

    Show {
        id: String,
    },

    Cancel {
        id: String,
    },

    /// Follow jobs until interrupted
    Watch {
        #[command(flatten)]
        filter: JobFilterArgs,

        /// Exit once every listed job has finished
        #[arg(long)]
        until_done: bool,
    },

    /// Save an inference result
    Download {
        id: String,

        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Turn an inference result into a backmapped molecule
    CreateMolecule {
        id: String,

        #[arg(short, long)]
        name: Option<String>,
    },
}

impl Commands {
    /// Page the command corresponds to, for the route guard.
    ///
    /// `None` for commands that work without a session.
    pub fn route(&self) -> Option<&'static str> {
        match self {
            Commands::Login { .. } => Some("/login"),
            Commands::Register { .. } => Some("/register"),
            Commands::Logout | Commands::Config { .. } | Commands::View(_) => None,
            Commands::Whoami => Some("/settings"),
            Commands::Dashboard => Some("/dashboard"),
            Commands::Projects(_) | Commands::Molecules(_) | Commands::Models(_) => {
                Some("/projects")
            }
            Commands::Jobs(_) => Some("/jobs"),
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_view() {
        let cli = Cli::try_parse_from([
            "glimps", "view", "protein.gro", "--type", "cg", "--inline", "-o", "out.html",
        ])
        .unwrap();
        match cli.command {
            Commands::View(args) => {
                assert_eq!(args.source, "protein.gro");
                assert_eq!(args.molecule_type, Some(MoleculeType::CoarseGrained));
                assert!(args.page.inline);
                assert_eq!(args.page.output, Some(PathBuf::from("out.html")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_routes() {
        let cli = Cli::try_parse_from(["glimps", "jobs", "list", "--status", "running"]).unwrap();
        assert_eq!(cli.command.route(), Some("/jobs"));
        if let Commands::Jobs(JobCommands::List { filter }) = cli.command {
            assert_eq!(filter.status, Some(JobStatus::Running));
        }

        let cli = Cli::try_parse_from(["glimps", "logout"]).unwrap();
        assert_eq!(cli.command.route(), None);
    }
}
