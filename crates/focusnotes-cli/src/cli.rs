use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use focusnotes_core::editor::SaveMode;
use focusnotes_core::FolderId;

#[derive(Parser)]
#[command(name = "focusnotes")]
#[command(about = "Folder-grouped notes synced to your FocusNotes account")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name for backend and session configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Register, sign in, or sign out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// List notes grouped by folder
    #[command(alias = "ls")]
    List {
        /// Only show this folder
        #[arg(short, long, value_name = "ID")]
        folder: Option<FolderId>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a note
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Folder the note belongs to
        #[arg(short, long, value_name = "ID")]
        folder: FolderId,
        /// Note title
        #[arg(short, long)]
        title: String,
        /// Note content (stdin when piped, empty otherwise)
        content: Vec<String>,
    },
    /// Edit a note in $EDITOR
    Edit {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Stream stdin lines into a note, saving as you type
    Write {
        /// Note ID or unique ID prefix
        id: String,
        /// When edits are sent to the backend
        #[arg(long, value_enum, default_value_t = SaveModeArg::Debounced)]
        save_mode: SaveModeArg,
        /// Idle time before a debounced save
        #[arg(long, value_name = "MS", default_value_t = 2000)]
        debounce_ms: u64,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SaveModeArg {
    Manual,
    Immediate,
    Debounced,
}

impl SaveModeArg {
    pub const fn into_save_mode(self, debounce_ms: u64) -> SaveMode {
        match self {
            Self::Manual => SaveMode::Manual,
            Self::Immediate => SaveMode::Immediate,
            Self::Debounced => SaveMode::Debounced(Duration::from_millis(debounce_ms)),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Backend API endpoint
        #[arg(long, value_name = "URL")]
        endpoint: Option<String>,
        /// Backend project id
        #[arg(long, value_name = "ID")]
        project_id: Option<String>,
        /// Platform identifier sent with every request
        #[arg(long, value_name = "NAME")]
        platform: Option<String>,
        /// Database holding the notes collection
        #[arg(long, value_name = "ID")]
        database_id: Option<String>,
        /// Notes collection id
        #[arg(long, value_name = "ID")]
        collection_id: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved backend config for a profile
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Create an account and sign in
    Register {
        /// Display name
        #[arg(long)]
        name: String,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Show who the profile is signed in as
    Status,
    /// Sign out and clear the stored session
    Logout,
}
