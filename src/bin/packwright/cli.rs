//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use packwright::core::InstallerKind;

/// Packwright - compile declarative installer manifests
#[derive(Parser)]
#[command(name = "packwright")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile an installation manifest and report what it contains
    Compile(CompileArgs),

    /// List the files a fileset selection would pick up
    Scan(ScanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Installer flavour, as accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    Standard,
    Web,
}

impl From<KindArg> for InstallerKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Standard => InstallerKind::Standard,
            KindArg::Web => InstallerKind::Web,
        }
    }
}

#[derive(Args)]
pub struct CompileArgs {
    /// Path to the installation manifest
    pub manifest: PathBuf,

    /// Base directory for relative paths (defaults to the manifest's directory)
    #[arg(short, long)]
    pub base_dir: Option<PathBuf>,

    /// Installer kind (overrides the config file)
    #[arg(short, long, value_enum)]
    pub kind: Option<KindArg>,

    /// Installation home holding built-in resources
    #[arg(long, env = "PACKWRIGHT_HOME")]
    pub home: Option<PathBuf>,

    /// Write the compiled model as JSON to a file, or `-` for stdout
    #[arg(long, value_name = "PATH")]
    pub emit_json: Option<PathBuf>,

    /// Treat warnings as errors
    #[arg(long)]
    pub deny_warnings: bool,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Directory to scan
    pub dir: PathBuf,

    /// Include pattern (repeatable; defaults to everything)
    #[arg(short, long)]
    pub include: Vec<String>,

    /// Exclude pattern (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Do not apply the built-in VCS and editor excludes
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Match patterns case-insensitively
    #[arg(long)]
    pub case_insensitive: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
