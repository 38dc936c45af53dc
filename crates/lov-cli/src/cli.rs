use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lov",
    about = "Localization overlay: keep translation edits across upstream updates",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (defaults to ./lov.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Workshop directory, overriding the configuration
    #[arg(long, global = true)]
    pub workshop: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List workshop documents and whether they carry edits
    List(ListArgs),
    /// Show stored edits, for one document or all of them
    Show(ShowArgs),
    /// Compute the sparse diff between two JSON files
    Diff(DiffArgs),
    /// Store an edited document as a diff against its original
    Save(SaveArgs),
    /// Discard all stored edits of a document
    Reset(ResetArgs),
    /// Apply a diff to a JSON file
    Apply(ApplyArgs),
    /// Show how stored edits change a workshop document
    Preview(PreviewArgs),
    /// Apply every stored edit to a directory of upstream documents
    Replay(ReplayArgs),
}

#[derive(Args)]
pub struct ListArgs {}

#[derive(Args)]
pub struct ShowArgs {
    pub path: Option<String>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub original: PathBuf,
    pub edited: PathBuf,
}

#[derive(Args)]
pub struct SaveArgs {
    /// Document path relative to the workshop directory
    pub path: String,
    /// File holding the edited document
    pub edited: PathBuf,
}

#[derive(Args)]
pub struct ResetArgs {
    pub path: String,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Upstream document to patch
    pub base: PathBuf,
    /// Use the stored edit of this workshop document
    #[arg(long, conflicts_with = "diff", required_unless_present = "diff")]
    pub path: Option<String>,
    /// Use the diff in this file
    #[arg(long)]
    pub diff: Option<PathBuf>,
    /// Write the patched document here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct PreviewArgs {
    pub path: String,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Target directory, overriding `target_dir` from the configuration
    #[arg(long)]
    pub target: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["lov", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List(_)));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_show_all() {
        let cli = Cli::try_parse_from(["lov", "show"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert!(args.path.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_save() {
        let cli = Cli::try_parse_from(["lov", "save", "LLC/Skills.json", "edited.json"]).unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.path, "LLC/Skills.json");
            assert_eq!(args.edited, PathBuf::from("edited.json"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_apply_with_stored_edit() {
        let cli = Cli::try_parse_from(["lov", "apply", "base.json", "--path", "a.json", "-o", "out.json"]).unwrap();
        if let Command::Apply(args) = cli.command {
            assert_eq!(args.path, Some("a.json".into()));
            assert!(args.diff.is_none());
            assert_eq!(args.output, Some(PathBuf::from("out.json")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_apply_requires_a_source() {
        assert!(Cli::try_parse_from(["lov", "apply", "base.json"]).is_err());
        assert!(Cli::try_parse_from(["lov", "apply", "base.json", "--path", "a", "--diff", "d.json"]).is_err());
    }

    #[test]
    fn parse_replay_target() {
        let cli = Cli::try_parse_from(["lov", "replay", "--target", "/game/Lang"]).unwrap();
        if let Command::Replay(args) = cli.command {
            assert_eq!(args.target, Some(PathBuf::from("/game/Lang")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_globals() {
        let cli = Cli::try_parse_from([
            "lov", "--verbose", "--workshop", "w", "--config", "c.toml", "list", "--format", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.workshop, Some(PathBuf::from("w")));
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn parse_diff_needs_two_files() {
        assert!(Cli::try_parse_from(["lov", "diff", "a.json"]).is_err());
        assert!(matches!(
            Cli::try_parse_from(["lov", "diff", "a.json", "b.json"]).unwrap().command,
            Command::Diff(_)
        ));
    }
}
