use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use lov_diff::{PatchWarning, PreviewLine};
use lov_sdk::{read_json, write_json, SaveOutcome, Workshop, WorkshopConfig};
use lov_types::{to_pretty_json, DiffNode};
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let out = Output {
        format: cli.format,
        indent: config.indent,
    };
    debug!(workshop = %config.workshop_dir.display(), "configuration loaded");

    match cli.command {
        Command::List(_) => cmd_list(&open_workshop(config)?, &out),
        Command::Show(args) => cmd_show(&open_workshop(config)?, args, &out),
        Command::Diff(args) => cmd_diff(args, &out),
        Command::Save(args) => cmd_save(&open_workshop(config)?, args, &out),
        Command::Reset(args) => cmd_reset(&open_workshop(config)?, args, &out),
        Command::Apply(args) => cmd_apply(config, args, &out),
        Command::Preview(args) => cmd_preview(&open_workshop(config)?, args, &out),
        Command::Replay(args) => cmd_replay(&open_workshop(config)?, args, &out),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<WorkshopConfig> {
    let mut config = match &cli.config {
        Some(path) => WorkshopConfig::load(path)?,
        None => WorkshopConfig::discover(Path::new("."))?,
    };
    if let Some(dir) = &cli.workshop {
        config.workshop_dir = dir.clone();
    }
    Ok(config)
}

fn open_workshop(config: WorkshopConfig) -> anyhow::Result<Workshop> {
    let dir = config.workshop_dir.clone();
    Workshop::open(config).with_context(|| format!("cannot open workshop {}", dir.display()))
}

struct Output {
    format: OutputFormat,
    indent: usize,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    fn print_json(&self, value: &Value) -> anyhow::Result<()> {
        println!("{}", to_pretty_json(value, self.indent)?);
        Ok(())
    }
}

fn print_warnings(warnings: &[PatchWarning]) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
}

fn cmd_list(workshop: &Workshop, out: &Output) -> anyhow::Result<()> {
    let documents = workshop.list_documents()?;
    if out.json() {
        let list: Vec<Value> = documents
            .iter()
            .map(|d| json!({"path": d.path, "edited": d.edited}))
            .collect();
        return out.print_json(&Value::Array(list));
    }

    if documents.is_empty() {
        println!("No documents in {}.", workshop.config().workshop_dir.display());
        return Ok(());
    }
    for doc in &documents {
        if doc.edited {
            println!("  {} {}", "*".yellow().bold(), doc.path.bold());
        } else {
            println!("    {}", doc.path);
        }
    }
    let edited = documents.iter().filter(|d| d.edited).count();
    println!("\n{} documents, {} edited", documents.len(), edited.to_string().yellow());
    Ok(())
}

fn cmd_show(workshop: &Workshop, args: ShowArgs, out: &Output) -> anyhow::Result<()> {
    if let Some(path) = args.path {
        let Some(diff) = workshop.stored_diff(&path)? else {
            if out.json() {
                return out.print_json(&Value::Null);
            }
            println!("No edits stored for {}.", path.bold());
            return Ok(());
        };
        if !out.json() {
            println!("{} ({} changes)", path.bold(), diff.change_count().to_string().cyan());
        }
        return out.print_json(&diff.to_value());
    }

    let snapshot = workshop.store().snapshot()?;
    if out.json() {
        return out.print_json(&snapshot.to_value());
    }
    if snapshot.is_empty() {
        println!("No edits stored.");
        return Ok(());
    }
    for (path, diff) in snapshot.iter() {
        println!("  {}  {} changes", path.bold(), diff.change_count().to_string().cyan());
    }
    Ok(())
}

fn cmd_diff(args: DiffArgs, out: &Output) -> anyhow::Result<()> {
    let original = read_json(&args.original)?;
    let edited = read_json(&args.edited)?;
    match lov_diff::compute(&original, &edited)? {
        Some(diff) if !diff.is_empty() => out.print_json(&diff.to_value()),
        _ if out.json() => out.print_json(&json!({})),
        _ => {
            println!("No changes.");
            Ok(())
        }
    }
}

fn cmd_save(workshop: &Workshop, args: SaveArgs, out: &Output) -> anyhow::Result<()> {
    let original = workshop.load_base(&args.path)?;
    let edited = read_json(&args.edited)?;
    let outcome = workshop.save(&args.path, &original, &edited)?;

    if out.json() {
        let outcome = match outcome {
            SaveOutcome::Stored => "stored",
            SaveOutcome::Cleared => "cleared",
            SaveOutcome::Unchanged => "unchanged",
        };
        return out.print_json(&json!({"path": args.path, "outcome": outcome}));
    }
    match outcome {
        SaveOutcome::Stored => println!("{} Saved edits to {}", "✓".green().bold(), args.path.bold()),
        SaveOutcome::Cleared => println!("{} {} matches its original; edits cleared", "✓".green().bold(), args.path.bold()),
        SaveOutcome::Unchanged => println!("No changes to {}.", args.path.bold()),
    }
    Ok(())
}

fn cmd_reset(workshop: &Workshop, args: ResetArgs, out: &Output) -> anyhow::Result<()> {
    let removed = workshop.reset(&args.path)?;
    if out.json() {
        return out.print_json(&json!({"path": args.path, "reset": removed}));
    }
    if removed {
        println!("{} Discarded edits to {}", "✓".green().bold(), args.path.bold());
    } else {
        println!("No edits stored for {}.", args.path.bold());
    }
    Ok(())
}

fn cmd_apply(config: WorkshopConfig, args: ApplyArgs, out: &Output) -> anyhow::Result<()> {
    let base = read_json(&args.base)?;
    let diff = match (&args.path, &args.diff) {
        (_, Some(file)) => {
            let value = read_json(file)?;
            DiffNode::from_value(&value).with_context(|| format!("invalid diff in {}", file.display()))?
        }
        (Some(path), None) => match open_workshop(config)?.stored_diff(path)? {
            Some(diff) => diff,
            None => bail!("no edits stored for {path}"),
        },
        (None, None) => bail!("either --path or --diff is required"),
    };

    let patched = lov_diff::apply(&base, &diff);
    print_warnings(&patched.warnings);
    match &args.output {
        Some(output) => {
            write_json(output, &patched.value, out.indent)?;
            if !out.json() {
                println!(
                    "{} Wrote {} ({} warnings)",
                    "✓".green().bold(),
                    output.display().to_string().bold(),
                    patched.warnings.len()
                );
            }
            Ok(())
        }
        None => out.print_json(&patched.value),
    }
}

fn cmd_preview(workshop: &Workshop, args: PreviewArgs, out: &Output) -> anyhow::Result<()> {
    let session = workshop.open_document(&args.path)?;
    let preview = lov_diff::preview(&session.original, &session.current, out.indent)?;

    if out.json() {
        return out.print_json(&json!({
            "path": session.path,
            "additions": preview.additions(),
            "deletions": preview.deletions(),
            "hunks": preview.hunks.len(),
        }));
    }
    if preview.is_empty() {
        println!("No edits affect {}.", session.path.bold());
        return Ok(());
    }

    println!("{}", format!("--- {} (original)", session.path).bold());
    println!("{}", format!("+++ {} (edited)", session.path).bold());
    for hunk in &preview.hunks {
        let header = format!(
            "@@ -{},{} +{},{} @@",
            hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
        );
        println!("{}", header.cyan());
        for line in &hunk.lines {
            match line {
                PreviewLine::Context(text) => println!(" {text}"),
                PreviewLine::Added(text) => println!("{}", format!("+{text}").green()),
                PreviewLine::Removed(text) => println!("{}", format!("-{text}").red()),
            }
        }
    }
    println!(
        "\n{} additions, {} deletions",
        preview.additions().to_string().green(),
        preview.deletions().to_string().red()
    );
    Ok(())
}

fn cmd_replay(workshop: &Workshop, args: ReplayArgs, out: &Output) -> anyhow::Result<()> {
    let report = match args.target {
        Some(target) => workshop.replay_into(&target)?,
        None => workshop.replay()?,
    };

    if out.json() {
        let warnings: Vec<Value> = report
            .warnings
            .iter()
            .map(|w| json!({"path": w.path, "at": w.warning.path().to_string(), "message": w.warning.to_string()}))
            .collect();
        let failed: Vec<Value> = report
            .failed
            .iter()
            .map(|(path, reason)| json!({"path": path, "reason": reason}))
            .collect();
        return out.print_json(&json!({
            "applied": report.applied,
            "missing": report.missing,
            "failed": failed,
            "warnings": warnings,
        }));
    }

    for path in &report.applied {
        println!("  {} {}", "patched:".green(), path);
    }
    for path in &report.missing {
        println!("  {} {}", "missing:".yellow(), path);
    }
    for (path, reason) in &report.failed {
        println!("  {} {} ({})", "failed:".red(), path, reason);
    }
    for warning in &report.warnings {
        println!("  {} {}: {}", "drift:".yellow(), warning.path, warning.warning);
    }

    if report.is_clean() {
        println!("{} Replayed {} documents.", "✓".green().bold(), report.applied.len());
    } else {
        println!(
            "{} Replayed {} of {} documents with {} warnings.",
            "!".yellow().bold(),
            report.applied.len(),
            report.total(),
            report.warnings.len()
        );
    }
    Ok(())
}
