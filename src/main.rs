use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use named_range_renamer::config::{load_from_path, SheetsApi};
use named_range_renamer::functions::{NamedFunctionService, SheetsApiClient};
use named_range_renamer::inventory::list_formulas;
use named_range_renamer::surface::SurfaceKind;
use named_range_renamer::workbook::Workbook;
use named_range_renamer::{Renamer, Report, Token};
use similar::{ChangeTag, TextDiff};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "named-range-renamer")]
#[command(
    about = "Rename a named range everywhere its name appears in a workbook's formulas",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RenameArgs {
    /// Workbook snapshot (JSON)
    #[arg(short, long)]
    workbook: PathBuf,

    /// Name to replace
    #[arg(long, requires = "new", conflicts_with = "plan")]
    old: Option<String>,

    /// Replacement name
    #[arg(long, requires = "old", conflicts_with = "plan")]
    new: Option<String>,

    /// TOML rename plan instead of --old/--new
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// Also rewrite named-function bodies
    #[arg(long)]
    named_functions: bool,

    /// Show a diff for every rewritten formula
    #[arg(short, long)]
    diff: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a rename would change without touching the workbook
    Preview {
        #[command(flatten)]
        args: RenameArgs,
    },

    /// Rewrite every reference and save the workbook
    Apply {
        #[command(flatten)]
        args: RenameArgs,

        /// Rename the named range object too (never overwrites an existing name)
        #[arg(long)]
        rename_object: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List formula cells, optionally only those that use a name
    List {
        /// Workbook snapshot (JSON)
        #[arg(short, long)]
        workbook: PathBuf,

        /// Only formulas referencing this name
        #[arg(short, long)]
        token: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let failed = match cli.command {
        Commands::Preview { args } => cmd_preview(args)?,
        Commands::Apply {
            args,
            rename_object,
            yes,
        } => cmd_apply(args, rename_object, yes)?,
        Commands::List { workbook, token } => cmd_list(&workbook, token.as_deref())?,
    };

    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Everything one invocation needs, merged from flags and an optional plan.
struct Job {
    renames: Vec<(String, String)>,
    named_functions: bool,
    rename_object: bool,
    sheets_api: Option<SheetsApi>,
}

fn resolve_job(args: &RenameArgs, rename_object: bool) -> Result<Job> {
    if let Some(plan_path) = &args.plan {
        let plan = load_from_path(plan_path)?;
        if !plan.meta.name.is_empty() {
            println!("{}", format!("Plan: {}", plan.meta.name).dimmed());
        }
        return Ok(Job {
            renames: plan
                .renames
                .into_iter()
                .map(|rename| (rename.old, rename.new))
                .collect(),
            named_functions: args.named_functions || plan.options.named_functions,
            rename_object: rename_object || plan.options.rename_object,
            sheets_api: plan.sheets_api,
        });
    }

    match (&args.old, &args.new) {
        (Some(old), Some(new)) => Ok(Job {
            renames: vec![(old.clone(), new.clone())],
            named_functions: args.named_functions,
            rename_object,
            sheets_api: None,
        }),
        _ => anyhow::bail!("either --plan or both --old and --new are required"),
    }
}

fn load_workbook(path: &Path) -> Result<Workbook> {
    let workbook = Workbook::load(path)?;
    println!("Workbook: {}", path.display());
    Ok(workbook)
}

fn remote_client(api: &SheetsApi) -> Result<SheetsApiClient> {
    SheetsApiClient::from_env(&api.endpoint, &api.spreadsheet_id, &api.token_env)
        .with_context(|| format!("failed to set up named functions for {}", api.spreadsheet_id))
}

/// Run every rename of the job against the workbook.
///
/// Named functions come from the remote backend when the plan names one,
/// otherwise from the functions stored in the snapshot.
fn run_job(workbook: &mut Workbook, job: &Job, apply: bool) -> Result<Vec<Report>> {
    let mut remote = match (&job.sheets_api, job.named_functions) {
        (Some(api), true) => Some(remote_client(api)?),
        _ => None,
    };

    let mut reports = Vec::with_capacity(job.renames.len());
    for (old, new) in &job.renames {
        let Workbook {
            document,
            named_functions,
        } = &mut *workbook;
        let mut renamer = Renamer::new(document);
        if job.named_functions {
            let service: &mut dyn NamedFunctionService = match remote.as_mut() {
                Some(client) => client,
                None => named_functions,
            };
            renamer = renamer.with_named_functions(service);
        }

        let report = if apply {
            renamer.apply(old, new, job.rename_object)?
        } else {
            renamer.preview(old, new)?
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Helper: show a before/after diff for one rewritten formula
fn display_diff(label: &str, before: &str, after: &str) {
    println!("\n{}", format!("--- {label} (before)").dimmed());
    println!("{}", format!("+++ {label} (after)").dimmed());

    let diff = TextDiff::from_lines(before, after);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", line);
        if change.missing_newline() {
            println!();
        }
    }
}

fn print_report(report: &Report, show_diff: bool) {
    println!();
    println!("{report}");

    if show_diff {
        for (sheet, kind, change) in report.changes() {
            let label = match (sheet, kind) {
                (Some(sheet), _) => format!("{sheet}!{}", change.location),
                (None, SurfaceKind::NamedFunction) => change.location.to_string(),
                (None, kind) => format!("{kind}: {}", change.location),
            };
            display_diff(&label, &change.before, &change.after);
        }
    }
}

fn print_summary(reports: &[Report]) -> bool {
    let changed: usize = reports.iter().map(|report| report.totals().total()).sum();
    let failed = reports.iter().filter(|report| report.has_failures()).count();
    let applied = reports.iter().any(|report| report.mode().is_apply());

    println!();
    println!("{}", "Summary:".bold());
    if applied {
        println!("  {} {} change(s) applied", "✓".green(), changed);
    } else {
        println!("  {} {} change(s) would be applied", "⊙".yellow(), changed);
    }
    if failed > 0 {
        eprintln!(
            "  {} {} rename(s) reported failures",
            "✗".red(),
            format!("{}", failed).red()
        );
    }
    failed > 0
}

fn cmd_preview(args: RenameArgs) -> Result<bool> {
    let job = resolve_job(&args, false)?;
    let mut workbook = load_workbook(&args.workbook)?;

    let reports = run_job(&mut workbook, &job, false)?;
    for report in &reports {
        print_report(report, args.diff);
    }
    Ok(print_summary(&reports))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}

fn cmd_apply(args: RenameArgs, rename_object: bool, yes: bool) -> Result<bool> {
    let job = resolve_job(&args, rename_object)?;
    let mut workbook = load_workbook(&args.workbook)?;

    if !yes {
        // Preview against a scratch copy so the prompt shows exactly what apply will do.
        let mut scratch = workbook.clone();
        for report in run_job(&mut scratch, &job, false)? {
            print_report(&report, args.diff);
        }
        println!();
        if !confirm("Apply these changes?")? {
            println!("{} Cancelled; nothing was changed.", "⊘".cyan());
            return Ok(false);
        }
    }

    let reports = run_job(&mut workbook, &job, true)?;
    for report in &reports {
        print_report(report, args.diff && yes);
    }

    workbook
        .save(&args.workbook)
        .with_context(|| format!("failed to save {}", args.workbook.display()))?;
    println!(
        "{}",
        format!("Saved {}", args.workbook.display()).dimmed()
    );

    Ok(print_summary(&reports))
}

fn cmd_list(path: &Path, token: Option<&str>) -> Result<bool> {
    let mut workbook = load_workbook(path)?;
    let filter = token.map(Token::lookup).transpose()?;

    let inventory = list_formulas(&mut workbook.document, filter.as_ref())?;
    for entry in &inventory.entries {
        println!("{entry}");
    }
    for (sheet, err) in &inventory.errors {
        eprintln!("{} {}: {}", "✗".red(), sheet, err);
    }

    println!();
    println!(
        "{} {} formula(s)",
        "✓".green(),
        format!("{}", inventory.entries.len()).bold()
    );
    Ok(!inventory.errors.is_empty())
}
