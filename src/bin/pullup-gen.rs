//! CLI for the pullup-gen tool.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pullup_gen::model::outline::class_outline;
use pullup_gen::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pullup-gen")]
#[command(author, version, about = "Generifying pull-up refactorings for Java", long_about = None)]
struct Cli {
    /// Root of the Java source tree
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct MemberArgs {
    /// Method to pull up (repeatable)
    #[arg(short, long = "member")]
    members: Vec<String>,

    /// Interface of the implements clause to pull up (repeatable)
    #[arg(short, long = "implements")]
    interfaces: Vec<String>,

    /// Preview changes without keeping them
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the members of a class and whether each can be pulled up
    Members {
        /// Class whose members are listed
        class: String,

        /// Superclass or interface to analyze against
        #[arg(short, long)]
        target: String,
    },

    /// Show the generification plan for one method
    Plan {
        /// Class declaring the method
        class: String,

        /// Superclass or interface receiving the method
        #[arg(short, long)]
        target: String,

        /// Method name
        #[arg(short, long)]
        member: String,
    },

    /// Pull members up into an existing superclass or interface
    PullUp {
        /// Class whose members are pulled up
        class: String,

        /// Superclass or interface receiving the members
        #[arg(short, long)]
        target: String,

        /// Pull up every member that can be made abstract
        #[arg(long)]
        all: bool,

        #[command(flatten)]
        members: MemberArgs,
    },

    /// Create an abstract superclass shared by sister classes
    ExtractSuperclass {
        /// Class whose members are pulled up
        class: String,

        /// Name of the new superclass
        #[arg(short, long)]
        name: String,

        #[command(flatten)]
        members: MemberArgs,
    },

    /// Write a default configuration file
    InitConfig {
        /// Output path (.yaml, .yml or .json)
        #[arg(default_value = "pullup-gen.yaml")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Members { class, target } => {
            cmd_members(&cli.root, &class, &target, &config, cli.json)
        }
        Commands::Plan {
            class,
            target,
            member,
        } => cmd_plan(&cli.root, &class, &target, &member, &config, cli.json),
        Commands::PullUp {
            class,
            target,
            all,
            members,
        } => {
            let mut op = PullUpGeneric::new(target);
            for name in &members.members {
                op = op.method(name);
            }
            for interface in &members.interfaces {
                op = op.implements(interface);
            }
            if all {
                op = op.all_eligible();
            }
            cmd_run(&cli.root, &class, &op, config, members.dry_run, cli.json)
        }
        Commands::ExtractSuperclass {
            class,
            name,
            members,
        } => {
            let mut op = ExtractSuperclass::new(name);
            for name in &members.members {
                op = op.method(name);
            }
            for interface in &members.interfaces {
                op = op.implements(interface);
            }
            cmd_run(&cli.root, &class, &op, config, members.dry_run, cli.json)
        }
        Commands::InitConfig { path } => cmd_init_config(&path, &config),
    }
}

/// Log to stderr, filtered by `PULLUP_GEN_LOG` or else `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = match std::env::var("PULLUP_GEN_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GenerifyConfig> {
    let config = match path {
        Some(path) => GenerifyConfig::from_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => GenerifyConfig::default(),
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

fn cmd_members(
    root: &Path,
    class: &str,
    target: &str,
    config: &GenerifyConfig,
    json: bool,
) -> Result<()> {
    let ctx = RefactoringContext::load(root, class, config.clone())
        .context("Failed to load sources")?;
    let ws = &ctx.workspace;
    let target = ws.require_class(target)?;
    let scope = ctx.scope();

    let mut table = MemberTable::for_class(ws, ctx.source_class);
    table
        .refresh(ws, target, scope.as_deref())
        .context("Member analysis failed")?;

    if json {
        return print_json(table.rows());
    }

    println!("{} -> {}", ctx.source_name(), ws.class_name(target));
    for row in table.rows() {
        let verdict = match row.can_make_abstract {
            CanMakeAbstract::YesPlain => "abstract".to_string(),
            CanMakeAbstract::YesGenerics => "abstract (generic)".to_string(),
            CanMakeAbstract::No => match &row.failure {
                Some(failure) => format!("no: {failure}"),
                None => "no".to_string(),
            },
        };
        println!("  {:<40} {}", row.display, verdict);
    }
    Ok(())
}

fn cmd_plan(
    root: &Path,
    class: &str,
    target: &str,
    member: &str,
    config: &GenerifyConfig,
    json: bool,
) -> Result<()> {
    let ctx = RefactoringContext::load(root, class, config.clone())
        .context("Failed to load sources")?;
    let ws = &ctx.workspace;
    let target = ws.require_class(target)?;
    let method = ws.require_method(ctx.source_class, member)?;
    let scope = ctx.scope();

    let member_ref = MemberRef::Method { id: method };
    let coverage = compute_can_generify(ws, &member_ref, target, scope.as_deref())
        .with_context(|| format!("Cannot pull up {member}"))?;
    let plan = plan_generification(ws, method, &coverage, target, config)
        .with_context(|| format!("Cannot pull up {member}"))?;

    if json {
        return print_json(&plan);
    }
    println!("{}", plan.describe(ws));
    Ok(())
}

fn cmd_run(
    root: &Path,
    class: &str,
    operation: &dyn RefactoringOperation,
    config: GenerifyConfig,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let mut refactor = Refactor::in_dir(root).with_config(config);
    if dry_run {
        refactor = refactor.dry_run();
    }
    let result = refactor
        .run(class, operation)
        .with_context(|| format!("{} failed", operation.name()))?;

    if json {
        return print_json(&result.result);
    }

    if dry_run {
        println!("{}", result.colorized_diff());
    } else {
        for change in &result.changes {
            println!("// {}", change.path.display());
            print!("{}", class_outline(&result.workspace, change.class));
        }
    }
    for outcome in result.result.failures() {
        if let Some(failure) = outcome.failure() {
            eprintln!("skipped {}: {failure}", outcome.display);
        }
    }
    println!("\n{}", result.summary);

    if !result.result.success {
        bail!("{} member(s) could not be pulled up", result.result.failures().count());
    }
    Ok(())
}

fn cmd_init_config(path: &Path, config: &GenerifyConfig) -> Result<()> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let written = if is_json {
        config.to_json(path)
    } else {
        config.to_yaml(path)
    };
    written.with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
