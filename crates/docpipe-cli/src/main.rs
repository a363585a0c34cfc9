mod cmd;
mod interview;
mod output;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "docpipe",
    about = "Staged document pipeline — refine requirements, design architecture, emit specification and implementation stubs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .docpipe/ or .git/)
    #[arg(long, global = true, env = "DOCPIPE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize docpipe in the current project
    Init,

    /// Turn a feature description into docs/requirements/<slug>.md
    RefineRequirements {
        /// Feature name; the slug is derived from it
        name: String,

        /// Informal description (defaults to the feature name)
        #[arg(long)]
        description: Option<String>,

        /// Canned answer to the next clarifying question (repeatable)
        #[arg(long = "answer")]
        answers: Vec<String>,

        /// Skip clarifying questions; they land in Open Questions
        #[arg(long)]
        no_input: bool,

        /// Overwrite an existing document without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Derive docs/architecture/<slug>.md from the requirements document
    DesignArchitecture {
        slug: String,

        /// Never prompt
        #[arg(long)]
        no_input: bool,

        /// Overwrite an existing document without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Emit the specification bundle under docs/specifications/<slug>/
    Specify {
        slug: String,

        /// Never prompt
        #[arg(long)]
        no_input: bool,

        /// Regenerate an existing bundle without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Emit Kotlin source stubs for the bundle's interfaces and value types
    ImplementFunctional {
        slug: String,

        /// Never prompt
        #[arg(long)]
        no_input: bool,

        /// Overwrite existing stubs without asking
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Cross-stage completeness check (traceability, stubs, staleness)
    ReviewFunctional {
        /// Pipeline slug (omit to review every pipeline)
        slug: Option<String>,
    },

    /// Show pipeline state for the project or one slug
    Status {
        /// Pipeline slug (omit to list all pipelines)
        slug: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::RefineRequirements {
            name,
            description,
            answers,
            no_input,
            yes,
        } => cmd::refine::run(&root, &name, description, answers, no_input, yes, cli.json),
        Commands::DesignArchitecture {
            slug,
            no_input,
            yes,
        } => cmd::design::run(&root, &slug, no_input, yes, cli.json),
        Commands::Specify {
            slug,
            no_input,
            yes,
        } => cmd::specify::run(&root, &slug, no_input, yes, cli.json),
        Commands::ImplementFunctional {
            slug,
            no_input,
            yes,
        } => cmd::implement::run(&root, &slug, no_input, yes, cli.json),
        Commands::ReviewFunctional { slug } => cmd::review::run(&root, slug.as_deref(), cli.json),
        Commands::Status { slug } => cmd::status::run(&root, slug.as_deref(), cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
