//! kb-audit CLI: dataset-consistency reports for the object/scene/task catalog.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use kb_audit::config::AuditConfig;
use kb_audit::engine::Engine;
use kb_audit::report;
use kb_audit::state::State;

#[derive(Parser)]
#[command(name = "kb-audit", version, about = "Dataset-consistency engine for task feasibility")]
struct Cli {
    /// Path to the audit configuration (TOML).
    #[arg(long, short, global = true, default_value = "kb-audit.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every input and print a summary.
    Check,

    /// List tasks with their states.
    Tasks {
        /// Only show tasks in this state.
        #[arg(long, value_enum)]
        state: Option<State>,
    },

    /// Show one task in detail, including per-scene matching.
    Task {
        /// Task name (`<activity>-<instance>`).
        name: String,
    },

    /// List concepts with their states.
    Concepts {
        /// Only show concepts in this state.
        #[arg(long, value_enum)]
        state: Option<State>,
    },

    /// Show one concept in detail.
    Concept {
        /// Concept name, e.g. `apple.n.01`.
        name: String,
    },

    /// Show one scene with its rooms and supported tasks.
    Scene {
        /// Scene name, e.g. `Rs_int`.
        name: String,
    },

    /// Show one object model and where it is placed.
    Object {
        /// Object name (`<category>-<model-id>`).
        name: String,
    },

    /// Print the data-quality lists.
    Quality,

    /// Export data as JSON on stdout.
    Export {
        #[command(subcommand)]
        action: ExportAction,
    },
}

#[derive(Subcommand)]
enum ExportAction {
    /// Every task with states and scene lists.
    Tasks,
    /// Every registered concept.
    Concepts,
    /// Concepts outside the concept graph.
    Illegal,
    /// Required concepts without ready objects.
    Missing,
    /// Task × scene matching table.
    TaskScenes,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AuditConfig::load(&cli.config)?;
    let engine = Engine::load(config)?;
    let snapshot = engine.snapshot();

    match cli.command {
        Commands::Check => {
            println!("{}", engine.info());
        }

        Commands::Tasks { state } => {
            let names: Vec<String> = match state {
                Some(state) => snapshot
                    .tasks_in_state(state)
                    .into_iter()
                    .map(|t| t.name.clone())
                    .collect(),
                None => snapshot.kb().tasks().map(|t| t.name.clone()).collect(),
            };
            for task in names.iter().filter_map(|n| report::task_export(&snapshot, n)) {
                println!(
                    "{:<10} synsets={:<10} scenes={:<10} {}",
                    task.state, task.synset_state, task.scene_state, task.name
                );
            }
        }

        Commands::Task { name } => match report::task_export(&snapshot, &name) {
            Some(task) => {
                println!("{} [{}]", task.name, task.state);
                println!("  synset state: {}", task.synset_state);
                println!("  scene state:  {}", task.scene_state);
                println!("  concepts:     {}", task.concepts.join(", "));
                if !task.problem_concepts.is_empty() {
                    println!("  problems:     {}", task.problem_concepts.join(", "));
                }
                if !task.substance_concepts.is_empty() {
                    println!("  substances:   {}", task.substance_concepts.join(", "));
                }
                if let Some(loaded) = snapshot.task(&name) {
                    for requirement in &loaded.room_requirements {
                        let wanted: Vec<String> = requirement
                            .concepts
                            .iter()
                            .map(|c| format!("{} {}", c.count, c.concept))
                            .collect();
                        println!(
                            "  in {}: {} objects ({})",
                            requirement.room_type,
                            requirement.total(),
                            wanted.join(", ")
                        );
                    }
                }
                for (scene, m) in snapshot.scene_matching(&name) {
                    if m.matched_ready {
                        println!("  {scene}: matched");
                    } else if m.matched_planned {
                        println!("  {scene}: planned ({})", m.reason_ready);
                    } else {
                        println!("  {scene}: unmatched ({})", m.reason_planned);
                    }
                }
            }
            None => println!("no task named {name}"),
        },

        Commands::Concepts { state } => {
            for concept in snapshot.kb().concepts() {
                let current = snapshot.concept_state(&concept.name);
                if state.is_some_and(|s| s != current) {
                    continue;
                }
                println!("{:<10} {}", current, concept.name);
            }
        }

        Commands::Concept { name } => match report::concept_export(&snapshot, &name) {
            Some(c) => {
                println!("{} [{}]", c.name, c.state);
                if !c.definition.is_empty() {
                    println!("  {}", c.definition);
                }
                println!("  custom:    {}", c.is_custom);
                println!("  substance: {}", c.is_substance);
                println!("  parents:   {}", c.parents.join(", "));
                println!("  children:  {}", c.children.join(", "));
                println!(
                    "  objects:   {} ({} ready)",
                    c.matching_objects.len(),
                    c.matching_ready_objects.len()
                );
                println!("  used in:   {}", c.required_by.join(", "));
            }
            None => println!("no concept named {name}"),
        },

        Commands::Scene { name } => match report::scene_export(&snapshot, &name) {
            Some(scene) => {
                println!("{}", scene.name);
                for room in &scene.rooms {
                    println!("  {} [{}] {}", room.name, room.tier, room.room_type);
                    for (asset, count) in &room.objects {
                        println!("    {count} x {asset}");
                    }
                }
                println!("  matched tasks: {}", scene.matched_tasks.join(", "));
                println!("  planned tasks: {}", scene.planned_tasks.join(", "));
            }
            None => println!("no scene named {name}"),
        },

        Commands::Object { name } => match report::asset_export(&snapshot, &name) {
            Some(asset) => {
                println!("{} [{}]", asset.name, asset.state);
                if asset.original_name != asset.name {
                    println!("  renamed from: {}", asset.original_name);
                }
                println!("  category: {}", asset.category);
                println!("  concept:  {}", asset.concept.as_deref().unwrap_or("-"));
                for placement in &asset.placements {
                    println!("  in {placement}");
                }
            }
            None => println!("no object named {name}"),
        },

        Commands::Quality => {
            println!("illegal concepts:");
            for c in report::illegal_concepts(&snapshot) {
                println!("  {} (required by {})", c.name, c.required_by.join(", "));
            }
            println!("missing concepts:");
            for c in report::missing_concepts(&snapshot) {
                println!("  {} [{}] (required by {})", c.name, c.state, c.required_by.join(", "));
            }
            println!("non-leaf concepts with objects:");
            for c in report::non_leaf_categories(&snapshot) {
                println!("  {}", c.name);
            }
            println!("usage mismatches:");
            for m in report::usage_mismatches(&snapshot) {
                println!("  {}: {}", m.name, m.problem);
            }
            println!("warnings:");
            for w in snapshot.warnings() {
                println!("  {w}");
            }
        }

        Commands::Export { action } => match action {
            ExportAction::Tasks => print_json(&report::task_exports(&snapshot))?,
            ExportAction::Concepts => print_json(&report::concept_exports(&snapshot))?,
            ExportAction::Illegal => print_json(&report::illegal_concepts(&snapshot))?,
            ExportAction::Missing => print_json(&report::missing_concepts(&snapshot))?,
            ExportAction::TaskScenes => print_json(&report::task_scene_table(&snapshot))?,
        },
    }

    Ok(())
}
