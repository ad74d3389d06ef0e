//! shapegraph CLI: load the ontology, infer, validate and inspect.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use shapegraph::config::ShapegraphConfig;
use shapegraph::federation::LoadSource;
use shapegraph::ontology::Ontology;
use shapegraph::persist::SparqlUpdateSink;
use shapegraph::projection;
use shapegraph::service::{ReportOutcome, Service};

#[derive(Parser)]
#[command(name = "shapegraph", version, about = "Ontology graph engine")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Ontology manifest (path or URL); overrides the config and ONTOLOGY_MANIFEST.
    #[arg(long, global = true)]
    manifest: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the ontology and print how it was loaded.
    Load,

    /// Derive new facts for a Turtle file and print the expanded graph.
    Infer {
        /// Turtle input file.
        #[arg(long)]
        file: PathBuf,
    },

    /// Validate a Turtle file against the ontology's shapes.
    Validate {
        /// Turtle input file.
        #[arg(long)]
        file: PathBuf,
    },

    /// Infer, then validate the expanded graph.
    Expand {
        /// Turtle input file.
        #[arg(long)]
        file: PathBuf,
    },

    /// Send a Turtle file to the configured graph store.
    Save {
        /// Turtle input file.
        #[arg(long)]
        file: PathBuf,
    },

    /// Print the input fields of every shape as JSON.
    Forms,

    /// Show ontology statistics.
    Stats,

    /// Look up the senses of a verb.
    Lookup {
        /// Lemma or third-person present form, e.g. "acquire" or "acquires".
        #[arg(long)]
        verb: String,
    },
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

    let mut config = ShapegraphConfig::load(cli.config.as_deref())?;
    if let Some(manifest) = cli.manifest {
        config.federation.manifest = Some(manifest);
    }
    let ontology = Ontology::load(&config)?;
    let service = Service::new(ontology);

    match cli.command {
        Commands::Load => {
            let status = projection::status(service.ontology());
            match &status.source {
                Some(LoadSource::Federated { manifest }) => {
                    println!("Federated from {manifest}");
                }
                Some(LoadSource::Fallback { snapshot, reason }) => {
                    println!("Degraded: loaded {snapshot}");
                    println!("  reason: {reason}");
                }
                None => {}
            }
            if let Some(report) = service.ontology().load_report() {
                for p in &report.progress {
                    println!(
                        "  [{}] {} +{} triples (total: {})",
                        p.order, p.locator, p.added, p.total
                    );
                }
            }
            println!("Triples: {}", status.triples);
        }

        Commands::Infer { file } => {
            let response = service.infer(&read_input(&file)?)?;
            print!("{}", response.inferred_data);
            eprintln!(
                "input: {}, inferred: {}, total: {}",
                response.stats.input_triples,
                response.stats.inferred_triples,
                response.stats.total_triples
            );
        }

        Commands::Validate { file } => {
            let response = service.validate(&read_input(&file)?)?;
            print!("{}", response.report_text);
            if response.conforms {
                eprintln!("Conforms.");
            } else {
                eprintln!("Violations ({}):", response.violations.len());
                for v in &response.violations {
                    eprintln!("  {} {}: {}", v.focus_node, v.path.local_name(), v.message);
                }
            }
        }

        Commands::Expand { file } => {
            let response = service.expand(&read_input(&file)?)?;
            print!("{}", response.inference.inferred_data);
            match &response.validation {
                ReportOutcome::Report(report) if report.conforms => eprintln!("Conforms."),
                ReportOutcome::Report(report) => {
                    eprintln!("Violations ({}):", report.violations.len());
                    for v in &report.violations {
                        eprintln!("  {} {}: {}", v.focus_node, v.path.local_name(), v.message);
                    }
                }
                ReportOutcome::Degraded { report_error } => {
                    eprintln!("Validation unavailable: {report_error}");
                }
            }
        }

        Commands::Save { file } => {
            let sink = SparqlUpdateSink::from_config(&config.persistence)?;
            let response = service.save(&read_input(&file)?, &sink)?;
            println!("Saved {} triples to {}", response.saved, sink.graph());
        }

        Commands::Forms => {
            let forms = projection::forms(service.ontology());
            let json = serde_json::to_string_pretty(&forms).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Stats => {
            let stats = projection::stats(service.ontology());
            println!("Shapes:  {}", stats.shapes);
            println!("Roles:   {}", stats.roles);
            println!("Rules:   {}", stats.rules);
            println!("Lemmas:  {}", stats.lemmas);
            println!("Senses:  {}", stats.senses);
            println!("Triples: {}", stats.triples);
        }

        Commands::Lookup { verb } => {
            let lookup = projection::lookup(service.ontology(), &verb);
            if !lookup.found {
                println!("No senses for \"{verb}\".");
            }
            for sense in &lookup.senses {
                println!(
                    "  {} [{}] {}",
                    sense.id,
                    sense.situations.join(", "),
                    sense.gloss
                );
            }
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).into_diagnostic()
}
