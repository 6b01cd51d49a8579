use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use fed_sparql::engine::http::{HttpEngineSettings, HttpSparqlEngine};
use fed_sparql::federation::ConfiguredCatalog;
use fed_sparql::logging;
use fed_sparql::session::{QueryEditor, QuerySession, RunSnapshot, SessionSettings};
use fed_sparql::shared::config::CONFIG;
use fed_sparql::shared::config::model::{ExampleQuery, Settings};
use fed_sparql::shared::render::{render_table, row_cells};

#[derive(Parser)]
#[command(name = "fed_sparql")]
#[command(about = "Interactive federated SPARQL query console", long_about = None)]
struct Args {
    /// The SPARQL query to execute (non-interactive mode)
    #[arg(short, long)]
    query: Option<String>,

    /// Comma-separated source shortnames to query, replacing the configured selection
    #[arg(short, long, value_delimiter = ',')]
    sources: Vec<String>,

    /// Name of a configured example query to load
    #[arg(short, long)]
    example: Option<String>,

    /// Maximum number of rows to display (0 = unlimited)
    #[arg(short, long, default_value = "0")]
    limit: usize,
}

/// Prints replayed queries so the user sees what was loaded.
struct EchoEditor;

impl QueryEditor for EchoEditor {
    fn set_value(&self, text: &str) {
        println!("{}", text);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(&CONFIG.logging)?;

    let runtime = Runtime::new()?;
    let session = build_session(&CONFIG)?;

    if let Some(name) = &args.example {
        load_example(&session, &CONFIG.examples, name)?;
    }
    if !args.sources.is_empty() {
        session.replay(&session.query_text(), args.sources.as_slice());
    }

    if let Some(query) = &args.query {
        if query.trim().is_empty() {
            eprintln!("Error: Query cannot be empty");
            std::process::exit(1);
        }
        session.set_query_text(query.as_str());
    }

    // Non-interactive mode: execute once and exit
    if args.query.is_some() || args.example.is_some() {
        let snapshot = run_query(&runtime, &session, args.limit)?;
        if !snapshot.error_message.is_empty() {
            std::process::exit(1);
        }
        return Ok(());
    }

    run_interactive(&runtime, session.with_editor(Arc::new(EchoEditor)), args.limit)
}

fn build_session(settings: &Settings) -> anyhow::Result<QuerySession> {
    let catalog = ConfiguredCatalog::from_config(&settings.sources)?;
    let engine = Arc::new(HttpSparqlEngine::new(HttpEngineSettings::from(&settings.http)));
    info!(
        target: "fed_sparql::console",
        sources = settings.sources.len(),
        examples = settings.examples.len(),
        "Session ready"
    );
    Ok(QuerySession::from_catalog(
        engine,
        &catalog,
        SessionSettings::from(&settings.session),
    ))
}

fn load_example(session: &QuerySession, examples: &[ExampleQuery], name: &str) -> anyhow::Result<()> {
    let example = examples
        .iter()
        .find(|example| example.name == name)
        .ok_or_else(|| anyhow::anyhow!("Unknown example: {}", name))?;
    session.replay(&example.query, example.sources.as_slice());
    Ok(())
}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".fed_sparql_history"))
        .unwrap_or_else(|| PathBuf::from(".fed_sparql_history"))
}

fn run_interactive(runtime: &Runtime, session: QuerySession, limit: usize) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;
    let history = history_path();
    let _ = rl.load_history(&history);

    println!("Federated SPARQL Console");
    println!("Type '\\h' for help, '\\q' to quit");
    print_sources(&session);
    println!();

    let mut query_buffer = String::new();

    loop {
        let prompt = if query_buffer.is_empty() { "sparql=> " } else { "  -> " };
        match rl.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                // A blank line submits whatever has been typed so far
                if trimmed.is_empty() {
                    if query_buffer.trim().is_empty() {
                        continue;
                    }
                    let query = query_buffer.trim().to_string();
                    query_buffer.clear();
                    let _ = rl.add_history_entry(&query);
                    session.set_query_text(query);
                    report(run_query(runtime, &session, limit));
                    continue;
                }

                if query_buffer.is_empty() && trimmed.starts_with('\\') {
                    let mut parts = trimmed.trim_start_matches('\\').split_whitespace();
                    let cmd = parts.next().unwrap_or("");
                    let arg = parts.next();
                    match cmd {
                        "q" | "quit" | "exit" => {
                            println!("Goodbye!");
                            break;
                        }
                        "h" | "help" => print_help(),
                        "sources" => print_sources(&session),
                        "toggle" => match arg {
                            Some(id) => match session.toggle_source(id) {
                                Ok(true) => println!("Selected {}", id),
                                Ok(false) => println!("Deselected {}", id),
                                Err(e) => eprintln!("Error: {}", e),
                            },
                            None => eprintln!("Usage: \\toggle <source>"),
                        },
                        "targets" => print_targets(&session),
                        "examples" => print_examples(&CONFIG.examples),
                        "load" => match arg {
                            Some(name) => {
                                if let Err(e) = load_example(&session, &CONFIG.examples, name) {
                                    eprintln!("Error: {}", e);
                                }
                            }
                            None => eprintln!("Usage: \\load <example>"),
                        },
                        "show" => {
                            let text = session.query_text();
                            if text.is_empty() {
                                println!("(no query)");
                            } else {
                                println!("{}", text);
                            }
                        }
                        "run" => report(run_query(runtime, &session, limit)),
                        _ => eprintln!("Unknown command: \\{}. Type \\h for help.", cmd),
                    }
                    continue;
                }

                if !query_buffer.is_empty() {
                    query_buffer.push('\n');
                }
                query_buffer.push_str(&line);
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                query_buffer.clear();
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history);

    Ok(())
}

fn report(result: anyhow::Result<RunSnapshot>) {
    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }
}

/// Runs the session's current query, printing progress until it settles. Ctrl-C cancels.
fn run_query(runtime: &Runtime, session: &QuerySession, limit: usize) -> anyhow::Result<RunSnapshot> {
    if !session.is_runnable() {
        anyhow::bail!("No source selected. Use \\toggle <source> to select one.");
    }

    let snapshot = runtime.block_on(drive(session));
    print_results(session, &snapshot, limit);
    Ok(snapshot)
}

async fn drive(session: &QuerySession) -> RunSnapshot {
    let mut changes = session.subscribe();
    let running = session.clone();
    let execution = tokio::spawn(async move { running.execute().await });

    let mut last_progress = String::new();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if session.cancel() {
                    eprint!("\nCancelled.");
                }
            }
            changed = changes.changed() => {
                if changed.is_err() || !session.is_running() {
                    break;
                }
                let progress = session.progress_text();
                if progress != last_progress {
                    eprint!("\r{}", progress);
                    last_progress = progress;
                }
            }
        }
    }
    eprintln!();

    if let Err(e) = execution.await {
        warn!(target: "fed_sparql::console", "Execution task failed: {}", e);
    }
    session.snapshot()
}

fn print_results(session: &QuerySession, snapshot: &RunSnapshot, limit: usize) {
    let rows = session.rows();
    let shown = if limit > 0 { rows.len().min(limit) } else { rows.len() };

    if !snapshot.columns.is_empty() {
        let cells: Vec<Vec<String>> = rows[..shown]
            .iter()
            .map(|row| row_cells(&snapshot.columns, row))
            .collect();
        print!("{}", render_table(&snapshot.columns, &cells));
    }
    if shown < rows.len() {
        println!("(showing first {} of {} rows)", shown, rows.len());
    }
    if !snapshot.error_message.is_empty() {
        eprintln!("Error: {}", snapshot.error_message);
    }
    if snapshot.possibly_incomplete {
        eprintln!("Results may be incomplete.");
    }
    println!("{}", snapshot.progress_text);
}

fn print_sources(session: &QuerySession) {
    println!("Sources:");
    for entry in session.sources() {
        let mark = if entry.disabled {
            "-"
        } else if entry.selected {
            "x"
        } else {
            " "
        };
        println!(
            "  [{}] {:<12} {}",
            mark,
            entry.source.identifier(),
            entry.source.display_name()
        );
    }
}

fn print_targets(session: &QuerySession) {
    let targets = session.targets();
    if targets.is_empty() {
        println!("No source selected.");
        return;
    }
    for target in targets {
        println!("  {}", target);
    }
}

fn print_examples(examples: &[ExampleQuery]) {
    if examples.is_empty() {
        println!("No examples configured.");
        return;
    }
    for example in examples {
        println!("  {:<24} [{}]", example.name, example.sources.join(", "));
    }
}

fn print_help() {
    println!();
    println!("Federated SPARQL Console Help");
    println!("─────────────────────────────");
    println!("Special commands:");
    println!("  \\q, \\quit, \\exit    Exit the console");
    println!("  \\h, \\help          Show this help message");
    println!("  \\sources           List sources and their selection");
    println!("  \\toggle <source>   Select or deselect a source");
    println!("  \\targets           Show where the next query will be sent");
    println!("  \\examples          List configured example queries");
    println!("  \\load <example>    Load an example query and its sources");
    println!("  \\show              Print the current query");
    println!("  \\run               Run the current query again");
    println!();
    println!("Query input:");
    println!("  - Type the query over as many lines as needed");
    println!("  - Press Enter on an empty line to run it");
    println!("  - Use Ctrl+C while a query runs to cancel it");
    println!();
}
