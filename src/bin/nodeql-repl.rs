//! NodeQL Interactive REPL
//!
//! Runs queries against an in-memory catalog and record store.
//!
//! Usage: nodeql-repl [OPTIONS]
//!
//! Options:
//!   -q, --query <QUERY>     Run one query, print the result and exit
//!   -c, --config <DIR>      Directory holding nodeql.toml and .env (default: .)

use clap::Parser;
use colored::Colorize;
use nodeql::root_calls;
use nodeql::{EngineConfig, MemoryStore, QueryExecutor, SchemaCatalog};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nodeql-repl")]
#[command(about = "NodeQL interactive query REPL", long_about = None)]
struct Args {
    /// Run a single query and exit
    #[arg(short, long)]
    query: Option<String>,

    /// Configuration directory
    #[arg(short, long, default_value = ".")]
    config: PathBuf,
}

/// Tab completion helper
struct NodeQlHelper {
    completions: Vec<String>,
}

impl NodeQlHelper {
    fn new() -> Self {
        let mut completions: Vec<String> = root_calls::names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        completions.extend(
            [
                "type", "id", "data", "fields", "fieldName", "fieldType", "targetType",
                "targetFieldName", "required", "default", "first", "after", "count", "nodes",
                "as",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        completions.sort();
        completions.dedup();
        Self { completions }
    }

    fn word_start(line: &str) -> usize {
        line.rfind(|c: char| c.is_whitespace() || "{}(),:".contains(c))
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

impl Completer for NodeQlHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let start = Self::word_start(&line[..pos]);
        let word = &line[start..pos];

        let matches: Vec<Pair> = self
            .completions
            .iter()
            .filter(|c| c.starts_with(word))
            .map(|c| Pair {
                display: c.clone(),
                replacement: c.clone(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for NodeQlHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }

        let word = &line[Self::word_start(line)..];
        if word.is_empty() {
            return None;
        }

        self.completions
            .iter()
            .find(|c| c.starts_with(word) && c.len() > word.len())
            .map(|c| c[word.len()..].to_string())
    }
}

impl Highlighter for NodeQlHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(hint.truecolor(100, 100, 100).to_string())
    }
}

impl Validator for NodeQlHelper {}

impl Helper for NodeQlHelper {}

/// Whether `input` still has an open `{` block
fn is_incomplete(input: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
    }
    depth > 0
}

fn print_banner() {
    println!(
        "  {} {}",
        "NodeQL Interactive REPL".white().bold(),
        env!("CARGO_PKG_VERSION").dimmed()
    );
    println!(
        "  Type {} for help, {} to quit\n",
        ".help".yellow(),
        ".exit".yellow()
    );
}

fn print_help() {
    println!("\n{}", "Commands:".white().bold());
    println!("  {}        Show this help", ".help".yellow());
    println!("  {}        Exit the REPL", ".exit".yellow());
    println!("  {}      List types and their fields", ".schema".yellow());
    println!("  {}       Clear the screen", ".clear".yellow());

    println!("\n{}", "Root calls:".white().bold());
    println!("  {}", root_calls::names().join(", ").cyan());

    println!("\n{}", "Examples:".white().bold());
    println!("  {}", "createType(name: User) { success }".green());
    println!(
        "  {}",
        "createField(type: User, fieldName: handle, fieldType: string) { success }".green()
    );
    println!(
        "  {}",
        r#"create(type: User, data: \{"handle": "alice"\}) { id, handle }"#.green()
    );
    println!("  {}", "nodes(type: User, first: 10) { count, nodes { handle } }".green());
    println!();
    println!(
        "  {}",
        "A query continues on the next line while a { block is open.".dimmed()
    );
    println!();
}

fn print_schema(catalog: &SchemaCatalog) {
    let schema = catalog.read();
    for type_def in schema.types() {
        let label = if type_def.is_node {
            type_def.name.cyan().bold()
        } else {
            type_def.name.dimmed()
        };
        println!("  {}", label);
        for field in type_def.fields.values() {
            let target = field
                .connection
                .as_ref()
                .map(|c| format!(" -> {}.{}", c.target_type, c.target_field))
                .unwrap_or_default();
            let required = if field.required { " required" } else { "" };
            println!(
                "    {}: {}{}{}",
                field.name,
                field.kind.to_string().yellow(),
                target.dimmed(),
                required.dimmed()
            );
        }
    }
}

fn format_value(value: &serde_json::Value, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    match value {
        serde_json::Value::Null => "null".dimmed().to_string(),
        serde_json::Value::Bool(b) => if *b { "true".green() } else { "false".red() }.to_string(),
        serde_json::Value::Number(n) => n.to_string().yellow().to_string(),
        serde_json::Value::String(s) => format!("\"{}\"", s).green().to_string(),
        serde_json::Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else {
                let items: Vec<String> = arr
                    .iter()
                    .map(|v| format!("{}  {}", prefix, format_value(v, indent + 1)))
                    .collect();
                format!("[\n{}\n{}]", items.join(",\n"), prefix)
            }
        }
        serde_json::Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else {
                let items: Vec<String> = obj
                    .iter()
                    .map(|(k, v)| {
                        format!("{}  {}: {}", prefix, k.cyan(), format_value(v, indent + 1))
                    })
                    .collect();
                format!("{{\n{}\n{}}}", items.join(",\n"), prefix)
            }
        }
    }
}

fn run_query(executor: &QueryExecutor, query: &str) -> bool {
    let start = std::time::Instant::now();
    match executor.execute(query) {
        Ok(result) => {
            println!("{}", format_value(&result, 0));
            println!(
                "{}",
                format!("  ({:.2}ms)", start.elapsed().as_secs_f64() * 1000.0).dimmed()
            );
            true
        }
        Err(e) => {
            println!("{} {}", format!("{}:", e.kind()).red().bold(), e);
            false
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = EngineConfig::load(&args.config)?;

    // Logs go to stderr so query output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let catalog = SchemaCatalog::new();
    let executor = QueryExecutor::with_config(catalog.clone(), Arc::new(MemoryStore::new()), &config);

    if let Some(query) = args.query {
        if run_query(&executor, &query) {
            return Ok(());
        }
        std::process::exit(1);
    }

    print_banner();

    let mut rl = Editor::new()?;
    rl.set_helper(Some(NodeQlHelper::new()));

    if let Some(history_file) = &config.history_file {
        let _ = rl.load_history(history_file);
    }

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            format!("{} ", "nodeql>".cyan())
        } else {
            format!("{} ", "   ...".dimmed())
        };

        match rl.readline(&prompt) {
            Ok(line) => {
                if buffer.is_empty() && line.trim().is_empty() {
                    continue;
                }

                // Handle special commands
                if buffer.is_empty() && line.trim().starts_with('.') {
                    let command = line.trim();
                    let _ = rl.add_history_entry(command);
                    match command {
                        ".exit" | ".quit" | ".q" => {
                            println!("{}", "Goodbye!".dimmed());
                            break;
                        }
                        ".help" | ".h" | ".?" => print_help(),
                        ".schema" => print_schema(&catalog),
                        ".clear" => {
                            print!("\x1B[2J\x1B[1;1H");
                            print_banner();
                        }
                        other => {
                            println!("  {} {}", "Unknown command:".red(), other);
                            println!("  Type {} for help", ".help".yellow());
                        }
                    }
                    continue;
                }

                buffer.push_str(&line);
                buffer.push('\n');
                if is_incomplete(&buffer) {
                    continue;
                }

                let query = std::mem::take(&mut buffer);
                let query = query.trim();
                let _ = rl.add_history_entry(query);
                run_query(&executor, query);
            }
            Err(ReadlineError::Interrupted) => {
                if buffer.is_empty() {
                    println!("{}", "Type .exit to quit".dimmed());
                } else {
                    println!("{}", "Cancelled".dimmed());
                    buffer.clear();
                }
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".dimmed());
                break;
            }
            Err(err) => {
                println!("{} {:?}", "Error:".red(), err);
                break;
            }
        }
    }

    // Save history
    if let Some(history_file) = &config.history_file {
        let _ = rl.save_history(history_file);
    }
    Ok(())
}
