//! connlist CLI — browse a JSON list through the connection engine.
//!
//! Usage:
//!   connlist browse --data items.json [--config cfg.yaml] [--query text]
//!                   [--filter id] [--more N] [--url "?query=..."] [--json]

use clap::{Parser, Subcommand};
use connlist::{
    ConnectionConfig, ConnectionEngine, ConnectionSource, ConnectionView, FilterArgs, Location,
    MemoryLocation, ScalarValue, StaticSource,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "connlist",
    version,
    about = "Paginated, filterable connection lists"
)]
struct Cli {
    /// Log engine activity to stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load items and page through them
    Browse {
        /// JSON file holding an array of items
        #[arg(long)]
        data: PathBuf,
        /// YAML config (defaults to <config dir>/connlist/config.yaml if present)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Search text
        #[arg(long)]
        query: Option<String>,
        /// Filter id
        #[arg(long)]
        filter: Option<String>,
        /// Number of "show more" clicks
        #[arg(long, default_value_t = 0)]
        more: usize,
        /// Initial location search string, e.g. "?query=foo&visible=40"
        #[arg(long, default_value = "")]
        url: String,
        /// Override the page size
        #[arg(long)]
        first: Option<usize>,
        /// Use cursor paging instead of doubling
        #[arg(long)]
        cursor: bool,
        /// Print the final state as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

struct BrowseOptions {
    query: Option<String>,
    filter: Option<String>,
    more: usize,
    url: String,
    json: bool,
}

/// Get the default config path (<config dir>/connlist/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("connlist").join("config.yaml"))
}

fn load_config(path: Option<PathBuf>) -> Result<ConnectionConfig, String> {
    let path = match path {
        Some(path) => path,
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => path,
            None => return Ok(ConnectionConfig::default()),
        },
    };
    info!(path = %path.display(), "loading config");
    ConnectionConfig::load(&path).map_err(|e| format!("Failed to load config: {}", e))
}

fn load_items(path: &Path) -> Result<Vec<Value>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(format!("'{}' must contain a JSON array", path.display())),
        Err(e) => Err(format!("invalid JSON in '{}': {}", path.display(), e)),
    }
}

/// Case-insensitive substring search over the item's JSON text; every
/// filter arg must equal the item's field of the same name.
fn matches_item(item: &Value, query: &str, filter: &FilterArgs) -> bool {
    let text_matches =
        query.is_empty() || item.to_string().to_lowercase().contains(&query.to_lowercase());
    text_matches
        && filter.iter().all(|(key, expected)| match (item.get(key), expected) {
            (Some(Value::String(s)), ScalarValue::String(e)) => s == e,
            (Some(Value::Bool(b)), ScalarValue::Bool(e)) => b == e,
            (Some(Value::Number(n)), ScalarValue::Int(e)) => n.as_i64() == Some(*e),
            (Some(Value::Number(n)), ScalarValue::Float(e)) => n.as_f64() == Some(*e),
            _ => false,
        })
}

fn describe_item(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}

async fn cmd_browse(
    source: Arc<dyn ConnectionSource<Value>>,
    config: ConnectionConfig,
    opts: BrowseOptions,
) -> i32 {
    let location = Arc::new(MemoryLocation::new(opts.url));
    let engine = match ConnectionEngine::with_location(source, config, location.clone()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    engine.settled().await;

    if let Some(query) = opts.query {
        engine.set_search_text(query);
        engine.settled().await;
    }
    if let Some(filter) = opts.filter {
        if let Err(e) = engine.select_filter(&filter) {
            eprintln!("Error: {}", e);
            return 1;
        }
        engine.settled().await;
    }
    for click in 0..opts.more {
        if !engine.request_more() {
            info!(click, "no more items to load");
            break;
        }
        engine.settled().await;
    }

    let state = engine.settled().await;
    if opts.json {
        match serde_json::to_string_pretty(&state) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        let view = ConnectionView::new(&state, engine.config());
        print!("{}", view.render(describe_item));
        let search = location.search();
        if !search.is_empty() {
            println!("url: ?{}", search);
        }
    }

    if state.error.is_some() {
        1
    } else {
        0
    }
}

/// Run `browse` on its own runtime; the runtime and engine are dropped
/// before the process exits.
fn run_browse(
    source: Arc<dyn ConnectionSource<Value>>,
    config: ConnectionConfig,
    opts: BrowseOptions,
) -> i32 {
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };
    rt.block_on(cmd_browse(source, config, opts))
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Browse {
            data,
            config,
            query,
            filter,
            more,
            url,
            first,
            cursor,
            json,
        } => {
            let mut config = match load_config(config) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            if let Some(first) = first {
                config.default_first = first;
            }
            if cursor {
                config.cursor_paging = true;
            }

            let items = match load_items(&data) {
                Ok(items) => items,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };
            info!(count = items.len(), "loaded items");

            let source: Arc<dyn ConnectionSource<Value>> =
                Arc::new(StaticSource::new(items).with_matcher(matches_item));
            let opts = BrowseOptions {
                query,
                filter,
                more,
                url,
                json,
            };
            let code = run_browse(source, config, opts);
            std::process::exit(code);
        }
    }
}
