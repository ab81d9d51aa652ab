use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use evmcl_complete::engine::{CompletionEngine, EngineConfig, PassOutcome, SessionCache};
use evmcl_complete::external::{Collaborators, MemoryContentResolver, OfflineProvider};
use evmcl_complete::logging::init_logger;
use evmcl_complete::modules::StaticModuleRegistry;
use evmcl_complete::Position;

#[derive(Parser)]
#[command(name = "evmcl-complete")]
#[command(about = "Completion suggestions for evmcl command scripts")]
#[command(version)]
struct Cli {
    /// Cursor line (zero-based, defaults to the last line)
    #[arg(short = 'l', long = "line")]
    line: Option<usize>,

    /// Cursor column (zero-based, defaults to the end of the line)
    #[arg(short = 'c', long = "column")]
    column: Option<usize>,

    /// TOML file with engine settings and offline name/content tables
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Output completion items as JSON
    #[arg(long = "json")]
    json: bool,

    /// Log filter, e.g. "debug" or "evmcl_complete=trace"
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Disable colored log output
    #[arg(long = "no-color")]
    no_color: bool,

    /// Script file (reads stdin when omitted)
    #[arg()]
    script_file: Option<PathBuf>,
}

/// Config file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CliConfig {
    engine: EngineConfig,
    /// Name -> address table for the offline provider
    names: IndexMap<String, String>,
    /// Content address -> document table for the offline content resolver
    content: IndexMap<String, String>,
    /// Module name -> content address of its manifest
    remote_modules: IndexMap<String, String>,
}

fn load_config(path: Option<&PathBuf>) -> Result<CliConfig, String> {
    let Some(path) = path else {
        return Ok(CliConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file: {}: {}", path.display(), e))?;
    let config: CliConfig =
        toml::from_str(&text).map_err(|e| format!("Invalid config file: {}: {}", path.display(), e))?;
    config.engine.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn read_script(path: Option<&PathBuf>) -> Result<String, String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read script file: {}: {}", path.display(), e)),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Cannot read stdin: {}", e))?;
            Ok(buf)
        }
    }
}

/// Cursor from the flags, defaulting to the end of the script.
fn cursor_for(script: &str, line: Option<usize>, column: Option<usize>) -> Position {
    let lines: Vec<&str> = script.split('\n').collect();
    let line = line.unwrap_or(lines.len().saturating_sub(1));
    let column = column.unwrap_or_else(|| lines.get(line).map_or(0, |l| l.trim_end_matches('\r').chars().count()));
    Position::new(line, column)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.no_color, cli.log_level.as_deref()) {
        eprintln!("Warning: logger already initialized: {}", e);
    }

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    let script = match read_script(cli.script_file.as_ref()) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut registry = StaticModuleRegistry::with_builtin_modules();
    for (name, address) in &config.remote_modules {
        if registry.contains(name) {
            warn!(module = %name, "remote module replaces a builtin module");
        }
        registry.register_remote(name.clone(), address.clone());
    }
    let collaborators = Collaborators::new(
        Arc::new(OfflineProvider::with_names(config.names)),
        Arc::new(MemoryContentResolver::with_documents(config.content)),
    );
    let engine = CompletionEngine::new(Arc::new(registry), collaborators, config.engine);
    let session = SessionCache::new();

    let cursor = cursor_for(&script, cli.line, cli.column);
    debug!(line = cursor.line, column = cursor.column, "completing");

    let result = engine.run_pass(&session, &script, cursor).await;
    for failure in result.report.load_failures.iter().chain(&result.report.execution.failures) {
        warn!(command = %failure.command, line = ?failure.line, error = %failure.error, "node skipped");
    }

    let items = match result.outcome {
        PassOutcome::Completed(items) => items,
        PassOutcome::Superseded => Vec::new(),
    };

    if cli.json {
        match serde_json::to_string_pretty(&items) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: Cannot serialize completions: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        for item in &items {
            match &item.detail {
                Some(detail) => println!("{}\t{:?}\t{}", item.label, item.kind, detail),
                None => println!("{}\t{:?}", item.label, item.kind),
            }
        }
    }
}
