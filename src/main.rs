use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use symbol_isolation::{
    same_instance, structurally_equal, AmbientContext, LifecycleController, OverrideConfig, Resolver,
    RunListener, SourceResolver,
};
use tracing_subscriber::EnvFilter;

/// Runs one simulated test run and reports, per symbol, whether the ambient
/// override hands out the same instance the application resolver holds.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Source root directories of the application resolver
    #[arg(long = "root", required = true)]
    roots: Vec<PathBuf>,
    /// Namespace prefix loaded child-first (repeatable)
    #[arg(long = "prefix")]
    prefixes: Vec<String>,
    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Symbols to compare
    #[arg(long = "symbol", required = true)]
    symbols: Vec<String>,
}

#[derive(Serialize)]
struct SymbolReport {
    name: String,
    matches_prefix: bool,
    same_instance: bool,
    structurally_equal: bool,
    origin: String,
}

#[derive(Serialize)]
struct RunReport {
    symbols: Vec<SymbolReport>,
    ambient_restored: bool,
}

fn run(args: Args) -> symbol_isolation::Result<RunReport> {
    let mut config = match &args.config {
        Some(path) => OverrideConfig::from_json_file(path)?,
        None => OverrideConfig::from_env(),
    };
    if !args.prefixes.is_empty() {
        config = config.with_prefixes(args.prefixes.iter().cloned());
    }
    let prefixes = config.namespace_prefixes();

    let app: Arc<dyn Resolver> = Arc::new(SourceResolver::from_roots("app", args.roots)?);
    let ambient = Arc::new(AmbientContext::new(Some(Arc::clone(&app))));
    let controller = LifecycleController::new(Arc::clone(&ambient), config);

    controller.run_opened()?;
    controller.discovery_started()?;
    controller.discovery_finished()?;
    controller.execution_started()?;

    let mut symbols = Vec::with_capacity(args.symbols.len());
    for name in &args.symbols {
        let held = app.resolve(name)?;
        let seen = ambient.resolve(name)?;
        symbols.push(SymbolReport {
            name: name.clone(),
            matches_prefix: prefixes.matches(name),
            same_instance: same_instance(&held, &seen),
            structurally_equal: structurally_equal(&held, &seen),
            origin: seen.origin().to_string(),
        });
    }

    controller.execution_finished()?;
    controller.run_closed()?;
    let ambient_restored = ambient.is_current(&app);
    Ok(RunReport { symbols, ambient_restored })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let report = match run(args) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
