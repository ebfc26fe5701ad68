//! ngscout CLI - cached workspace file discovery and Angular project navigation

use clap::{Parser, Subcommand};
use colored::Colorize;
use ngscout_core::{
    json_to_interfaces, Config, DiscoveryEngine, Notifier, ProjectNavigator, WorkspaceFolder,
};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const CONFIG_FILE: &str = "ngscout.toml";

#[derive(Parser)]
#[command(name = "ngscout")]
#[command(about = "Cached workspace file discovery and project navigation", long_about = None)]
struct Cli {
    /// Override project root detection
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default ngscout.toml
    Init,

    /// List files matching the discovery configuration
    List {
        /// Include patterns: globs, paths, or bare extensions (overrides config)
        #[arg(short, long)]
        include: Vec<String>,

        /// Extra exclude patterns (added to config)
        #[arg(short = 'x', long)]
        exclude: Vec<String>,

        /// Only direct children of the root
        #[arg(long)]
        no_recursive: bool,

        /// Maximum folder depth below the root
        #[arg(long)]
        max_depth: Option<usize>,

        /// Include dotfiles and files under dot-directories
        #[arg(long)]
        dotfiles: bool,

        /// Skip the project ignore-file
        #[arg(long)]
        no_ignore_file: bool,
    },

    /// List module declarations found in discovered files
    Modules,

    /// List route declarations found in discovered files
    Routes,

    /// Files, modules, and routes from one cached scan
    Overview,

    /// Generate TypeScript interfaces from JSON (stdin or --file)
    Interface {
        /// Name of the root interface
        name: String,

        /// Read JSON from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show cache limits and the effective discovery configuration
    Stats,
}

/// Error sink wired into the engine: one colored line on stderr.
struct TermNotifier;

impl Notifier for TermNotifier {
    fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red(), message);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init => cmd_init(cli.root),
        Commands::List {
            include,
            exclude,
            no_recursive,
            max_depth,
            dotfiles,
            no_ignore_file,
        } => {
            cmd_list(
                cli.root,
                cli.json,
                include,
                exclude,
                no_recursive,
                max_depth,
                dotfiles,
                no_ignore_file,
            )
            .await
        }
        Commands::Modules => cmd_modules(cli.root, cli.json).await,
        Commands::Routes => cmd_routes(cli.root, cli.json).await,
        Commands::Overview => cmd_overview(cli.root, cli.json).await,
        Commands::Interface { name, file } => cmd_interface(name, file),
        Commands::Stats => cmd_stats(cli.root, cli.json),
    };

    if let Err(e) = result {
        if cli.json {
            let error_json = serde_json::json!({ "error": e.to_string() });
            eprintln!("{}", serde_json::to_string_pretty(&error_json).unwrap());
        } else {
            eprintln!("{} {}", "Error:".red(), e);
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Project root: the --root override, else the nearest ancestor carrying
/// an ngscout.toml, else the current directory.
fn project_root(root: Option<PathBuf>) -> ngscout_core::Result<PathBuf> {
    if let Some(root) = root {
        return Ok(root);
    }
    let cwd = std::env::current_dir()?;
    let mut dir = cwd.as_path();
    loop {
        if dir.join(CONFIG_FILE).is_file() {
            return Ok(dir.to_path_buf());
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Ok(cwd),
        }
    }
}

fn load_config(root: &Path) -> ngscout_core::Result<Config> {
    let path = root.join(CONFIG_FILE);
    if path.is_file() {
        Config::load(&path)
    } else {
        Ok(Config::default())
    }
}

fn make_engine(root: &Path, config: &Config) -> DiscoveryEngine {
    let mut engine_config = config.engine_config();
    engine_config.folders = vec![WorkspaceFolder::local(root)];
    DiscoveryEngine::new(engine_config).with_notifier(Arc::new(TermNotifier))
}

fn make_navigator(root: &Path, config: &Config) -> ngscout_core::Result<ProjectNavigator> {
    ProjectNavigator::new(make_engine(root, config), &config.navigator)
}

fn display_path(file: &Path, root: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}

fn cmd_init(root: Option<PathBuf>) -> ngscout_core::Result<()> {
    let root = project_root(root)?;
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        return Err(ngscout_core::ScoutError::ConfigExists(path));
    }
    std::fs::write(&path, ngscout_core::config::DEFAULT_CONFIG)?;
    println!("{} {}", "Created".green(), path.display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_list(
    root: Option<PathBuf>,
    json: bool,
    include: Vec<String>,
    exclude: Vec<String>,
    no_recursive: bool,
    max_depth: Option<usize>,
    dotfiles: bool,
    no_ignore_file: bool,
) -> ngscout_core::Result<()> {
    let root = project_root(root)?;
    let config = load_config(&root)?;
    let engine = make_engine(&root, &config);

    let mut options = config.discovery_options(&root);
    if !include.is_empty() {
        options.include = include;
    }
    options.exclude.extend(exclude);
    if no_recursive {
        options.disable_recursive = true;
    }
    if max_depth.is_some() {
        options.max_depth = max_depth;
    }
    if dotfiles {
        options.include_dotfiles = true;
    }
    if no_ignore_file {
        options.detect_ignore_file = false;
    }

    let files = engine.discover(&options).await;

    if json {
        let paths: Vec<String> = files.iter().map(|f| display_path(f, &root)).collect();
        println!("{}", serde_json::to_string_pretty(&paths).unwrap());
    } else {
        for file in files.iter() {
            println!("{}", display_path(file, &root));
        }
        println!("{}: {} files", "Found".green(), files.len());
    }
    Ok(())
}

async fn cmd_modules(root: Option<PathBuf>, json: bool) -> ngscout_core::Result<()> {
    let root = project_root(root)?;
    let config = load_config(&root)?;
    let navigator = make_navigator(&root, &config)?;
    let modules = navigator.modules(&config.discovery_options(&root)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&modules).unwrap());
    } else {
        for module in &modules {
            println!(
                "{}  {}:{}",
                module.name.cyan(),
                display_path(&module.file, &root),
                module.line
            );
        }
        println!("{}: {} modules", "Found".green(), modules.len());
    }
    Ok(())
}

async fn cmd_routes(root: Option<PathBuf>, json: bool) -> ngscout_core::Result<()> {
    let root = project_root(root)?;
    let config = load_config(&root)?;
    let navigator = make_navigator(&root, &config)?;
    let routes = navigator.routes(&config.discovery_options(&root)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&routes).unwrap());
    } else {
        for route in &routes {
            let component = route.component.as_deref().unwrap_or("-");
            println!(
                "/{}  {}  {}:{}",
                route.path.cyan(),
                component,
                display_path(&route.file, &root),
                route.line
            );
        }
        println!("{}: {} routes", "Found".green(), routes.len());
    }
    Ok(())
}

/// Three listings off one scan; the second and third are cache hits.
async fn cmd_overview(root: Option<PathBuf>, json: bool) -> ngscout_core::Result<()> {
    let root = project_root(root)?;
    let config = load_config(&root)?;
    let navigator = make_navigator(&root, &config)?;
    let options = config.discovery_options(&root);

    let files = navigator.files(&options).await;
    let modules = navigator.modules(&options).await?;
    let routes = navigator.routes(&options).await?;
    let stats = navigator.engine().cache_stats();

    if json {
        let payload = serde_json::json!({
            "files": files.iter().map(|f| display_path(f, &root)).collect::<Vec<_>>(),
            "modules": modules,
            "routes": routes,
            "cache": stats,
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap());
        return Ok(());
    }

    println!("{}", "Files".blue().bold());
    for file in files.iter() {
        println!("  {}", display_path(file, &root));
    }
    println!("{}", "Modules".blue().bold());
    for module in &modules {
        println!(
            "  {}  {}:{}",
            module.name.cyan(),
            display_path(&module.file, &root),
            module.line
        );
    }
    println!("{}", "Routes".blue().bold());
    for route in &routes {
        println!(
            "  /{}  {}:{}",
            route.path.cyan(),
            display_path(&route.file, &root),
            route.line
        );
    }
    println!(
        "{}: {} files, {} modules, {} routes (cache {}/{}, ttl {}s)",
        "Overview".green(),
        files.len(),
        modules.len(),
        routes.len(),
        stats.size,
        stats.max_size,
        stats.ttl_secs
    );
    Ok(())
}

fn cmd_interface(name: String, file: Option<PathBuf>) -> ngscout_core::Result<()> {
    let json_text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };
    print!("{}", json_to_interfaces(&name, &json_text)?);
    Ok(())
}

fn cmd_stats(root: Option<PathBuf>, json: bool) -> ngscout_core::Result<()> {
    let root = project_root(root)?;
    let config = load_config(&root)?;
    let engine = make_engine(&root, &config);
    let stats = engine.cache_stats();

    if json {
        let payload = serde_json::json!({
            "cache": stats,
            "discovery": config.discovery,
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap());
        return Ok(());
    }

    println!("{}: {}", "Root".blue(), root.display());
    println!(
        "{}: {}/{} entries, ttl {}s",
        "Cache".blue(),
        stats.size,
        stats.max_size,
        stats.ttl_secs
    );
    println!(
        "{}: include {:?}, exclude {:?}",
        "Patterns".blue(),
        config.discovery.include,
        config.discovery.exclude
    );
    println!(
        "{}: ignore file {} (detect: {}), dotfiles: {}, max depth: {}, max results: {}",
        "Filters".blue(),
        config.discovery.ignore_file,
        config.discovery.detect_ignore_file,
        config.discovery.include_dotfiles,
        config.discovery.max_depth,
        config.discovery.max_results
    );
    Ok(())
}
