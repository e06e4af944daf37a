pub mod commands;
pub mod core;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::core::error::{UniverseError, UniverseResult};
use crate::core::platform::NbPlatform;
use crate::core::state::{
    default_settings_path, load_settings, save_settings, PlatformConfig, UniverseSettings,
};
use crate::core::universe::{ModuleList, ModuleUniverse};

const DEFAULT_PLATFORM_ID: &str = "default";

/// Inspect the modules of an installed IDE platform
#[derive(Debug, Parser)]
#[command(name = "module-universe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Configured platform to inspect
    #[arg(short, long, global = true)]
    platform: Option<String>,

    /// Platform root to scan instead of a configured platform
    #[arg(long, global = true, conflicts_with_all = ["platform", "cluster"])]
    root: Option<PathBuf>,

    /// Single cluster directory to scan
    #[arg(long, global = true, conflicts_with = "platform")]
    cluster: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show configured platforms
    Platforms,

    /// Register a platform installation
    AddPlatform {
        id: String,
        dest_dir: PathBuf,
        #[arg(long)]
        label: Option<String>,
        /// Source root, repeatable
        #[arg(long = "source")]
        sources: Vec<PathBuf>,
        /// Javadoc root, repeatable
        #[arg(long)]
        javadoc: Vec<PathBuf>,
    },

    /// List every module
    List,

    /// Show the metadata of one module
    Describe { cnb: String },

    /// Public API classes of a module
    Classes { cnb: String },

    /// Whether a module needs another at run time
    DependsOn { module: String, dependency: String },

    /// Transitive run-time dependencies of a module
    Closure { cnb: String },

    /// Modules providing a token
    Providers { token: String },

    /// Whether a `.class` file declares a public class
    ClassFile { path: PathBuf },
}

/// Everything one invocation needs.
struct Session {
    settings_path: PathBuf,
    settings: UniverseSettings,
    universe: Arc<ModuleUniverse>,
}

impl Session {
    fn open(settings_path: Option<PathBuf>) -> UniverseResult<Self> {
        let settings_path = settings_path.unwrap_or_else(default_settings_path);
        let settings = load_settings(&settings_path)?;
        Ok(Self {
            settings_path,
            settings,
            universe: Arc::new(ModuleUniverse::new()),
        })
    }

    fn platform(&self, id: Option<&str>) -> UniverseResult<NbPlatform> {
        NbPlatform::find(
            &self.settings.platforms,
            id.unwrap_or(DEFAULT_PLATFORM_ID),
            Arc::clone(&self.universe),
        )
    }

    fn modules(&self, cli: &Cli) -> UniverseResult<Arc<ModuleList>> {
        if let Some(cluster) = &cli.cluster {
            return Ok(self.universe.cluster_list(cluster, None, None));
        }
        if let Some(root) = &cli.root {
            return Ok(self.universe.binary_list(root));
        }
        Ok(self.platform(cli.platform.as_deref())?.modules())
    }
}

fn to_json<T: Serialize>(value: T) -> UniverseResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

fn execute(cli: Cli, session: &mut Session) -> UniverseResult<serde_json::Value> {
    match &cli.command {
        Command::Platforms => {
            let summaries: Vec<_> = session
                .settings
                .platforms
                .iter()
                .map(|c| NbPlatform::from_config(c, Arc::clone(&session.universe)).summary())
                .collect();
            to_json(summaries)
        }
        Command::AddPlatform {
            id,
            dest_dir,
            label,
            sources,
            javadoc,
        } => {
            let config = PlatformConfig {
                id: id.clone(),
                label: label.clone(),
                dest_dir: dest_dir.clone(),
                sources: sources.clone(),
                javadoc: javadoc.clone(),
            };
            let platform = NbPlatform::from_config(&config, Arc::clone(&session.universe));
            if !platform.is_valid() {
                return Err(UniverseError::PlatformNotFound(format!(
                    "{} is not a platform installation",
                    dest_dir.display()
                )));
            }
            session.settings.platforms.retain(|p| p.id != *id);
            session.settings.platforms.push(config);
            save_settings(&session.settings_path, &session.settings)?;
            tracing::info!("Registered platform {} at {}", id, dest_dir.display());
            to_json(platform.summary())
        }
        Command::List => to_json(commands::list_modules(&*session.modules(&cli)?)),
        Command::Describe { cnb } => {
            to_json(commands::describe_module(&*session.modules(&cli)?, cnb)?)
        }
        Command::Classes { cnb } => {
            to_json(commands::public_classes(&*session.modules(&cli)?, cnb)?)
        }
        Command::DependsOn { module, dependency } => to_json(commands::depends_on(
            &*session.modules(&cli)?,
            module,
            dependency,
        )?),
        Command::Closure { cnb } => to_json(commands::closure(&*session.modules(&cli)?, cnb)?),
        Command::Providers { token } => {
            to_json(commands::providers(&*session.modules(&cli)?, token))
        }
        Command::ClassFile { path } => to_json(commands::is_public_class_file(path)?),
    }
}

/// Parse arguments, run one command and print its JSON result.
/// Returns the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    let session = Session::open(cli.settings.clone());
    let log_filter = session
        .as_ref()
        .map(|s| s.settings.log_filter.clone())
        .unwrap_or_else(|_| crate::core::state::DEFAULT_LOG_FILTER.to_string());

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .init();

    tracing::debug!("module-universe starting");

    let result = session.and_then(|mut session| execute(cli, &mut session));
    let (output, code) = match result {
        Ok(value) => (value, 0),
        Err(e) => {
            tracing::error!("{}", e);
            (serde_json::json!({ "error": e }), 1)
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("cannot render output: {}", e);
            return 1;
        }
    }
    code
}
