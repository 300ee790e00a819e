//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aiprotocol_core::bootstrap::{BootstrapOptions, FileOutcome, SubmoduleOptions, bootstrap};
use aiprotocol_core::drift::{DriftStatus, check_drift};
use aiprotocol_core::registry::registry_path;
use aiprotocol_core::validate::{Issue, check_registry, check_templates};
use aiprotocol_core::{Registry, fetch_context, resolve_repo_root};
use aiprotocol_shared::{AppConfig, ProtocolError, TEMPLATES_DIR, init_config, load_config};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::info;

const USAGE: &str =
    "Usage: ai-protocol {list|fetch <key>|check [target]|bootstrap <target>|validate|config}";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ai-protocol — inject the AI agent protocol and fetch documentation context.
#[derive(Parser)]
#[command(
    name = "ai-protocol",
    version,
    about = "Inject the AI agent protocol into projects and fetch documentation context on demand.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Repository root used when git cannot determine one.
    #[arg(long, env = "REPO_ROOT", global = true)]
    pub repo_root: Option<PathBuf>,

    /// Protocol root holding VERSION and templates/.
    #[arg(long, env = "AI_PROTOCOL_ROOT", global = true)]
    pub protocol_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// List every fetchable registry key.
    List,

    /// Print the documentation registered under a key.
    Fetch {
        /// Registry key to fetch.
        key: Option<String>,
    },

    /// Compare the protocol version with a target project's registry.
    Check {
        /// Target project directory (defaults to the current directory).
        target: Option<PathBuf>,
    },

    /// Inject the protocol payload into a project.
    Bootstrap {
        /// Target project directory.
        target: PathBuf,

        /// Agent name; the agent file becomes <AGENT>.md.
        #[arg(long)]
        agent: Option<String>,

        /// Overwrite existing files.
        #[arg(long)]
        force: bool,

        /// Inject the thin submodule agent file instead of the bootloader.
        #[arg(long)]
        monorepo_submodule: bool,

        /// Module name substituted for {{MODULE_NAME}} (submodule mode).
        #[arg(long, requires = "monorepo_submodule")]
        module_name: Option<String>,

        /// One-line description substituted for {{ONE_LINE_DESCRIPTION}} (submodule mode).
        #[arg(long, requires = "monorepo_submodule")]
        description: Option<String>,
    },

    /// Check that registry entries point at real files and sections.
    Validate {
        /// Validate the protocol's own templates instead of the current repository.
        #[arg(long)]
        templates: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries payload.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "aiprotocol=warn",
        1 => "aiprotocol=info",
        2 => "aiprotocol=debug",
        _ => "aiprotocol=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Paths and config shared by the repository-facing commands.
struct Context {
    config: AppConfig,
    cwd: PathBuf,
    repo_root_override: Option<PathBuf>,
    protocol_root_flag: Option<PathBuf>,
}

impl Context {
    fn new(
        repo_root_override: Option<PathBuf>,
        protocol_root_flag: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            config: load_config_or_default(),
            cwd: std::env::current_dir()
                .map_err(|e| eyre!("cannot determine working directory: {e}"))?,
            repo_root_override,
            protocol_root_flag,
        })
    }

    async fn repo_root(&self) -> PathBuf {
        resolve_repo_root(
            &self.cwd,
            self.repo_root_override.as_deref(),
            self.config.git_timeout(),
        )
        .await
    }

    fn protocol_root(&self) -> PathBuf {
        self.config
            .protocol_root(self.protocol_root_flag.as_deref(), &self.cwd)
    }

    fn load_registry(&self, root: &Path) -> Result<Registry> {
        Registry::load(&registry_path(root)).map_err(|e| match e {
            ProtocolError::RegistryNotFound { .. } => {
                eyre!("{e} (run from the repository root, or set REPO_ROOT)")
            }
            other => other.into(),
        })
    }
}

/// Load the user config, falling back to defaults when the file is broken.
/// `config show` and `config init` do not go through here.
fn load_config_or_default() -> AppConfig {
    load_config().unwrap_or_else(|e| {
        eprintln!("Warning: {e}; using defaults (run `ai-protocol config init` to reset)");
        AppConfig::default()
    })
}

/// Run the CLI command and return the process exit code.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    let Some(command) = cli.command else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    };

    let context = || Context::new(cli.repo_root.clone(), cli.protocol_root.clone());

    match command {
        Command::List => cmd_list(&context()?).await,
        Command::Fetch { key } => cmd_fetch(&context()?, key.as_deref()).await,
        Command::Check { target } => cmd_check(&context()?, target).await,
        Command::Bootstrap {
            target,
            agent,
            force,
            monorepo_submodule,
            module_name,
            description,
        } => {
            let ctx = context()?;
            let submodule = monorepo_submodule.then_some(SubmoduleOptions {
                module_name,
                description,
            });
            let opts = BootstrapOptions {
                target,
                agent: agent.unwrap_or_else(|| ctx.config.defaults.agent.clone()),
                force,
                submodule,
            };
            cmd_bootstrap(&ctx, &opts).await
        }
        Command::Validate { templates } => cmd_validate(&context()?, templates).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_list(ctx: &Context) -> Result<ExitCode> {
    let root = ctx.repo_root().await;
    let registry = ctx.load_registry(&root)?;

    let mut stdout = std::io::stdout().lock();
    for key in registry.content_keys() {
        writeln!(stdout, "{key}")?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_fetch(ctx: &Context, key: Option<&str>) -> Result<ExitCode> {
    let Some(key) = key else {
        eprintln!("Usage: ai-protocol fetch <key>");
        return Ok(ExitCode::FAILURE);
    };

    let root = ctx.repo_root().await;
    let registry = ctx.load_registry(&root)?;

    let report = fetch_context(
        key,
        &registry,
        &root,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;
    info!(key, printed = report.printed, "fetch complete");
    Ok(ExitCode::SUCCESS)
}

async fn cmd_check(ctx: &Context, target: Option<PathBuf>) -> Result<ExitCode> {
    let target = target.unwrap_or_else(|| ctx.cwd.clone());
    let target = std::fs::canonicalize(&target).unwrap_or(target);

    match check_drift(&ctx.protocol_root(), &target)? {
        DriftStatus::ProtocolUnversioned => {
            println!("Warning: ai-protocol VERSION file not found; cannot compare.");
            Ok(ExitCode::SUCCESS)
        }
        DriftStatus::TargetUnversioned => {
            println!(
                "Target has no protocol version (missing docs/context_registry.json or _meta.protocol_version)."
            );
            println!(
                "Run bootstrap to inject the protocol, or add _meta.protocol_version to the registry."
            );
            Ok(ExitCode::SUCCESS)
        }
        DriftStatus::Match { version } => {
            println!("OK: Protocol version match ({version}).");
            Ok(ExitCode::SUCCESS)
        }
        DriftStatus::Drift { protocol, target: found } => {
            println!("Drift: ai-protocol is {protocol}, target reports {found}.");
            println!(
                "To refresh the target, run: ai-protocol bootstrap {} --force \
                 (review changes; --force overwrites existing files).",
                target.display()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn cmd_bootstrap(ctx: &Context, opts: &BootstrapOptions) -> Result<ExitCode> {
    let templates_root = ctx.protocol_root().join(TEMPLATES_DIR);

    println!("Bootstrapping AI Protocol into: {}", opts.target.display());
    println!("Source:     {}", templates_root.display());
    println!("Agent name: {}", opts.agent.to_uppercase());
    println!("{}", "-".repeat(40));

    let report = bootstrap(&templates_root, opts)?;

    for file in &report.files {
        match &file.outcome {
            FileOutcome::Created => println!("  Created:          {}", file.dest),
            FileOutcome::Overwritten => println!("  Overwritten:      {}", file.dest),
            FileOutcome::Skipped => println!("  Skipped (exists): {}", file.dest),
            FileOutcome::MissingSource => {
                eprintln!("Warning: source file missing: {}", file.dest)
            }
            FileOutcome::Failed(cause) => eprintln!("Failed to copy {}: {cause}", file.dest),
        }
    }
    if report.substituted {
        println!("  Substituted placeholders in {}", report.agent_file);
    }

    println!("{}", "-".repeat(40));
    println!(
        "Bootstrap Complete! ({} created, {} skipped)",
        report.created(),
        report.skipped()
    );

    let rule = "=".repeat(60);
    println!();
    println!("{rule}");
    println!("NEXT STEPS");
    println!("{rule}");
    println!("1.  Go to your project directory:\n    cd {}", opts.target.display());
    println!("\n2.  (Optional) Customize the context registry if needed:\n    Edit docs/context_registry.json");
    println!("\n3.  Initialize your AI agent with this prompt:");
    println!("{}", "-".repeat(20));
    println!("   \"I have initialized the AI Protocol for this project.");
    println!(
        "    Please read {} to bootstrap your context and confirm you are ready.\"",
        report.agent_file
    );
    println!("{}", "-".repeat(20));
    println!("{rule}");

    Ok(ExitCode::SUCCESS)
}

async fn cmd_validate(ctx: &Context, templates: bool) -> Result<ExitCode> {
    let issues: Vec<Issue> = if templates {
        check_templates(&ctx.protocol_root())?
    } else {
        let root = ctx.repo_root().await;
        let registry = ctx.load_registry(&root)?;
        check_registry(&registry, &root)
    };

    if issues.is_empty() {
        println!("OK: no issues found.");
        return Ok(ExitCode::SUCCESS);
    }

    for issue in &issues {
        println!("{issue}");
    }
    println!("Found {} issue(s).", issues.len());
    Ok(ExitCode::FAILURE)
}

async fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn cmd_config_show() -> Result<ExitCode> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}
