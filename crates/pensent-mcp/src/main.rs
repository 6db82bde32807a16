//! En Pensent MCP server entry point.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use pensent_core::PensReader;
use pensent_mcp::config::resolve_store_path;
use pensent_mcp::protocol::ProtocolHandler;
use pensent_mcp::prompts::PromptRegistry;
use pensent_mcp::resources::ResourceRegistry;
use pensent_mcp::session::PatternSessionManager;
use pensent_mcp::tools::ToolRegistry;
use pensent_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "pensent-mcp",
    about = "MCP server for En Pensent: temporal pattern matching and outcome prediction",
    version
)]
struct Cli {
    /// Path to .pens pattern file.
    #[arg(short, long, global = true)]
    store: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Validate a .pens pattern file.
    Validate,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   pensent-mcp completions bash > ~/.local/share/bash-completion/completions/pensent-mcp
    ///   pensent-mcp completions zsh > ~/.zfunc/_pensent-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },

    /// Launch interactive REPL mode.
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let store_path = resolve_store_path(cli.store.as_deref());
            tracing::info!("En Pensent MCP server");
            tracing::info!("Pattern store: {store_path}");
            let session = PatternSessionManager::open(&store_path)?;
            let session = Arc::new(Mutex::new(session));
            let handler = ProtocolHandler::new(session);
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Validate => {
            let store_path = resolve_store_path(cli.store.as_deref());
            match PensReader::read_from_file(Path::new(&store_path)) {
                Ok(store) => {
                    println!("Valid pattern file: {store_path}");
                    println!("  Patterns: {}", store.count());
                    for (domain, count) in store.domain_counts() {
                        println!("    {:<8} {count}", domain.as_str());
                    }
                    println!("  Sessions: {}", store.session_count);
                }
                Err(e) => {
                    eprintln!("Invalid pattern file: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let capabilities = pensent_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "resources": ResourceRegistry::list_resources()
                    .iter()
                    .map(|r| r.uri.clone())
                    .chain(ResourceRegistry::list_templates().into_iter().map(|t| t.uri_template))
                    .collect::<Vec<_>>(),
                "prompts": PromptRegistry::list_prompts()
                    .into_iter()
                    .map(|p| p.name)
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pensent-mcp", &mut std::io::stdout());
        }

        Commands::Repl => {
            pensent_mcp::repl::run(cli.store.as_deref())?;
        }
    }

    Ok(())
}
