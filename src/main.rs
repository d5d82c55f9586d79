use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url_bibtex::config::{default_config_path, load_config, save_config, ApiKeys, Config};
use url_bibtex::mcp::McpServer;
use url_bibtex::models::{ConvertResponse, HandlerDescriptor, HandlersResponse};
use url_bibtex::Converter;

/// url-bibtex - Convert paper and repository URLs into BibTeX entries
#[derive(Parser, Debug)]
#[command(name = "url-bibtex")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Convert paper, preprint and repository URLs into BibTeX entries", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (BibTeX or table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format (raw BibTeX for conversions)
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Plain,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert one or more URLs to BibTeX
    #[command(alias = "c")]
    Convert {
        /// URLs to convert
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Show which handler would process a URL, without fetching it
    Check {
        /// URL to check
        url: String,
    },

    /// List the registered handlers in dispatch order
    #[command(alias = "ls")]
    Handlers {
        /// Show handler descriptions
        #[arg(long, short)]
        detailed: bool,
    },

    /// Run the MCP server (for Claude Desktop and other MCP clients)
    ///
    /// Speaks MCP over stdio unless --http is given.
    Serve {
        /// Run in streamable HTTP mode instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Write a configuration file with the default settings
    ConfigInit {
        /// Where to write the file (default: the per-user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("url-bibtex - Environment Variables");
    println!();
    println!("API Keys:");
    println!("  SEMANTIC_SCHOLAR_API_KEY    API key for Semantic Scholar (higher rate limits)");
    println!("  GITHUB_TOKEN                GitHub token (higher API rate limits)");
    println!();
    println!("Configuration Overrides (sections separated by '__'):");
    println!("  URL_BIBTEX_HTTP__TIMEOUT_SECS          Request timeout in seconds (default: 30)");
    println!("  URL_BIBTEX_HTTP__CONNECT_TIMEOUT_SECS  Connect timeout in seconds (default: 10)");
    println!("  URL_BIBTEX_HTTP__USER_AGENT            User agent sent with every request");
    println!("  URL_BIBTEX_ENDPOINTS__DOI_RESOLVER     DOI resolver base URL (default: https://doi.org)");
    println!("  URL_BIBTEX_ENDPOINTS__ARXIV_API        arXiv API base URL");
    println!();
    println!("Global Proxy Settings:");
    println!("  HTTP_PROXY                  HTTP proxy URL (e.g., http://proxy:8080)");
    println!("  HTTPS_PROXY                 HTTPS proxy URL (e.g., https://proxy:8080)");
    println!("  NO_PROXY                    Comma-separated list of hosts to bypass proxy");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export GITHUB_TOKEN=\"ghp_...\"");
    println!("  url-bibtex convert https://arxiv.org/abs/2103.15348");
    std::process::exit(0);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
    }

    // Logs go to stderr; stdout carries only BibTeX/JSON
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = if cli.quiet { "error" } else { log_level };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("url_bibtex={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    let converter = Converter::with_default_handlers(&config)?;

    match command {
        Commands::Convert { urls } => {
            let mut responses = Vec::with_capacity(urls.len());
            for url in &urls {
                let response = converter.convert_response(url).await;
                if let Some(error) = &response.error {
                    tracing::error!("{}: {}", url, error);
                }
                responses.push(response);
            }

            output_conversions(&converter, &responses, cli.output)?;

            let failed = responses.iter().filter(|r| !r.success).count();
            if failed > 0 {
                anyhow::bail!("{} of {} URLs could not be converted", failed, urls.len());
            }
        }

        Commands::Check { url } => {
            let handler = converter.handler_for(&url).map(|h| h.descriptor());
            match cli.output.resolve() {
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "url": &url,
                        "supported": handler.is_some(),
                        "handler": &handler,
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                _ => match &handler {
                    Some(h) => println!("{} -> {} ({})", url, h.id, h.name),
                    None => println!("{} -> no handler", url),
                },
            }
            if handler.is_none() {
                anyhow::bail!("No handler found for URL: {}", url);
            }
        }

        Commands::Handlers { detailed } => {
            output_handlers(converter.list_handlers(), detailed, cli.output)?;
        }

        Commands::Serve { http, port, host } => {
            let server = McpServer::new(converter)?;

            if http {
                let addr = format!("{}:{}", host, port);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                server.run().await?;
            }
        }

        Commands::ConfigInit { path, force } => {
            init_config(path, force, cli.quiet)?;
        }
    }

    Ok(())
}

/// Write the default configuration, without API keys taken from the environment
fn init_config(path: Option<PathBuf>, force: bool, quiet: bool) -> Result<()> {
    let path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => anyhow::bail!("Could not determine a config directory; pass a PATH"),
    };

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let config = Config {
        api_keys: ApiKeys {
            semantic_scholar: None,
            github_token: None,
        },
        ..Config::default()
    };
    save_config(&config, &path)?;

    if !quiet {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}

fn output_conversions(
    converter: &Converter,
    responses: &[ConvertResponse],
    format: OutputFormat,
) -> Result<()> {
    match format.resolve() {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(responses)?);
        }
        OutputFormat::Plain | OutputFormat::Auto => {
            let entries: Vec<&str> = responses
                .iter()
                .filter_map(|r| r.bibtex.as_deref())
                .collect();
            println!("{}", entries.join("\n\n"));
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Color, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["URL", "Handler", "Result"]);

            for response in responses {
                let handler = converter
                    .handler_for(&response.url)
                    .map(|h| h.id().to_string())
                    .unwrap_or_else(|| "-".to_string());

                let result = match (&response.bibtex, &response.error) {
                    (Some(bibtex), _) => Cell::new(bibtex.lines().next().unwrap_or_default())
                        .fg(Color::Green),
                    (None, Some(error)) => Cell::new(error).fg(Color::Red),
                    (None, None) => Cell::new(""),
                };

                table.add_row(vec![
                    Cell::new(&response.url).add_attribute(Attribute::Bold),
                    Cell::new(handler),
                    result,
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

fn output_handlers(
    handlers: Vec<HandlerDescriptor>,
    detailed: bool,
    format: OutputFormat,
) -> Result<()> {
    let format = match format {
        OutputFormat::Auto if std::io::stdout().is_terminal() => OutputFormat::Table,
        other => other.resolve(),
    };

    match format {
        OutputFormat::Json => {
            let response = HandlersResponse::from(handlers);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);

            let mut header = vec!["#", "ID", "Name"];
            if detailed {
                header.push("Description");
            }
            table.set_header(header);

            for (i, handler) in handlers.iter().enumerate() {
                let mut row = vec![
                    Cell::new(i + 1),
                    Cell::new(&handler.id).add_attribute(Attribute::Bold),
                    Cell::new(&handler.name),
                ];
                if detailed {
                    row.push(Cell::new(&handler.description));
                }
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Plain | OutputFormat::Auto => {
            for handler in &handlers {
                if detailed {
                    println!("{} ({})", handler.name, handler.id);
                    println!("  {}", handler.description);
                } else {
                    println!("{} - {}", handler.id, handler.name);
                }
            }
        }
    }
    Ok(())
}
