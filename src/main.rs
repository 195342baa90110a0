use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monorepo_rag::mcp_server::{RagMcpServer, format_list_text, format_query_text};
use monorepo_rag::{Config, DocType, IngestRequest, QueryRequest, RagClient};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "monorepo-rag", version, about = "Incremental RAG index over a project monorepo")]
struct Cli {
    /// Path to a TOML config file (defaults to the platform config dir)
    #[arg(long, global = true, env = "MONOREPO_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Project root the scanned directories are resolved against
    #[arg(long, global = true)]
    project_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the MCP tools over stdio (default)
    Serve,
    /// Index changed files, or everything with --force-rebuild
    Ingest {
        /// Clear the collection and the tracker before indexing
        #[arg(long)]
        force_rebuild: bool,
    },
    /// Print the chunks most similar to a query
    Query {
        text: String,
        /// Number of chunks (defaults to search.top_k from the config)
        #[arg(long)]
        top_k: Option<usize>,
        /// Only keep chunks of this type
        #[arg(long = "type")]
        doc_type: Option<DocType>,
    },
    /// Print an LLM prompt with retrieved project context
    Prompt {
        text: String,
        /// Number of chunks (defaults to search.top_k from the config)
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long = "type")]
        doc_type: Option<DocType>,
    },
    /// Print what is currently indexed
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(root) = cli.project_root {
        config.project.root = root;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => RagMcpServer::serve_stdio(config).await?,
        Command::Ingest { force_rebuild } => {
            let client = RagClient::with_config(config).await?;

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, stopping after the current file");
                    on_signal.cancel();
                }
            });

            let response = client
                .ingest_with_cancel(IngestRequest { force_rebuild }, cancel)
                .await;
            client.flush().await?;

            match (response.ok, response.message, response.error) {
                (true, message, _) => {
                    println!("{}", message.unwrap_or_else(|| "Indexing completed".into()));
                    if let Some(report) = response.report {
                        for error in &report.errors {
                            eprintln!("  {}", error);
                        }
                    }
                }
                (false, _, error) => {
                    anyhow::bail!("{}", error.unwrap_or_else(|| "Unknown error".into()))
                }
            }
        }
        Command::Query {
            text,
            top_k,
            doc_type,
        } => {
            let top_k = top_k.unwrap_or(config.search.top_k);
            let client = RagClient::with_config(config).await?;
            let response = client
                .query(
                    QueryRequest::new(text)
                        .with_top_k(top_k)
                        .with_type_filter(doc_type),
                )
                .await;
            if let Some(error) = response.error {
                anyhow::bail!(error);
            }
            print!("{}", format_query_text(&response.chunks));
        }
        Command::Prompt {
            text,
            top_k,
            doc_type,
        } => {
            let client = RagClient::with_config(config).await?;
            let prompt = client.build_prompt(&text, top_k, doc_type).await?;
            print!("{}", prompt);
        }
        Command::List => {
            let client = RagClient::with_config(config).await?;
            let response = client.list_documents().await;
            if let Some(error) = response.error {
                anyhow::bail!(error);
            }
            print!("{}", format_list_text(&response));
        }
    }

    Ok(())
}
