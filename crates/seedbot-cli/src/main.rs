//! Seedbot CLI: chat with the Seedworld whitepaper or the order-details dataset.

mod repl;

use anyhow::{Context, Result};
use clap::Parser;
use seedbot_api::{OpenAiModel, RetryConfig};
use seedbot_config::{CliOverrides, SeedbotConfig};
use seedbot_core::{AgentConfig, AgentEvent, ConversationalAgent, prompts};
use seedbot_history::{HistoryStore, RetentionPolicy};
use seedbot_retrieval::{InMemoryIndex, OpenAiEmbedder, PineconeRetriever, TextSplitter};
use seedbot_tools::{RetrieverTool, ToolRegistry};
use seedbot_types::{KnowledgeBase, Retriever, SeedbotError};
use std::io;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Prefix for every assistant line.
pub(crate) const REPLY_PREFIX: &str = "🌱 Seedbot:";

#[derive(Parser)]
#[command(
    name = "seedbot",
    version,
    about = "Seedbot: ask questions about Seedworld or your order data"
)]
struct Cli {
    /// Send a single message and print the reply (non-interactive)
    #[arg(short, long)]
    print: Option<String>,

    /// Session identifier to use (defaults to a new random one)
    #[arg(long)]
    session: Option<String>,

    /// Model to use
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(long)]
    temperature: Option<f32>,

    /// Knowledge base to answer from: whitepaper or orders
    #[arg(long, value_name = "BASE")]
    knowledge_base: Option<KnowledgeBase>,

    /// API key (overrides OPENAI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    let config = SeedbotConfig::load(CliOverrides {
        api_key: cli.api_key,
        model: cli.model,
        temperature: cli.temperature,
        knowledge_base: cli.knowledge_base,
    })
    .context("Failed to load configuration")?;

    let agent = build_agent(&config).await?;
    let session_id = cli.session.unwrap_or_else(new_session_id);

    if let Some(message) = cli.print {
        let reply = ask(&agent, &session_id, &message).await?;
        println!("{REPLY_PREFIX} {reply}");
        return Ok(());
    }

    repl::run(&agent, &config, session_id).await
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub(crate) fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

async fn build_agent(config: &SeedbotConfig) -> Result<ConversationalAgent> {
    let model = OpenAiModel::new(&config.api_key, &config.api_base_url)
        .context("Failed to create API client")?
        .with_retry_config(RetryConfig {
            max_retries: config.max_retries,
            ..RetryConfig::default()
        });

    let kb = config.knowledge.base;
    let retriever = build_retriever(config).await?;
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(RetrieverTool::for_knowledge_base(kb, retriever)));

    let history = HistoryStore::with_policy(RetentionPolicy {
        max_sessions: config.history.max_sessions,
        idle_ttl: config.history.idle_ttl,
    });

    let agent_config = AgentConfig {
        model: config.model.clone(),
        temperature: Some(config.temperature),
        max_tokens: config.max_tokens,
        system_prompt: prompts::system_prompt(kb).to_string(),
        max_tool_iterations: config.max_tool_iterations,
        request_timeout: config.request_timeout,
    };

    Ok(ConversationalAgent::new(
        Arc::new(model),
        registry,
        Arc::new(history),
        agent_config,
    ))
}

async fn build_retriever(config: &SeedbotConfig) -> Result<Arc<dyn Retriever>> {
    let knowledge = &config.knowledge;
    let embedder = Arc::new(
        OpenAiEmbedder::new(
            &config.api_key,
            &config.api_base_url,
            &knowledge.embedding_model,
        )
        .context("Failed to create embeddings client")?,
    );

    match knowledge.base {
        KnowledgeBase::Whitepaper => {
            let host = knowledge
                .pinecone_host
                .as_deref()
                .context("PINECONE_HOST is not set")?;
            let api_key = knowledge
                .pinecone_api_key
                .as_deref()
                .context("PINECONE_API_KEY is not set")?;
            let retriever = PineconeRetriever::new(host, api_key, embedder)
                .context("Failed to create Pinecone client")?
                .with_top_k(knowledge.top_k);
            tracing::info!(
                index = %knowledge.pinecone_index,
                host = retriever.host(),
                "using pinecone retriever"
            );
            Ok(Arc::new(retriever))
        }
        KnowledgeBase::Orders => {
            let path = knowledge.orders_path();
            let splitter = TextSplitter::new(knowledge.chunk_size, knowledge.chunk_overlap);
            eprintln!("Indexing {}...", path.display());
            let index = InMemoryIndex::from_file(&path, &splitter, embedder)
                .await
                .with_context(|| format!("Failed to index {}", path.display()))?
                .with_top_k(knowledge.top_k);
            Ok(Arc::new(index))
        }
    }
}

/// Answer one message, cancelling the turn if Ctrl+C arrives first.
pub(crate) async fn ask(
    agent: &ConversationalAgent,
    session_id: &str,
    message: &str,
) -> Result<String, SeedbotError> {
    let cancel = CancellationToken::new();
    let finished = CancellationToken::new();
    {
        let cancel = cancel.clone();
        let finished = finished.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => cancel.cancel(),
                _ = finished.cancelled() => {}
            }
        });
    }
    let _stop_watcher = finished.drop_guard();

    agent
        .respond_with(session_id, message, cancel, print_event)
        .await
}

fn print_event(event: AgentEvent) {
    match event {
        AgentEvent::ToolStart { name, input } => {
            eprintln!("  [tool: {name} {input}]");
        }
        AgentEvent::ToolEnd {
            name,
            output,
            is_error,
        } => {
            if is_error {
                eprintln!("  [tool {name} error: {output}]");
            } else {
                tracing::debug!(tool = %name, output = %output, "tool finished");
            }
        }
        AgentEvent::Usage(usage) => {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "turn usage"
            );
        }
        AgentEvent::Cancelled => eprintln!("Cancelled."),
        AgentEvent::Done | AgentEvent::Error(_) => {}
    }
}
