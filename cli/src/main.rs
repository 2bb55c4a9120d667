//! CLI entrypoint for counsel
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod args;

use anyhow::{Context, Result, bail};
use args::{Cli, Command};
use clap::Parser;
use counsel_application::{
    AgentRegistry, ContextProvider, CouncilAdvisor, CouncilEngine, EventBus, NoContext,
    Orchestrator, PiiGuard, PipelineRunner, ResponseCleaner, TaskQueue, TaskStore, TaskWatch,
};
use counsel_application::ports::pii_guard::NoPiiGuard;
use counsel_domain::{AgentDomain, AgentInput, Task, TaskId};
use counsel_infrastructure::{
    CachedContextProvider, ConfigLoader, FileConfig, HttpContextProvider, HttpModelGateway,
    HttpResearchProvider, InMemoryBufferStore, InMemoryQueryCache, JsonTaskStore, RegexPiiGuard,
    SanitizingResponseCleaner, StreamingBus,
    gateway::circuit::CircuitBreakerSettings,
};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if matches!(cli.command, Command::ConfigSources) {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            eprintln!("config error: {problem}");
        }
        bail!("invalid configuration ({} problem(s))", problems.len());
    }

    info!("Starting counsel");
    let orchestrator = build_orchestrator(&config).await?;

    match cli.command {
        Command::Run {
            domain,
            question,
            documents,
            identifiers,
            json,
        } => {
            let domain: AgentDomain = domain.parse()?;
            let input = build_input(question, &documents, identifiers)?;
            let task = orchestrator.run(domain, input).await?;
            print_task(&task, json)?;
            orchestrator.shutdown().await;
        }
        Command::Submit {
            domain,
            question,
            documents,
            identifiers,
        } => {
            let domain: AgentDomain = domain.parse()?;
            let input = build_input(question, &documents, identifiers)?;
            let id = orchestrator.submit(domain, input).await?;
            println!("{id}");
            // The pending record is already persisted; an interrupted
            // attempt is requeued and recovered on the next invocation
            orchestrator.shutdown().await;
        }
        Command::Status { task_id, json } => {
            let task = orchestrator.status(&TaskId::new(task_id)).await?;
            print_task(&task, json)?;
            orchestrator.shutdown().await;
        }
        Command::Watch { task_id } => {
            // TODO: following a live task started by another process needs
            // a shared BufferStore implementation behind the bus
            match orchestrator.watch(&TaskId::new(task_id)).await? {
                TaskWatch::Finished(task) => print_task(&task, true)?,
                TaskWatch::Live(mut events) => {
                    while let Some(event) = events.next().await {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                }
            }
            orchestrator.shutdown().await;
        }
        Command::ConfigSources => unreachable!("handled above"),
    }

    Ok(())
}

/// Wire every adapter into an orchestrator per the loaded config
async fn build_orchestrator(config: &FileConfig) -> Result<Orchestrator> {
    let endpoints = config.backends.resolve();
    if endpoints.len() < config.council.min_models {
        bail!(
            "{} backend(s) have usable credentials but council.min_models is {}",
            endpoints.len(),
            config.council.min_models
        );
    }

    let gateway = Arc::new(
        HttpModelGateway::new(endpoints, CircuitBreakerSettings::default())
            .map_err(|e| anyhow::anyhow!("gateway init failed: {e}"))?,
    );
    let engine = Arc::new(CouncilEngine::new(gateway, config.council.to_settings()));

    let context: Arc<dyn ContextProvider> = match &config.context.endpoint {
        Some(endpoint) => Arc::new(CachedContextProvider::new(
            Arc::new(HttpContextProvider::new(
                endpoint.clone(),
                config.context.timeout(),
            )),
            Arc::new(InMemoryQueryCache::new()),
            config.context.cache_ttl(),
        )),
        None => Arc::new(NoContext),
    };

    let cleaner: Arc<dyn ResponseCleaner> = Arc::new(SanitizingResponseCleaner::new());
    let pii: Arc<dyn PiiGuard> = if config.guard.enabled {
        Arc::new(RegexPiiGuard::new())
    } else {
        Arc::new(NoPiiGuard)
    };
    let mut registry =
        AgentRegistry::with_all_domains(Arc::clone(&engine), context, Arc::clone(&cleaner));
    // Competitor advice depends on what the market looks like today, so
    // that domain reads from the live research endpoint when one is set
    if let Some(endpoint) = &config.context.research_endpoint {
        let research: Arc<dyn ContextProvider> = Arc::new(CachedContextProvider::new(
            Arc::new(HttpResearchProvider::new(
                endpoint.clone(),
                config.context.timeout(),
            )),
            Arc::new(InMemoryQueryCache::new()),
            config.context.cache_ttl(),
        ));
        registry.register(Arc::new(CouncilAdvisor::new(
            AgentDomain::Competitor,
            engine,
            research,
            cleaner,
        )));
    }
    let registry = Arc::new(registry);

    let bus: Arc<dyn EventBus> = Arc::new(StreamingBus::new(
        Arc::new(InMemoryBufferStore::new(config.streaming.to_settings())),
        config.streaming.to_settings(),
    ));
    let runner = Arc::new(PipelineRunner::new(registry, pii, Arc::clone(&bus)));

    let store: Arc<dyn TaskStore> =
        Arc::new(JsonTaskStore::open(config.store.resolved_dir()).await?);
    let queue = TaskQueue::start(
        Arc::clone(&store),
        runner,
        Arc::clone(&bus),
        config.queue.to_config(),
    )
    .await?;

    Ok(Orchestrator::new(queue, store, bus))
}

fn build_input(
    question: String,
    documents: &[PathBuf],
    identifiers: Vec<String>,
) -> Result<AgentInput> {
    let mut input = AgentInput::new(question);
    for path in documents {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading document {}", path.display()))?;
        input = input.with_document(content);
    }
    for identifier in identifiers {
        input = input.with_identifier(identifier);
    }
    Ok(input)
}

fn print_task(task: &Task, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
        return Ok(());
    }

    println!("task:    {}", task.id);
    println!("domain:  {}", task.agent_domain);
    println!("status:  {}", task.status);
    println!("attempts: {}", task.attempts);
    if let Some(error) = &task.error {
        println!("error:   {error}");
    }
    if let Some(result) = task.phase_result(counsel_domain::Phase::Final) {
        println!(
            "confidence: {:.0}%",
            result.output.confidence * 100.0
        );
        println!();
        println!("{}", result.output.content);
    }
    Ok(())
}
