//! Application layer for counsel
//!
//! Use cases orchestrating the advisory pipeline, plus the ports
//! (interfaces) that infrastructure adapters implement:
//!
//! - [`CouncilEngine`] — one generate → anonymize → critique → consensus →
//!   synthesize protocol run over the [`ModelGateway`] port
//! - [`AgentRegistry`] — the closed set of advisory agents
//! - [`TaskQueue`] — durable, retryable execution on a bounded worker pool
//! - [`Orchestrator`] — the surface callers use (submit / run / status /
//!   subscribe)

pub mod ports;
pub mod queue;
pub mod use_cases;

pub use ports::{
    context_provider::{ContextProvider, ContextQuery, NoContext},
    event_bus::EventBus,
    model_gateway::{Completion, CompletionRequest, GatewayError, ModelGateway},
    pii_guard::{PiiGuard, PiiMapping, Sanitized},
    query_cache::QueryCache,
    response_cleaner::ResponseCleaner,
    task_store::{StoreError, TaskStore},
};
pub use queue::{QueueConfig, QueueError, RetryPolicy, TaskQueue};
pub use use_cases::{
    advisors::{AdvisorError, AdvisoryAgent, AgentRegistry, CouncilAdvisor},
    orchestrator::{Orchestrator, OrchestratorError, TaskWatch},
    run_council::{CouncilEngine, CouncilError, CouncilSettings},
    run_pipeline::{PipelineError, PipelineRunner},
};
