//! waterdesk - support chatbot API for water treatment plant operations.
//!
//! Hybrid retrieval (vector similarity with a BM25 fallback) over a
//! file-based corpus, behind a guarded answer pipeline:
//! Guardrail -> Route -> Generate -> Judge -> Respond. Every optional
//! capability (embeddings, generation, classification, validation) degrades
//! gracefully when absent or failing.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::AppState;
use domain::embedding::EmbeddingProvider;
use domain::generation::GenerationProvider;
use domain::memory::SessionMemory;
use domain::retrieval::ContextRetriever;
use domain::routing::RouteClassifier;
use domain::validation::ValidationProvider;
use infrastructure::classifier::ModelRouteClassifier;
use infrastructure::corpus::CorpusStore;
use infrastructure::embedding::OpenAiEmbeddingProvider;
use infrastructure::generation::{HttpClient, OpenAiGenerationProvider};
use infrastructure::memory::InMemorySessionMemory;
use infrastructure::pipeline::ChatPipeline;
use infrastructure::retrieval::HybridRetriever;
use infrastructure::router::CascadeRouter;
use infrastructure::specialists::{
    FaqSpecialist, RagSpecialist, Specialist, SpecialistProfile, SpecialistRegistry,
};
use infrastructure::validation::{FallbackValidator, ModelValidator, ValidatorRole};

/// Wire the whole service from configuration.
///
/// With no API key configured every model-backed capability is absent:
/// retrieval stays lexical, specialists answer with deterministic snippets,
/// and both validators fail open. The service still serves traffic.
pub fn build_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let providers = &config.providers;
    let timeout = providers.timeout();

    let store = Arc::new(CorpusStore::new(
        &config.corpus.path,
        config.corpus.chunking(),
    )?);

    let (generation, embedder): (
        Option<Arc<dyn GenerationProvider>>,
        Option<Arc<dyn EmbeddingProvider>>,
    ) = match &providers.api_key {
        Some(api_key) => {
            let client = Arc::new(HttpClient::new(timeout)?);
            let generation = OpenAiGenerationProvider::with_base_url(
                client.clone(),
                api_key.as_str(),
                providers.base_url.as_str(),
            );
            let embedder = OpenAiEmbeddingProvider::with_base_url(
                client,
                api_key.as_str(),
                providers.embedding_model.as_str(),
                providers.base_url.as_str(),
            );
            (Some(Arc::new(generation) as _), Some(Arc::new(embedder) as _))
        }
        None => {
            info!("no provider API key configured; running fully degraded");
            (None, None)
        }
    };

    let retriever: Arc<dyn ContextRetriever> = Arc::new(HybridRetriever::new(
        store,
        embedder,
        config.retrieval.clone(),
    ));
    let memory: Arc<dyn SessionMemory> = Arc::new(InMemorySessionMemory::new());

    let classifier: Option<Arc<dyn RouteClassifier>> = generation.as_ref().map(|provider| {
        Arc::new(ModelRouteClassifier::new(
            provider.clone(),
            providers.router_model(),
        )) as _
    });

    let router = Arc::new(CascadeRouter::new(
        retriever.clone(),
        classifier,
        memory.clone(),
        config.retrieval.clone(),
        timeout,
    ));

    let guardrail = validator_chain(&generation, providers, ValidatorRole::Guardrail, timeout);
    let judge = validator_chain(&generation, providers, ValidatorRole::Judge, timeout);

    let assistant: Arc<dyn Specialist> = Arc::new(RagSpecialist::new(
        SpecialistProfile::assistant(),
        retriever.clone(),
        generation.clone(),
        memory.clone(),
        providers.chat_model.as_str(),
        config.retrieval.top_k,
        timeout,
    ));
    let technical: Arc<dyn Specialist> = Arc::new(RagSpecialist::new(
        SpecialistProfile::technical(),
        retriever.clone(),
        generation.clone(),
        memory.clone(),
        providers.chat_model.as_str(),
        config.retrieval.top_k,
        timeout,
    ));
    let organizational: Arc<dyn Specialist> = Arc::new(RagSpecialist::new(
        SpecialistProfile::organizational(),
        retriever.clone(),
        generation.clone(),
        memory.clone(),
        providers.chat_model.as_str(),
        config.retrieval.top_k,
        timeout,
    ));
    let faq = Arc::new(FaqSpecialist::new(
        retriever,
        generation,
        providers.chat_model.as_str(),
        config.retrieval.overlap_ratio,
        timeout,
    ));

    let specialists = SpecialistRegistry::new(
        vec![assistant, technical, organizational, faq.clone()],
        faq,
    );

    let pipeline = Arc::new(ChatPipeline::new(
        guardrail,
        judge,
        router,
        specialists,
        memory,
    ));

    Ok(AppState::new(pipeline))
}

/// Ordered model-backed backends for one validator role; empty - and
/// therefore fail-open - without a generation provider.
fn validator_chain(
    generation: &Option<Arc<dyn GenerationProvider>>,
    providers: &config::ProvidersConfig,
    role: ValidatorRole,
    timeout: std::time::Duration,
) -> FallbackValidator {
    let backends: Vec<Arc<dyn ValidationProvider>> = match generation {
        Some(provider) => {
            let preferred = match role {
                ValidatorRole::Guardrail => providers.guardrail_model(),
                ValidatorRole::Judge => providers.judge_model(),
            };
            providers
                .validation_candidates(preferred)
                .into_iter()
                .map(|model| {
                    Arc::new(ModelValidator::new(provider.clone(), model, role)) as _
                })
                .collect()
        }
        None => Vec::new(),
    };

    FallbackValidator::new(backends, timeout)
}
