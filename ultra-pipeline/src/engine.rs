//! The three-stage analysis state machine described in `SPEC_FULL.md`
//! §4.5: Initial → Meta → Ultra, each stage a concurrent fan-out over
//! `tokio::task::JoinSet`, bounded by its own deadline inside the
//! pipeline's overall deadline.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use tokio::task::JoinSet;
use ultra_config::PipelineConfig;
use ultra_core::{HealthStatus, ModelOutput, OutputStatus, ProviderHealth, ProviderKind};
use ultra_progress::{ProgressBus, ProgressKind};
use ultra_providers::Provider;
use ultra_registry::Registry;

use crate::request::PipelineRequest;
use crate::result::{PipelineFailureReason, PipelineOutcome, PipelineResult, Stage, StageResult};
use crate::templates::{meta_prompt, ultra_prompt};

/// Everything the engine needs to run one request, assembled once at
/// startup and shared (by reference) across every concurrent execution.
pub struct PipelineDeps {
    pub registry: Arc<Registry>,
    pub providers: HashMap<ProviderKind, Arc<dyn Provider>>,
    /// Health snapshot taken once at dispatch time; the synthesizer
    /// selection policy reads it but the engine never re-probes.
    pub health: HashMap<ProviderKind, ProviderHealth>,
    pub progress: Arc<ProgressBus>,
    pub config: PipelineConfig,
}

/// Stateless entry point: `run` owns no data between calls, every
/// execution is independent.
pub struct Engine;

impl Engine {
    /// Execute the full pipeline for `request` over `admitted_model_ids`
    /// (already filtered by the readiness gate — the engine does not
    /// re-check availability).
    ///
    /// # Panics
    ///
    /// Never panics in normal operation; adapter panics are caught by
    /// `JoinSet` and surfaced as a failed attempt for that model.
    #[tracing::instrument(skip_all, fields(correlation_id = %request.correlation_id, model_count = admitted_model_ids.len()))]
    pub async fn run(request: &PipelineRequest, admitted_model_ids: Vec<String>, deps: &PipelineDeps) -> PipelineResult {
        let correlation_id = request.correlation_id.clone();
        let overall_deadline = Instant::now() + Duration::from_secs(deps.config.pipeline_total_deadline_seconds);

        let initial = Self::run_stage(
            Stage::Initial,
            &admitted_model_ids,
            deps,
            &correlation_id,
            deps.config.initial_stage_deadline_seconds,
            overall_deadline,
            |_model_id| request.prompt.clone(),
        )
        .await;

        let succeeded_initial: HashSet<String> = success_ids(&initial);
        let mut failed = failure_reasons(&initial);

        if succeeded_initial.is_empty() {
            return Self::terminal_failure(
                correlation_id,
                deps,
                PipelineFailureReason::InitialAllFailed,
                initial,
                None,
                None,
                succeeded_initial,
                failed,
            );
        }

        if Instant::now() >= overall_deadline {
            return Self::terminal_failure(correlation_id, deps, PipelineFailureReason::DeadlineExceeded, initial, None, None, succeeded_initial, failed);
        }

        let meta = if succeeded_initial.len() >= 2 {
            let inputs: BTreeMap<String, String> = candidate_texts(&initial, &succeeded_initial);
            let prompt = meta_prompt(&request.prompt, &inputs);
            let model_ids: Vec<String> = succeeded_initial.iter().cloned().collect();
            Some(
                Self::run_stage(
                    Stage::Meta,
                    &model_ids,
                    deps,
                    &correlation_id,
                    deps.config.meta_stage_deadline_seconds,
                    overall_deadline,
                    move |_model_id| prompt.clone(),
                )
                .await,
            )
        } else {
            None
        };

        if let Some(stage) = &meta {
            failed.extend(failure_reasons(stage));
        }

        // Synthesis draws on Meta's successes when Meta ran and produced
        // at least one; otherwise it falls back to Stage 1's successes
        // (covers both "Meta skipped" and "Meta ran but every call failed").
        let meta_succeeded = meta.as_ref().map(success_ids).filter(|ids| !ids.is_empty());
        let (synthesis_source, synthesis_candidates): (&StageResult, HashSet<String>) = match &meta_succeeded {
            Some(ids) => (meta.as_ref().expect("meta present when meta_succeeded is Some"), ids.clone()),
            None => (&initial, succeeded_initial.clone()),
        };

        if Instant::now() >= overall_deadline {
            return Self::terminal_failure(
                correlation_id,
                deps,
                PipelineFailureReason::DeadlineExceeded,
                initial,
                meta,
                None,
                synthesis_candidates,
                failed,
            );
        }

        let inputs = candidate_texts(synthesis_source, &synthesis_candidates);
        let prompt = ultra_prompt(&request.prompt, &inputs);
        let order = synthesizer_order(&synthesis_candidates, &deps.registry, &deps.health);

        let ultra = Self::run_synthesis(&correlation_id, deps, overall_deadline, &order, &prompt).await;

        match ultra {
            Some(stage) => {
                deps.progress.publish(&correlation_id, ProgressKind::PipelineCompleted);
                PipelineResult {
                    correlation_id,
                    outcome: PipelineOutcome::Success,
                    initial,
                    meta,
                    ultra: Some(stage),
                    succeeded_models: synthesis_candidates,
                    failed_models: failed,
                }
            }
            None => Self::terminal_failure(
                correlation_id,
                deps,
                PipelineFailureReason::SynthesisFailed,
                initial,
                meta,
                None,
                synthesis_candidates,
                failed,
            ),
        }
    }

    fn terminal_failure(
        correlation_id: String,
        deps: &PipelineDeps,
        reason: PipelineFailureReason,
        initial: StageResult,
        meta: Option<StageResult>,
        ultra: Option<StageResult>,
        succeeded_models: HashSet<String>,
        failed_models: HashMap<String, String>,
    ) -> PipelineResult {
        deps.progress.publish(&correlation_id, ProgressKind::PipelineFailed { reason: reason.as_str().to_owned() });
        PipelineResult { correlation_id, outcome: PipelineOutcome::Failed(reason), initial, meta, ultra, succeeded_models, failed_models }
    }

    /// Stage 3 is a fan-out of at most one live call at a time: try the
    /// highest-priority synthesizer candidate, fall through to the next
    /// on failure, stop at the first success or when candidates run out.
    async fn run_synthesis(
        correlation_id: &str,
        deps: &PipelineDeps,
        overall_deadline: Instant,
        order: &[String],
        prompt: &str,
    ) -> Option<StageResult> {
        let started_at = OffsetDateTime::now_utc();
        deps.progress.publish(correlation_id, ProgressKind::StageStarted { stage: Stage::Ultra.as_str().to_owned() });

        let stage_budget = Duration::from_secs(deps.config.ultra_stage_deadline_seconds);
        let remaining = overall_deadline.saturating_duration_since(Instant::now());
        let deadline = Instant::now() + stage_budget.min(remaining);

        let mut per_model_outputs = HashMap::new();
        let mut aggregate_text = None;

        for model_id in order {
            if Instant::now() >= deadline {
                break;
            }
            let Some(descriptor) = deps.registry.resolve(model_id) else { continue };
            let Some(provider) = deps.providers.get(&descriptor.provider).cloned() else { continue };

            let call_deadline = deadline.min(Instant::now() + stage_budget);
            let mut output = provider.generate(&descriptor.vendor_model_name, prompt, call_deadline).await;
            output.model_id = model_id.clone();

            if output.is_success() {
                deps.progress.publish(
                    correlation_id,
                    ProgressKind::ModelResponded { stage: Stage::Ultra.as_str().to_owned(), model_id: model_id.clone(), latency_ms: output.latency_ms },
                );
                aggregate_text = Some(output.text.clone());
                per_model_outputs.insert(model_id.clone(), output);
                break;
            }

            deps.progress.publish(
                correlation_id,
                ProgressKind::ModelFailed {
                    stage: Stage::Ultra.as_str().to_owned(),
                    model_id: model_id.clone(),
                    reason: output.error_detail.clone().unwrap_or_default(),
                },
            );
            per_model_outputs.insert(model_id.clone(), output);
        }

        let ended_at = OffsetDateTime::now_utc();
        let success_count = usize::from(aggregate_text.is_some());
        let failure_count = per_model_outputs.len() - success_count;
        deps.progress.publish(correlation_id, ProgressKind::StageCompleted { stage: Stage::Ultra.as_str().to_owned(), success_count, failure_count });

        aggregate_text.as_ref()?;
        Some(StageResult { stage: Stage::Ultra, per_model_outputs, aggregate_text, started_at, ended_at })
    }

    /// Fan out one call per model in `model_ids`, wait for every task to
    /// settle or for the stage deadline (clamped to the pipeline's
    /// overall deadline) to expire, whichever comes first.
    async fn run_stage(
        stage: Stage,
        model_ids: &[String],
        deps: &PipelineDeps,
        correlation_id: &str,
        stage_deadline_seconds: u64,
        overall_deadline: Instant,
        prompt_for: impl Fn(&str) -> String,
    ) -> StageResult {
        let started_at = OffsetDateTime::now_utc();
        tracing::info!(%correlation_id, stage = stage.as_str(), model_count = model_ids.len(), "stage starting");
        deps.progress.publish(correlation_id, ProgressKind::StageStarted { stage: stage.as_str().to_owned() });

        let stage_budget = Duration::from_secs(stage_deadline_seconds);
        let remaining = overall_deadline.saturating_duration_since(Instant::now());
        let effective_budget = stage_budget.min(remaining);
        let deadline = Instant::now() + effective_budget;

        let mut per_model_outputs: HashMap<String, ModelOutput> = HashMap::new();
        let mut join_set: JoinSet<(String, ModelOutput)> = JoinSet::new();

        for model_id in model_ids {
            let Some(descriptor) = deps.registry.resolve(model_id) else {
                per_model_outputs.insert(model_id.clone(), skipped_output(model_id, "model not registered"));
                continue;
            };
            let Some(provider) = deps.providers.get(&descriptor.provider).cloned() else {
                per_model_outputs.insert(model_id.clone(), skipped_output(model_id, "no adapter registered for provider"));
                continue;
            };

            let vendor_model_name = descriptor.vendor_model_name.clone();
            let prompt = prompt_for(model_id);
            let model_id = model_id.clone();
            join_set.spawn(async move {
                let mut output = provider.generate(&vendor_model_name, &prompt, deadline).await;
                output.model_id = model_id.clone();
                (model_id, output)
            });
        }

        let sleep = tokio::time::sleep(deadline.saturating_duration_since(Instant::now()));
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => {
                    join_set.abort_all();
                    while join_set.join_next().await.is_some() {}
                    break;
                }
                joined = join_set.join_next() => {
                    match joined {
                        None => break,
                        Some(Ok((model_id, output))) => {
                            Self::emit_model_outcome(deps, correlation_id, stage, &model_id, &output);
                            per_model_outputs.insert(model_id, output);
                        }
                        Some(Err(_join_error)) => {}
                    }
                }
            }
        }

        for model_id in model_ids {
            per_model_outputs.entry(model_id.clone()).or_insert_with(|| {
                let output = timed_out_output(model_id, effective_budget);
                Self::emit_model_outcome(deps, correlation_id, stage, model_id, &output);
                output
            });
        }

        let ended_at = OffsetDateTime::now_utc();
        let success_count = per_model_outputs.values().filter(|o| o.is_success()).count();
        let failure_count = per_model_outputs.len() - success_count;
        tracing::info!(%correlation_id, stage = stage.as_str(), success_count, failure_count, "stage settled");
        deps.progress.publish(correlation_id, ProgressKind::StageCompleted { stage: stage.as_str().to_owned(), success_count, failure_count });

        StageResult { stage, per_model_outputs, aggregate_text: None, started_at, ended_at }
    }

    fn emit_model_outcome(deps: &PipelineDeps, correlation_id: &str, stage: Stage, model_id: &str, output: &ModelOutput) {
        if output.is_success() {
            deps.progress.publish(
                correlation_id,
                ProgressKind::ModelResponded { stage: stage.as_str().to_owned(), model_id: model_id.to_owned(), latency_ms: output.latency_ms },
            );
        } else {
            deps.progress.publish(
                correlation_id,
                ProgressKind::ModelFailed {
                    stage: stage.as_str().to_owned(),
                    model_id: model_id.to_owned(),
                    reason: output.error_detail.clone().unwrap_or_default(),
                },
            );
        }
    }
}

fn skipped_output(model_id: &str, reason: &str) -> ModelOutput {
    ModelOutput { model_id: model_id.to_owned(), text: String::new(), status: OutputStatus::Skipped, latency_ms: 0, error_detail: Some(reason.to_owned()) }
}

fn timed_out_output(model_id: &str, elapsed_budget: Duration) -> ModelOutput {
    ModelOutput {
        model_id: model_id.to_owned(),
        text: String::new(),
        status: OutputStatus::TimedOut,
        latency_ms: u64::try_from(elapsed_budget.as_millis()).unwrap_or(u64::MAX),
        error_detail: Some("stage deadline exceeded".to_owned()),
    }
}

fn success_ids(stage: &StageResult) -> HashSet<String> {
    stage.per_model_outputs.iter().filter(|(_, o)| o.is_success()).map(|(id, _)| id.clone()).collect()
}

fn failure_reasons(stage: &StageResult) -> HashMap<String, String> {
    stage
        .per_model_outputs
        .iter()
        .filter(|(_, o)| !o.is_success())
        .map(|(id, o)| (id.clone(), failure_reason_code(o.status).to_owned()))
        .collect()
}

/// Maps an [`OutputStatus`] to the `failed_models` taxonomy code from
/// `spec.md` §7 — the vendor-specific text stays in `error_detail`.
const fn failure_reason_code(status: OutputStatus) -> &'static str {
    match status {
        OutputStatus::Success => "success",
        OutputStatus::Failed => "adapter_vendor_error",
        OutputStatus::TimedOut => "timed_out",
        OutputStatus::Skipped => "skipped",
    }
}

fn candidate_texts(stage: &StageResult, ids: &HashSet<String>) -> BTreeMap<String, String> {
    stage
        .per_model_outputs
        .iter()
        .filter(|(id, o)| ids.contains(*id) && o.is_success())
        .map(|(id, o)| (id.clone(), o.text.clone()))
        .collect()
}

/// Priority order for the Ultra-stage synthesizer: models whose provider
/// is currently `healthy`, sorted by model_id, followed by every other
/// successful model, also sorted by model_id. Trying candidates in this
/// order and falling through on failure implements the §4.5 selection
/// policy for both the initial pick and its fallback on synthesis failure.
fn synthesizer_order(candidates: &HashSet<String>, registry: &Registry, health: &HashMap<ProviderKind, ProviderHealth>) -> Vec<String> {
    let mut healthy: Vec<String> = Vec::new();
    let mut rest: Vec<String> = Vec::new();

    for model_id in candidates {
        let is_healthy = registry
            .resolve(model_id)
            .and_then(|d| health.get(&d.provider))
            .is_some_and(|h| matches!(h.status, HealthStatus::Healthy));
        if is_healthy {
            healthy.push(model_id.clone());
        } else {
            rest.push(model_id.clone());
        }
    }

    healthy.sort();
    rest.sort();
    healthy.into_iter().chain(rest).collect()
}
