//! Run orchestration: fetch, then quick metadata and analysis in parallel, then mapper and combine.
//!
//! Every run owns its state; nothing survives between runs except what callers keep.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::analysis::{self, CombineInput};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::fetch::{self, ContentFetcher};
use crate::history::{now_unix, RunHistory, RunRecord};
use crate::llm::LlmSet;
use crate::model::{AnalysisRequest, CombinedResult};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("webs_runs_total", "Workflow runs by outcome.");
        describe_histogram!("webs_run_ms", "Workflow run time in milliseconds.");
    });
}

/// Where a run currently is. `Failed` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Fetch,
    Branches,
    Mapper,
    Combine,
    Done,
    Failed,
}

impl WorkflowState {
    /// Step name used in timeout errors.
    pub fn step_name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Branches => "analysis",
            Self::Mapper => "mapper",
            Self::Combine => "combine",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    QuickMetadata,
    Analysis,
    Mapper,
    Combine,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::QuickMetadata => "quick-metadata",
            Self::Analysis => "analysis",
            Self::Mapper => "mapper",
            Self::Combine => "combine",
        })
    }
}

/// Completed steps in execution order. Each step may be recorded once.
#[derive(Debug, Default)]
pub struct StepLedger {
    done: Vec<Step>,
}

impl StepLedger {
    pub fn record(&mut self, step: Step) -> PipelineResult<()> {
        if self.done.contains(&step) {
            return Err(PipelineError::State(format!("step `{step}` recorded twice")));
        }
        self.done.push(step);
        Ok(())
    }

    pub fn steps(&self) -> Vec<String> {
        self.done.iter().map(ToString::to_string).collect()
    }
}

/// Orchestrates one analysis run over injected fetcher and models.
#[derive(Clone)]
pub struct Workflow {
    fetcher: Arc<dyn ContentFetcher>,
    llms: LlmSet,
    cfg: PipelineConfig,
    history: Option<Arc<RunHistory>>,
}

impl Workflow {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, llms: LlmSet, cfg: PipelineConfig) -> Self {
        Self {
            fetcher,
            llms,
            cfg: cfg.sanitized(),
            history: None,
        }
    }

    /// Record a summary of every finished run into `history`.
    pub fn with_history(mut self, history: Arc<RunHistory>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.cfg
    }

    pub async fn run(&self, request: &AnalysisRequest) -> PipelineResult<CombinedResult> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Run under the configured run deadline; cancelling `cancel` aborts every in-flight call.
    pub async fn run_with_cancel(
        &self,
        request: &AnalysisRequest,
        cancel: CancellationToken,
    ) -> PipelineResult<CombinedResult> {
        ensure_metrics_described();
        request.validate()?;

        let t0 = Instant::now();
        let state = Mutex::new(WorkflowState::Fetch);
        let deadline = self.cfg.run_timeout();

        let res = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            r = tokio::time::timeout(deadline, self.drive(request, &cancel, &state)) => match r {
                Ok(inner) => inner,
                Err(_) => {
                    let at = *state.lock().unwrap_or_else(PoisonError::into_inner);
                    Err(PipelineError::Timeout { step: at.step_name() })
                }
            },
        };

        let ms = t0.elapsed().as_millis() as u64;
        histogram!("webs_run_ms").record(ms as f64);
        let mut record = RunRecord {
            ts_unix: now_unix(),
            web_id: request.web_id.clone(),
            url_count: request.urls.len(),
            outcome: "ok".to_string(),
            failed_step: None,
            successful_count: 0,
            failed_count: 0,
            duration_ms: ms,
        };
        match &res {
            Ok(out) => {
                counter!("webs_runs_total", "outcome" => "ok").increment(1);
                record.successful_count = out.metadata.successful_count;
                record.failed_count = out.metadata.failed_count;
                info!(
                    target: "webs::pipeline",
                    web_id = request.web_id.as_deref().unwrap_or("-"),
                    urls = out.metadata.url_count,
                    analyzed = out.metadata.successful_count,
                    failed = out.metadata.failed_count,
                    ms,
                    "run complete"
                );
            }
            Err(e) => {
                let failed_at = std::mem::replace(
                    &mut *state.lock().unwrap_or_else(PoisonError::into_inner),
                    WorkflowState::Failed,
                );
                counter!("webs_runs_total", "outcome" => e.kind()).increment(1);
                record.outcome = e.kind().to_string();
                record.failed_step = Some(failed_at.step_name().to_string());
                warn!(
                    target: "webs::pipeline",
                    web_id = request.web_id.as_deref().unwrap_or("-"),
                    kind = e.kind(),
                    step = failed_at.step_name(),
                    error = %e,
                    ms,
                    "run failed"
                );
            }
        }
        if let Some(h) = &self.history {
            h.push(record);
        }
        res
    }

    async fn drive(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
        state: &Mutex<WorkflowState>,
    ) -> PipelineResult<CombinedResult> {
        let mut ledger = StepLedger::default();
        let prompt = request.focus_prompt();

        set_state(state, WorkflowState::Fetch);
        let fetches = fetch::fetch_all(self.fetcher.as_ref(), &request.urls, &self.cfg, cancel).await;
        ledger.record(Step::Fetch)?;
        bail_if_cancelled(cancel)?;

        let fetched = fetches.iter().filter(|f| f.success).count();
        info!(target: "webs::pipeline", urls = request.urls.len(), fetched, "fetch complete");
        if fetched == 0 {
            return Err(PipelineError::AllFetchesFailed {
                attempted: request.urls.len(),
            });
        }

        set_state(state, WorkflowState::Branches);
        let (quick, detailed) = tokio::join!(
            analysis::quick_metadata(
                self.llms.fast.as_ref(),
                &request.urls,
                prompt,
                &fetches,
                &self.cfg,
                cancel
            ),
            analysis::analyze_all(
                self.llms.detailed.as_ref(),
                &request.urls,
                prompt,
                &fetches,
                &self.cfg,
                cancel
            ),
        );
        bail_if_cancelled(cancel)?;
        let quick = quick.map_err(PipelineError::QuickMetadata)?;
        ledger.record(Step::QuickMetadata)?;
        let detailed = detailed?;
        ledger.record(Step::Analysis)?;

        set_state(state, WorkflowState::Mapper);
        let input = CombineInput::from_branches(request, &fetches, quick, detailed);
        ledger.record(Step::Mapper)?;

        set_state(state, WorkflowState::Combine);
        let mut result = analysis::combine(self.llms.detailed.as_ref(), input, &self.cfg, cancel)
            .await
            .map_err(PipelineError::Combine)?;
        bail_if_cancelled(cancel)?;
        ledger.record(Step::Combine)?;

        result.metadata.processing_steps = ledger.steps();
        set_state(state, WorkflowState::Done);
        Ok(result)
    }
}

fn set_state(state: &Mutex<WorkflowState>, next: WorkflowState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = next;
}

fn bail_if_cancelled(cancel: &CancellationToken) -> PipelineResult<()> {
    if cancel.is_cancelled() {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}
