//! Concurrent analysis engine
//!
//! A bounded FIFO queue feeds a fixed pool of worker tasks. Workers compute
//! indicators and build prompts outside the concurrency gate; only the
//! external reasoning call holds a semaphore permit, so CPU-bound indicator
//! math proceeds while in-flight calls are capped.
//!
//! Request lifecycle: queued, dispatched to a worker, then success or
//! failure. A failed request is logged with its signal id and the worker
//! moves on; a single bad request never stops the engine.

use crate::analysis::calculator::Calculator;
use crate::analysis::prompter::Prompter;
use crate::analysis::types::{AnalysisReport, AnalysisRequest, ResultSink};
use crate::config::EngineConfig;
use crate::error::ScreenerError;
use crate::llm::{
    parse_verdict, ChatRequest, ReasoningClient, MONITORING_ANALYSIS_SYSTEM_PROMPT,
    SIGNAL_ANALYSIS_SYSTEM_PROMPT,
};
use crate::Result;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch, Mutex, Semaphore};
use tokio::task::JoinHandle;

/// Processing counters, flushed as a summary log on shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    pub processed: u64,
    pub failed: u64,
}

struct Shared<C, S> {
    config: EngineConfig,
    client: Arc<C>,
    sink: Arc<S>,
    calculator: Calculator,
    prompter: Prompter,
    gate: Semaphore,
    processed: AtomicU64,
    failed: AtomicU64,
}

/// Orchestrates AI evaluation of trading signals under bounded concurrency.
///
/// `start()` launches the worker pool; `stop()` drains it. Restart after
/// `stop()` is not supported: construct a fresh engine instead.
pub struct AnalysisEngine<C, S> {
    shared: Arc<Shared<C, S>>,
    queue_tx: mpsc::Sender<AnalysisRequest>,
    queue_rx: std::sync::Mutex<Option<mpsc::Receiver<AnalysisRequest>>>,
    shutdown_tx: watch::Sender<bool>,
    workers: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl<C, S> AnalysisEngine<C, S>
where
    C: ReasoningClient + 'static,
    S: ResultSink + 'static,
{
    pub fn new(config: EngineConfig, client: Arc<C>, sink: Arc<S>) -> Self {
        let worker_count = config.worker_count.max(1);
        if config.max_concurrent > worker_count {
            tracing::warn!(
                max_concurrent = config.max_concurrent,
                worker_count,
                "max_concurrent exceeds worker count, clamping"
            );
        }
        let permits = config.max_concurrent.clamp(1, worker_count);

        let (queue_tx, queue_rx) = mpsc::channel(config.queue_size.max(1));
        let (shutdown_tx, _) = watch::channel(false);

        let shared = Arc::new(Shared {
            calculator: Calculator::new(config.default_candle_limit),
            prompter: Prompter::new(),
            gate: Semaphore::new(permits),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            config,
            client,
            sink,
        });

        Self {
            shared,
            queue_tx,
            queue_rx: std::sync::Mutex::new(Some(queue_rx)),
            shutdown_tx,
            workers: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Launch the worker pool. Fails if the engine was already started.
    pub fn start(&self) -> Result<()> {
        let queue_rx = self
            .queue_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(ScreenerError::EngineStopped)?;

        let worker_count = self.shared.config.worker_count.max(1);
        tracing::info!(workers = worker_count, "starting analysis engine");

        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let mut handles = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            handles.push(tokio::spawn(worker_loop(
                id,
                Arc::clone(&self.shared),
                Arc::clone(&queue_rx),
                self.shutdown_tx.subscribe(),
            )));
        }

        *self.workers.lock().unwrap_or_else(|e| e.into_inner()) = handles;

        tracing::info!("✅ analysis engine started");
        Ok(())
    }

    /// Add a request to the analysis queue. Never blocks: a full queue is
    /// rejected immediately so the producer can apply its own backpressure.
    pub fn enqueue(&self, mut request: AnalysisRequest) -> Result<()> {
        if *self.shutdown_tx.borrow() {
            return Err(ScreenerError::EngineStopped);
        }

        request.queued_at = Utc::now();
        let signal_id = request.signal_id.clone();

        match self.queue_tx.try_send(request) {
            Ok(()) => {
                tracing::debug!(
                    signal_id = %signal_id,
                    depth = self.queue_depth(),
                    "queued analysis"
                );
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(ScreenerError::QueueFull {
                depth: self.queue_depth(),
                capacity: self.queue_capacity(),
            }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ScreenerError::EngineStopped),
        }
    }

    /// Signal shutdown, wait for all workers to finish their current item,
    /// then flush the processing counters. Queued but undispatched requests
    /// are dropped.
    pub async fn stop(&self) {
        tracing::info!("analysis engine shutting down");
        let _ = self.shutdown_tx.send(true);

        let handles: Vec<JoinHandle<()>> = {
            let mut workers = self.workers.lock().unwrap_or_else(|e| e.into_inner());
            workers.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }

        let stats = self.stats();
        tracing::info!(
            processed = stats.processed,
            failed = stats.failed,
            "✅ analysis engine stopped"
        );
    }

    /// Requests currently waiting in the queue.
    pub fn queue_depth(&self) -> usize {
        self.queue_tx.max_capacity() - self.queue_tx.capacity()
    }

    /// Maximum queue capacity.
    pub fn queue_capacity(&self) -> usize {
        self.queue_tx.max_capacity()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            processed: self.shared.processed.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
        }
    }
}

async fn worker_loop<C, S>(
    id: usize,
    shared: Arc<Shared<C, S>>,
    queue_rx: Arc<Mutex<mpsc::Receiver<AnalysisRequest>>>,
    mut shutdown: watch::Receiver<bool>,
) where
    C: ReasoningClient,
    S: ResultSink,
{
    tracing::debug!(worker = id, "worker started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let request = {
            let mut rx = queue_rx.lock().await;
            tokio::select! {
                _ = shutdown.changed() => None,
                request = rx.recv() => request,
            }
        };

        let Some(request) = request else {
            break;
        };

        match process_request(&shared, &request).await {
            Ok(()) => {
                shared.processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                shared.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    worker = id,
                    signal_id = %request.signal_id,
                    symbol = %request.symbol,
                    error = %e,
                    "analysis failed"
                );
            }
        }
    }

    tracing::debug!(worker = id, "worker stopped");
}

async fn process_request<C, S>(shared: &Shared<C, S>, request: &AnalysisRequest) -> Result<()>
where
    C: ReasoningClient,
    S: ResultSink,
{
    let started = Instant::now();
    let queued_for = Utc::now().signed_duration_since(request.queued_at);
    tracing::info!(
        signal_id = %request.signal_id,
        symbol = %request.symbol,
        queued_ms = queued_for.num_milliseconds(),
        "processing signal"
    );

    // 1. Calculate indicators
    let indicators = shared.calculator.calculate(request)?;
    tracing::debug!(
        signal_id = %request.signal_id,
        count = indicators.len(),
        "indicators calculated"
    );

    // 2. Build prompt
    let (system_prompt, user_prompt) = if request.is_reanalysis {
        let prompt = shared.prompter.build_monitoring_prompt(
            request,
            &indicators,
            request.previous.as_ref(),
            request.analysis_count,
            shared.config.max_reanalyses,
        )?;
        (MONITORING_ANALYSIS_SYSTEM_PROMPT, prompt)
    } else {
        let prompt = shared.prompter.build_analysis_prompt(request, &indicators)?;
        (SIGNAL_ANALYSIS_SYSTEM_PROMPT, prompt)
    };

    // 3. Call the reasoning service under the concurrency gate, with a
    //    per-request deadline
    let response = {
        let _permit = shared
            .gate
            .acquire()
            .await
            .map_err(|_| ScreenerError::EngineStopped)?;

        let chat_request = ChatRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt,
            model: request.strategy.model_tier.clone(),
            temperature: None,
            max_tokens: None,
        };

        tokio::time::timeout(shared.config.request_timeout, shared.client.chat(&chat_request))
            .await
            .map_err(|_| ScreenerError::Timeout {
                elapsed: shared.config.request_timeout,
            })??
    };

    tracing::debug!(
        signal_id = %request.signal_id,
        latency_ms = response.latency.as_millis() as u64,
        tokens = response.usage.total_tokens,
        "reasoning response received"
    );

    // 4. Parse and validate the structured verdict
    let verdict = parse_verdict(&response.content)?;

    // 5. Hand off to the persistence collaborator
    let total_latency = started.elapsed();
    let report = AnalysisReport {
        signal_id: request.signal_id.clone(),
        strategy_id: request.strategy_id.clone(),
        user_id: request.user_id.clone(),
        symbol: request.symbol.clone(),
        verdict,
        model: response.model,
        tokens_used: response.usage.total_tokens,
        latency_ms: total_latency.as_millis() as u64,
        indicators,
    };

    shared
        .sink
        .persist(&report)
        .await
        .map_err(|e| ScreenerError::Persistence(e.to_string()))?;

    tracing::info!(
        signal_id = %request.signal_id,
        decision = %report.verdict.decision,
        confidence = report.verdict.confidence,
        total_ms = total_latency.as_millis() as u64,
        "✅ analysis completed"
    );

    Ok(())
}
