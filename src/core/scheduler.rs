//! 定時觸發課程匯入。
//!
//! 同一時間最多只有一個匯入在執行：觸發時以非阻塞方式取得 guard，
//! 取不到就直接丟棄該次觸發（不排隊）並記錄在統計中。

use crate::core::etl::EtlEngine;
use crate::core::Pipeline;
use crate::domain::model::ImportResult;
use crate::utils::error::EtlError;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 單次匯入的結果
#[derive(Debug)]
pub enum RunOutcome {
    Completed(ImportResult),
    Failed(EtlError),
    TimedOut,
}

#[derive(Debug)]
pub enum TriggerOutcome {
    Started(JoinHandle<RunOutcome>),
    Dropped,
}

#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    pub triggered: u64,
    pub started: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub dropped: u64,
    pub last_result: Option<ImportResult>,
    pub last_error: Option<String>,
}

pub struct ImportScheduler<P: Pipeline + 'static> {
    engine: Arc<EtlEngine<P>>,
    interval: Duration,
    max_run_duration: Duration,
    run_on_start: bool,
    in_flight: Arc<tokio::sync::Mutex<()>>,
    stats: Arc<Mutex<SchedulerStats>>,
}

impl<P: Pipeline + 'static> ImportScheduler<P> {
    pub fn new(engine: EtlEngine<P>, interval: Duration, max_run_duration: Duration) -> Self {
        Self {
            engine: Arc::new(engine),
            interval,
            max_run_duration,
            run_on_start: true,
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
            stats: Arc::new(Mutex::new(SchedulerStats::default())),
        }
    }

    /// 啟動時是否立即執行第一次匯入
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }

    pub fn engine(&self) -> &EtlEngine<P> {
        &self.engine
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// 啟動排程迴圈，直到回傳的 task 被 abort 為止
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                "⏰ Import scheduler started (every {:?}, max run {:?})",
                self.interval,
                self.max_run_duration
            );
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            if !self.run_on_start {
                // 第一個 tick 會立即完成
                interval.tick().await;
            }

            loop {
                interval.tick().await;
                self.trigger();
            }
        })
    }

    /// 觸發一次匯入；若已有匯入在執行則丟棄本次觸發
    pub fn trigger(&self) -> TriggerOutcome {
        self.with_stats(|stats| stats.triggered += 1);

        let guard = match self.in_flight.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                self.with_stats(|stats| stats.dropped += 1);
                tracing::warn!("⚠️ Previous import still running; dropping this trigger");
                return TriggerOutcome::Dropped;
            }
        };
        self.with_stats(|stats| stats.started += 1);

        let engine = Arc::clone(&self.engine);
        let stats = Arc::clone(&self.stats);
        let max_run_duration = self.max_run_duration;

        TriggerOutcome::Started(tokio::spawn(async move {
            let outcome = match tokio::time::timeout(max_run_duration, engine.run()).await {
                Ok(Ok(result)) => RunOutcome::Completed(result),
                Ok(Err(e)) => RunOutcome::Failed(e),
                Err(_) => RunOutcome::TimedOut,
            };
            // guard 在此之前一直持有
            drop(guard);

            let mut stats = stats.lock().unwrap_or_else(PoisonError::into_inner);
            match &outcome {
                RunOutcome::Completed(result) => {
                    stats.completed += 1;
                    stats.last_result = Some(result.clone());
                    stats.last_error = None;
                    tracing::info!(
                        "✅ Import completed: {} courses, {} rows skipped (version {})",
                        result.rows_processed,
                        result.rows_skipped,
                        result.version
                    );
                }
                RunOutcome::Failed(e) => {
                    stats.failed += 1;
                    stats.last_error = Some(e.to_string());
                    tracing::error!(
                        "❌ Import failed: {} (Category: {:?}, Severity: {:?})",
                        e,
                        e.category(),
                        e.severity()
                    );
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                }
                RunOutcome::TimedOut => {
                    let e = EtlError::RunTimeout {
                        seconds: max_run_duration.as_secs(),
                    };
                    stats.timed_out += 1;
                    stats.last_error = Some(e.to_string());
                    tracing::error!("❌ {}; previous dataset kept", e);
                }
            }
            outcome
        }))
    }

    fn with_stats(&self, update: impl FnOnce(&mut SchedulerStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }
}
