/*!
 * Mock analyzer implementations for testing
 *
 * These analyzers implement the `Analyzer` trait with predetermined
 * behavior so pipeline tests can control scores, failures and timing
 * without depending on the heuristics of the real stages.
 */

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use contentqa::quality::{Analyzer, AnalyzerResult, ContentCandidate, Requirements, Stage};

/// Returns the same score and issues on every call and counts invocations
#[derive(Debug)]
pub struct ScriptedAnalyzer {
    stage: Stage,
    result: AnalyzerResult,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAnalyzer {
    pub fn new(stage: Stage, score: f64) -> Self {
        Self::with_result(AnalyzerResult::new(stage, score, Vec::new(), Vec::new()))
    }

    pub fn with_result(result: AnalyzerResult) -> Self {
        Self {
            stage: result.stage,
            result,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared invocation counter
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn analyze(&self, _content: &ContentCandidate, _requirements: &Requirements) -> anyhow::Result<AnalyzerResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.result.clone())
    }
}

type ResultFn = dyn Fn(&str) -> AnalyzerResult + Send + Sync;

/// Derives its result from the text of the revision under analysis
pub struct ContentAwareAnalyzer {
    stage: Stage,
    rule: Box<ResultFn>,
}

impl ContentAwareAnalyzer {
    pub fn new<F>(stage: Stage, rule: F) -> Self
    where
        F: Fn(&str) -> AnalyzerResult + Send + Sync + 'static,
    {
        Self {
            stage,
            rule: Box::new(rule),
        }
    }
}

impl fmt::Debug for ContentAwareAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentAwareAnalyzer").field("stage", &self.stage).finish()
    }
}

#[async_trait]
impl Analyzer for ContentAwareAnalyzer {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn analyze(&self, content: &ContentCandidate, _requirements: &Requirements) -> anyhow::Result<AnalyzerResult> {
        Ok((self.rule)(&content.text))
    }
}

/// Always returns an error
#[derive(Debug)]
pub struct FailingAnalyzer {
    stage: Stage,
    message: String,
}

impl FailingAnalyzer {
    pub fn new(stage: Stage, message: &str) -> Self {
        Self {
            stage,
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Analyzer for FailingAnalyzer {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn analyze(&self, _content: &ContentCandidate, _requirements: &Requirements) -> anyhow::Result<AnalyzerResult> {
        Err(anyhow::anyhow!("{}", self.message))
    }
}

/// Sleeps before answering; used to trigger stage timeouts and cancellation
#[derive(Debug)]
pub struct SlowAnalyzer {
    stage: Stage,
    delay: Duration,
    score: f64,
}

impl SlowAnalyzer {
    pub fn new(stage: Stage, delay: Duration, score: f64) -> Self {
        Self { stage, delay, score }
    }
}

#[async_trait]
impl Analyzer for SlowAnalyzer {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn analyze(&self, _content: &ContentCandidate, _requirements: &Requirements) -> anyhow::Result<AnalyzerResult> {
        tokio::time::sleep(self.delay).await;
        Ok(AnalyzerResult::new(self.stage, self.score, Vec::new(), Vec::new()))
    }
}

/// Panics inside the analyzer task
#[derive(Debug)]
pub struct PanickingAnalyzer {
    stage: Stage,
}

impl PanickingAnalyzer {
    pub fn new(stage: Stage) -> Self {
        Self { stage }
    }
}

#[async_trait]
impl Analyzer for PanickingAnalyzer {
    fn stage(&self) -> Stage {
        self.stage
    }

    async fn analyze(&self, _content: &ContentCandidate, _requirements: &Requirements) -> anyhow::Result<AnalyzerResult> {
        panic!("analyzer bug in stage {}", self.stage);
    }
}

/// One scripted analyzer per stage, all with the same score
pub fn uniform_analyzers(score: f64) -> Vec<Arc<dyn Analyzer>> {
    Stage::ALL
        .iter()
        .map(|stage| Arc::new(ScriptedAnalyzer::new(*stage, score)) as Arc<dyn Analyzer>)
        .collect()
}

/// Scripted analyzers for every stage except `stage`, which uses `replacement`
pub fn uniform_analyzers_with(score: f64, stage: Stage, replacement: Arc<dyn Analyzer>) -> Vec<Arc<dyn Analyzer>> {
    uniform_analyzers(score)
        .into_iter()
        .map(|analyzer| if analyzer.stage() == stage { Arc::clone(&replacement) } else { analyzer })
        .collect()
}
