//! Shared test utilities for integration tests
//!
//! Scripted stage providers with call accounting, and a progress sink that records events.

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use smol_dev::error::{PipelineError, ProviderError, Stage};
use smol_dev::pipeline::{PipelineOrchestrator, ProgressEvent, ProgressSink};
use smol_dev::stage::{ContentGenerator, ContentStream, DependencyProvider, PlanProvider};
use smol_dev::types::{
    DependencyDescriptor, FileManifest, GenerationContext, Intent, SharedDependency,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Call accounting shared between a [`Scripted`] provider and the test body.
#[derive(Default)]
pub struct Stats {
    pub plan_calls: AtomicUsize,
    pub dependency_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
    /// Paths passed to the content generator, in call order.
    pub generated: Mutex<Vec<String>>,
    /// `dependencies_yaml` seen by each content call.
    pub contexts: Mutex<Vec<String>>,
}

impl Stats {
    pub fn plan_calls(&self) -> usize {
        self.plan_calls.load(Ordering::SeqCst)
    }

    pub fn dependency_calls(&self) -> usize {
        self.dependency_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn generated(&self) -> Vec<String> {
        let mut paths = self.generated.lock().clone();
        paths.sort();
        paths
    }
}

/// Decrements `in_flight` when the content stream is dropped.
struct InFlight(Arc<Stats>);

impl InFlight {
    fn enter(stats: Arc<Stats>) -> Self {
        let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(stats)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted plan / dependency / content provider.
pub struct Scripted {
    files: Vec<String>,
    malformed_plan: Option<String>,
    dependencies: DependencyDescriptor,
    fail_on_start: HashSet<String>,
    fail_mid_stream: HashSet<String>,
    hang_after_first_chunk: HashSet<String>,
    chunk_delay: Duration,
    stats: Arc<Stats>,
}

impl Scripted {
    pub fn new(files: &[&str]) -> Self {
        let mut symbols = std::collections::BTreeMap::new();
        symbols.insert("Todo".to_string(), "shared record type".to_string());
        Self {
            files: files.iter().map(|f| f.to_string()).collect(),
            malformed_plan: None,
            dependencies: DependencyDescriptor {
                shared_dependencies: vec![SharedDependency {
                    name: "Todo".to_string(),
                    description: "todo record".to_string(),
                    symbols,
                }],
                reasoning: vec!["one model shared by api and storage".to_string()],
            },
            fail_on_start: HashSet::new(),
            fail_mid_stream: HashSet::new(),
            hang_after_first_chunk: HashSet::new(),
            chunk_delay: Duration::ZERO,
            stats: Arc::new(Stats::default()),
        }
    }

    /// The plan call answers with prose that carries no JSON object.
    pub fn with_malformed_plan(mut self, raw: &str) -> Self {
        self.malformed_plan = Some(raw.to_string());
        self
    }

    /// Content call for `path` fails before any chunk is produced.
    pub fn failing(mut self, path: &str) -> Self {
        self.fail_on_start.insert(path.to_string());
        self
    }

    /// Content stream for `path` yields one chunk, then an error.
    pub fn failing_mid_stream(mut self, path: &str) -> Self {
        self.fail_mid_stream.insert(path.to_string());
        self
    }

    /// Content stream for `path` yields one chunk, then never finishes.
    pub fn hanging(mut self, path: &str) -> Self {
        self.hang_after_first_chunk.insert(path.to_string());
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    pub fn into_orchestrator(self) -> (PipelineOrchestrator, Arc<Stats>) {
        let stats = self.stats.clone();
        let scripted = Arc::new(self);
        (
            PipelineOrchestrator::new(scripted.clone(), scripted.clone(), scripted),
            stats,
        )
    }
}

/// Content written for `path` by a scripted run.
pub fn expected_content(path: &str) -> String {
    format!("// generated {}\nfn main() {{}}\n", path)
}

#[async_trait]
impl PlanProvider for Scripted {
    async fn plan(&self, _intent: &Intent) -> Result<FileManifest, PipelineError> {
        self.stats.plan_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(raw) = &self.malformed_plan {
            return smol_dev::stage::parse_json_payload::<Vec<String>>(Stage::Plan, raw)
                .map(|_| FileManifest::default());
        }
        FileManifest::from_paths(self.files.clone())
            .map_err(|e| PipelineError::malformed(Stage::Plan, e.to_string(), ""))
    }
}

#[async_trait]
impl DependencyProvider for Scripted {
    async fn dependencies(
        &self,
        _intent: &Intent,
        _manifest: &FileManifest,
    ) -> Result<DependencyDescriptor, PipelineError> {
        self.stats.dependency_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.dependencies.clone())
    }
}

#[async_trait]
impl ContentGenerator for Scripted {
    async fn generate(
        &self,
        path: &str,
        context: &GenerationContext,
    ) -> Result<ContentStream, PipelineError> {
        self.stats.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.stats.generated.lock().push(path.to_string());
        self.stats
            .contexts
            .lock()
            .push(context.dependencies_yaml.clone());

        if self.fail_on_start.contains(path) {
            return Err(PipelineError::external(
                Stage::Content,
                ProviderError::RateLimit(format!("refused {}", path)),
            ));
        }

        let guard = InFlight::enter(self.stats.clone());
        let content = expected_content(path);
        let (head, tail) = content.split_at(content.len() / 2);
        let first: Result<String, PipelineError> = Ok(head.to_string());
        let second: Result<String, PipelineError> = if self.fail_mid_stream.contains(path) {
            Err(PipelineError::external(
                Stage::Content,
                ProviderError::Stream("connection reset".to_string()),
            ))
        } else {
            Ok(tail.to_string())
        };
        let hang = self.hang_after_first_chunk.contains(path);
        let delay = self.chunk_delay;

        let chunks = futures::stream::iter(vec![first, second]).then(move |chunk| async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            chunk
        });
        let stream = if hang {
            chunks.take(1).chain(futures::stream::pending()).boxed()
        } else {
            chunks.boxed()
        };
        Ok(Box::pin(stream.map(move |chunk| {
            let _held = &guard;
            chunk
        })))
    }
}

/// Progress sink that keeps every event.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn skipped(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::TaskSkipped { .. }))
            .count()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().push(event);
    }
}
