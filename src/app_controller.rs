/*!
 * Application controller for EPUB translation runs.
 *
 * Owns the run lifecycle: load the container, parse every chapter up front
 * (so malformed markup aborts before any translation call), translate
 * chapters with bounded concurrency, aggregate the report, apply the
 * commit/abort decision, and persist.
 */

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;

use crate::app_config::Config;
use crate::chapter::{ChapterDocument, NodeClassifier};
use crate::epub;
use crate::reporting::writer::JsonReportWriter;
use crate::reporting::{ChapterReport, OutputDecision, RunAggregator};
use crate::translation::core::{TranslationService, Translator};
use crate::translation::prompts::PromptBuilder;
use crate::translation::retry::RetryPolicy;
use crate::translation::{ChapterOrchestrator, ChapterOutcome};

/// Result of a completed run
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Whether the transformed EPUB was persisted
    pub output_written: bool,
    /// Total node failures across all chapters
    pub failures: usize,
    /// Process exit code: 0 committed, 2 output aborted
    pub exit_code: i32,
}

/// Main application controller for EPUB translation
pub struct Controller {
    config: Config,
}

impl Controller {
    /// Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    /// Run a translation with the production Ollama-backed service
    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        report_path: &Path,
    ) -> Result<RunSummary> {
        let service = TranslationService::from_config(&self.config.translation)?;

        if let Err(e) = service.test_connection().await {
            warn!("Backend connection check failed, proceeding anyway: {}", e);
        }

        self.run_with_translator(&service, input, output, report_path)
            .await
    }

    /// Run a translation against any translator implementation.
    pub async fn run_with_translator(
        &self,
        translator: &dyn Translator,
        input: &Path,
        output: &Path,
        report_path: &Path,
    ) -> Result<RunSummary> {
        info!("Loading EPUB | path={}", input.display());
        let book = epub::load(input).context("Failed to load input EPUB")?;

        // Parse everything before the first translation call: a structural
        // error must abort the run while the backend is still untouched.
        let mut documents: Vec<ChapterDocument> = Vec::with_capacity(book.chapters.len());
        for chapter in &book.chapters {
            let bytes = book
                .item(&chapter.path)
                .with_context(|| format!("Chapter item missing from archive: {}", chapter.path))?;
            let document = ChapterDocument::parse(&chapter.path, chapter.spine_index, bytes)
                .with_context(|| format!("Failed to parse chapter: {}", chapter.path))?;
            documents.push(document);
        }

        let total = documents.len();
        info!(
            "Loaded EPUB | chapters={} workers={}",
            total, self.config.translation.workers
        );

        let classifier = NodeClassifier::default();
        let prompts = PromptBuilder::from_config(&self.config);
        let policy = RetryPolicy {
            max_retries: self.config.translation.retries,
            backoff_base_ms: self.config.translation.backoff_base_ms,
            backoff_cap_ms: self.config.translation.backoff_cap_ms,
        };
        let orchestrator = ChapterOrchestrator::new(
            translator,
            &classifier,
            &prompts,
            policy,
            self.config.translation.context_window,
        );

        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chapters ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        // Chapters translate concurrently; nodes within a chapter stay
        // sequential so the rolling context window is coherent. Results land
        // in spine-index slots so report order is deterministic regardless
        // of completion order.
        let workers = self.config.translation.workers.min(total.max(1));
        let orchestrator_ref = &orchestrator;
        let progress_ref = &progress;

        let completed: Vec<(usize, ChapterDocument, ChapterOutcome)> =
            stream::iter(documents.into_iter().enumerate().map(|(index, mut doc)| {
                async move {
                    info!(
                        "Translating chapter {}/{} | path={}",
                        index + 1,
                        total,
                        doc.path
                    );
                    let outcome = orchestrator_ref.process(&mut doc).await;
                    progress_ref.inc(1);
                    (index, doc, outcome)
                }
            }))
            .buffer_unordered(workers)
            .collect()
            .await;

        progress.finish_and_clear();

        let mut slots: Vec<Option<(ChapterDocument, ChapterOutcome)>> =
            (0..total).map(|_| None).collect();
        for (index, doc, outcome) in completed {
            slots[index] = Some((doc, outcome));
        }

        let mut updated: HashMap<String, Vec<u8>> = HashMap::new();
        let mut chapter_reports: Vec<ChapterReport> = Vec::with_capacity(total);
        for slot in slots.into_iter().flatten() {
            let (doc, outcome) = slot;
            updated.insert(doc.path.clone(), doc.serialize());
            chapter_reports.push(ChapterReport {
                chapter_id: doc.path,
                changes: outcome.changes,
                failures: outcome.failures,
                skips: outcome.skips,
                nodes_seen: outcome.nodes_seen,
            });
        }

        let mut report = RunAggregator::aggregate(
            &self.config,
            &input.to_string_lossy(),
            &output.to_string_lossy(),
            &report_path.to_string_lossy(),
            chapter_reports,
        );

        let output_written = match RunAggregator::decide(&report, self.config.abort_on_error) {
            OutputDecision::Commit => {
                info!("Writing translated EPUB | path={}", output.display());
                epub::save(&book, &updated, output).context("Failed to write translated EPUB")?;
                true
            }
            OutputDecision::AbortOutputOnly => {
                info!(
                    "Aborting EPUB write due to failures | failures={}",
                    report.totals.nodes_failed
                );
                false
            }
        };

        report.finalize(output_written);
        JsonReportWriter::write(&report, report_path).context("Failed to write report")?;

        info!(
            "Run completed | changed={} failed={} skipped={} output_written={}",
            report.totals.nodes_changed,
            report.totals.nodes_failed,
            report.totals.nodes_skipped,
            output_written
        );

        Ok(RunSummary {
            output_written,
            failures: report.totals.nodes_failed,
            exit_code: if output_written { 0 } else { 2 },
        })
    }
}
