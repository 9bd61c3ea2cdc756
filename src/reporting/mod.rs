/*!
 * Run reports.
 *
 * Node outcomes are recorded as append-only values, one per node visited.
 * Chapter reports collect them; the aggregator derives run totals from the
 * records (never trusting incrementally kept counters) and applies the
 * commit/abort output policy exactly once over the final totals.
 */

pub mod writer;

use serde::Serialize;

use crate::app_config::Config;
use crate::translation::prompts::normalize_whitespace;

/// Report excerpts are bounded so a report stays readable for large books.
const EXCERPT_CHARS: usize = 200;

/// A successful node rewrite
#[derive(Debug, Clone, Serialize)]
pub struct NodeChange {
    /// Position-derived node id
    pub node_id: String,
    /// Bounded excerpt of the original text
    pub original_excerpt: String,
    /// Bounded excerpt of the translated text
    pub translated_excerpt: String,
}

impl NodeChange {
    pub fn new(node_id: String, original: &str, translated: &str) -> Self {
        Self {
            node_id,
            original_excerpt: excerpt(original, EXCERPT_CHARS),
            translated_excerpt: excerpt(translated, EXCERPT_CHARS),
        }
    }
}

/// A node whose translation terminally failed; its text was left unchanged
#[derive(Debug, Clone, Serialize)]
pub struct NodeFailure {
    /// Position-derived node id
    pub node_id: String,
    /// Stable failure kind (transient / response_format / configuration)
    pub error_kind: String,
    /// Human-readable message
    pub message: String,
    /// Attempts made before giving up
    pub attempts: u32,
}

/// A node deliberately not translated
#[derive(Debug, Clone, Serialize)]
pub struct NodeSkip {
    /// Position-derived node id
    pub node_id: String,
    /// Classification reason
    pub reason: String,
}

/// All outcomes for one chapter
#[derive(Debug, Clone, Serialize)]
pub struct ChapterReport {
    /// Chapter id (archive path)
    pub chapter_id: String,
    pub changes: Vec<NodeChange>,
    pub failures: Vec<NodeFailure>,
    pub skips: Vec<NodeSkip>,
    /// Text nodes visited; always changes + failures + skips
    pub nodes_seen: usize,
}

/// Run-level totals, derived from the chapter records
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RunTotals {
    pub chapters: usize,
    pub nodes_seen: usize,
    pub nodes_changed: usize,
    pub nodes_failed: usize,
    pub nodes_skipped: usize,
}

/// The whole-run report, finalized exactly once before serialization
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub input_path: String,
    pub output_path: String,
    pub report_path: String,
    pub model: String,
    pub source_language: String,
    pub target_language: String,
    pub temperature: f32,
    pub retries: u32,
    pub abort_on_error: bool,
    /// Whether the transformed EPUB was persisted
    pub output_written: bool,
    pub totals: RunTotals,
    pub chapters: Vec<ChapterReport>,
}

/// Output policy decision over final totals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDecision {
    /// Write both the report and the transformed EPUB
    Commit,
    /// Write the report only; suppress the transformed EPUB
    AbortOutputOnly,
}

/// Merges chapter outcomes into a run report and applies the output policy.
pub struct RunAggregator;

impl RunAggregator {
    /// Build the run report from per-chapter records.
    ///
    /// `output_written` starts false; [`RunReport::finalize`] flips it after
    /// the output decision has been acted on.
    pub fn aggregate(
        config: &Config,
        input_path: &str,
        output_path: &str,
        report_path: &str,
        chapters: Vec<ChapterReport>,
    ) -> RunReport {
        let totals = RunTotals {
            chapters: chapters.len(),
            nodes_seen: chapters.iter().map(|c| c.nodes_seen).sum(),
            nodes_changed: chapters.iter().map(|c| c.changes.len()).sum(),
            nodes_failed: chapters.iter().map(|c| c.failures.len()).sum(),
            nodes_skipped: chapters.iter().map(|c| c.skips.len()).sum(),
        };

        RunReport {
            input_path: input_path.to_string(),
            output_path: output_path.to_string(),
            report_path: report_path.to_string(),
            model: config.translation.model.clone(),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            temperature: config.translation.temperature,
            retries: config.translation.retries,
            abort_on_error: config.abort_on_error,
            output_written: false,
            totals,
            chapters,
        }
    }

    /// Decide the output policy. Pure over already-final totals; must not be
    /// re-evaluated mid-run.
    pub fn decide(report: &RunReport, abort_on_error: bool) -> OutputDecision {
        if abort_on_error && report.totals.nodes_failed > 0 {
            OutputDecision::AbortOutputOnly
        } else {
            OutputDecision::Commit
        }
    }
}

impl RunReport {
    /// Record whether the transformed EPUB was actually persisted
    pub fn finalize(&mut self, output_written: bool) {
        self.output_written = output_written;
    }
}

/// Whitespace-normalize and bound a report excerpt
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let cleaned = normalize_whitespace(text);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let mut cut: String = cleaned.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('\u{2026}');
    cut
}
