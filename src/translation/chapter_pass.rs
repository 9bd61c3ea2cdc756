/*!
 * Per-chapter translation pass.
 *
 * Classifies every text node once, then visits them in document order:
 * protected/structural nodes are recorded and left alone, translatable nodes
 * go through the retrying translator and are rewritten in place on success.
 * A node failure never halts the chapter; prose after a bad node is still
 * attempted.
 */

use log::debug;
use std::collections::VecDeque;

use crate::chapter::{ChapterDocument, Classification, NodeClassifier, NodeContext, NodeId};
use crate::reporting::{NodeChange, NodeFailure, NodeSkip};
use crate::translation::core::Translator;
use crate::translation::prompts::{PromptBuilder, normalize_whitespace};
use crate::translation::retry::{RetryPolicy, RetryingTranslator, TranslationOutcome};

/// Outcome of one chapter pass
#[derive(Debug)]
pub struct ChapterOutcome {
    pub changes: Vec<NodeChange>,
    pub failures: Vec<NodeFailure>,
    pub skips: Vec<NodeSkip>,
    /// Text nodes visited; always changes + failures + skips
    pub nodes_seen: usize,
}

/// A text node after the classification phase
struct ClassifiedNode {
    id: NodeId,
    path: String,
    label: Classification,
}

/// Drives the translation of one chapter's text nodes.
pub struct ChapterOrchestrator<'a> {
    translator: &'a dyn Translator,
    classifier: &'a NodeClassifier,
    prompts: &'a PromptBuilder,
    policy: RetryPolicy,
    /// Size of the rolling window of recent translations (0 disables)
    context_window: usize,
}

impl<'a> ChapterOrchestrator<'a> {
    pub fn new(
        translator: &'a dyn Translator,
        classifier: &'a NodeClassifier,
        prompts: &'a PromptBuilder,
        policy: RetryPolicy,
        context_window: usize,
    ) -> Self {
        Self {
            translator,
            classifier,
            prompts,
            policy,
            context_window,
        }
    }

    /// Translate one chapter in place, producing its outcome records.
    pub async fn process(&self, document: &mut ChapterDocument) -> ChapterOutcome {
        let classified = self.classify_nodes(document);
        let nodes_seen = classified.len();

        // The context excerpt is computed once, before any rewrite, and is
        // immutable for the rest of this chapter's processing.
        let chapter_context = self.prompts.chapter_context(&document.dom.full_text());

        let retrying = RetryingTranslator::new(self.translator, self.policy);

        let mut changes = Vec::new();
        let mut failures = Vec::new();
        let mut skips = Vec::new();

        // Rolling window of recent successful translations, for consistent
        // tone and terminology across the chapter.
        let mut recent: VecDeque<String> = VecDeque::new();

        for node in classified {
            match node.label {
                Classification::Protected { reason }
                | Classification::SkippedStructural { reason } => {
                    skips.push(NodeSkip {
                        node_id: node.path,
                        reason,
                    });
                }
                Classification::Translatable => {
                    let original = document.dom.text(node.id).to_string();
                    let request_text = normalize_whitespace(&original);

                    let prior = if self.context_window > 0 {
                        recent.iter().cloned().collect::<Vec<_>>().join("\n")
                    } else {
                        String::new()
                    };

                    let request = self.prompts.build(&chapter_context, &prior, &request_text);

                    match retrying.translate(&request).await {
                        TranslationOutcome::Succeeded(translated) => {
                            debug!(
                                "Translated node | chapter={} node={}",
                                document.path, node.path
                            );

                            document
                                .dom
                                .set_text(node.id, reattach_whitespace(&original, &translated));

                            changes.push(NodeChange::new(node.path, &request_text, &translated));

                            if self.context_window > 0 {
                                recent.push_back(translated);
                                while recent.len() > self.context_window {
                                    recent.pop_front();
                                }
                            }
                        }
                        TranslationOutcome::Failed(failure) => {
                            debug!(
                                "Node translation failed | chapter={} node={} kind={} attempts={}",
                                document.path, node.path, failure.kind, failure.attempts
                            );

                            failures.push(NodeFailure {
                                node_id: node.path,
                                error_kind: failure.kind.as_str().to_string(),
                                message: failure.message,
                                attempts: failure.attempts,
                            });
                        }
                    }
                }
            }
        }

        ChapterOutcome {
            changes,
            failures,
            skips,
            nodes_seen,
        }
    }

    /// Classification phase: one pure pass over every text node.
    fn classify_nodes(&self, document: &ChapterDocument) -> Vec<ClassifiedNode> {
        document
            .dom
            .text_nodes()
            .into_iter()
            .map(|id| {
                let ancestors = document.ancestors_of(id);
                let label = self.classifier.classify(&NodeContext {
                    text: document.dom.text(id),
                    ancestors: &ancestors,
                });
                ClassifiedNode {
                    id,
                    path: document.dom.node_path(id),
                    label,
                }
            })
            .collect()
    }
}

/// Carry the original node's boundary whitespace over to the translation so
/// spacing around inline markup survives the rewrite.
fn reattach_whitespace(original: &str, translated: &str) -> String {
    let leading: String = original.chars().take_while(|c| c.is_whitespace()).collect();
    let trailing: String = original
        .chars()
        .rev()
        .take_while(|c| c.is_whitespace())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{}{}{}", leading, translated, trailing)
}
