/*!
 * Text node classification.
 *
 * A prioritized list of predicate rules decides, per text node, whether its
 * content may be rewritten. The rule list is deliberately a strategy object:
 * new protected categories can be added without touching orchestration, and
 * the protected-set membership is configuration rather than a hardcoded
 * assumption.
 *
 * Classification is pure and deterministic for identical input trees.
 */

use std::collections::HashSet;

/// Label assigned to a text node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Prose that may be rewritten
    Translatable,
    /// Content that must never be mutated (hard-protected markup)
    Protected {
        /// Stable reason string for the report
        reason: String,
    },
    /// Deliberately excluded: no translatable prose
    SkippedStructural {
        /// Stable reason string for the report
        reason: String,
    },
}

/// One element on the path from a text node up to the root
#[derive(Debug, Clone)]
pub struct AncestorInfo {
    /// Lowercase local tag name
    pub tag: String,
    /// `epub:type` attribute value, if any
    pub epub_type: Option<String>,
    /// `role` attribute value, if any
    pub role: Option<String>,
}

/// Everything a rule may look at for one text node
#[derive(Debug)]
pub struct NodeContext<'a> {
    /// Current node text
    pub text: &'a str,
    /// Element ancestors, nearest first
    pub ancestors: &'a [AncestorInfo],
}

/// Tag and marker sets consulted by the default rules.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Ancestor tags whose text is never mutated
    pub protected_tags: HashSet<String>,
    /// Ancestor tags marking structural, non-prose containers
    pub structural_tags: HashSet<String>,
    /// `epub:type` / `role` tokens marking structural containers
    pub structural_markers: HashSet<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            protected_tags: ["code", "pre", "head", "title", "style", "script"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            structural_tags: ["nav"].iter().map(|s| s.to_string()).collect(),
            structural_markers: ["toc", "landmarks", "page-list", "pagebreak"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// A predicate→label rule. Returning `None` passes the node to the next rule.
pub trait ClassifyRule: Send + Sync {
    fn evaluate(&self, node: &NodeContext<'_>) -> Option<Classification>;
}

/// Rule 1: any ancestor in the hard-protected set
struct ProtectedAncestorRule {
    protected_tags: HashSet<String>,
}

impl ClassifyRule for ProtectedAncestorRule {
    fn evaluate(&self, node: &NodeContext<'_>) -> Option<Classification> {
        for ancestor in node.ancestors {
            if self.protected_tags.contains(&ancestor.tag) {
                return Some(Classification::Protected {
                    reason: protected_reason(&ancestor.tag),
                });
            }
        }
        None
    }
}

/// Rule 2: empty text, or text without any alphabetic character
struct EmptyOrNonProseRule;

impl ClassifyRule for EmptyOrNonProseRule {
    fn evaluate(&self, node: &NodeContext<'_>) -> Option<Classification> {
        let trimmed = node.text.trim();
        if trimmed.is_empty() {
            return Some(Classification::SkippedStructural {
                reason: "empty".to_string(),
            });
        }
        if !trimmed.chars().any(|c| c.is_alphabetic()) {
            return Some(Classification::SkippedStructural {
                reason: "no_prose".to_string(),
            });
        }
        None
    }
}

/// Rule 3: structural/non-prose containers (navigation, TOC markers)
struct StructuralContainerRule {
    structural_tags: HashSet<String>,
    structural_markers: HashSet<String>,
}

impl StructuralContainerRule {
    fn marker_matches(&self, value: &str) -> bool {
        value.split_whitespace().any(|token| {
            let token = token.trim_start_matches("doc-").to_lowercase();
            self.structural_markers.contains(&token)
        })
    }
}

impl ClassifyRule for StructuralContainerRule {
    fn evaluate(&self, node: &NodeContext<'_>) -> Option<Classification> {
        for ancestor in node.ancestors {
            let is_structural = self.structural_tags.contains(&ancestor.tag)
                || ancestor
                    .epub_type
                    .as_deref()
                    .is_some_and(|v| self.marker_matches(v))
                || ancestor
                    .role
                    .as_deref()
                    .is_some_and(|v| self.marker_matches(v));

            if is_structural {
                return Some(Classification::SkippedStructural {
                    reason: "structural".to_string(),
                });
            }
        }
        None
    }
}

/// Ordered rule list; first match wins, the fallback label is Translatable.
///
/// Link text, footnote text, and table cell prose all fall through to
/// Translatable on purpose: only the hard-protected set and structural noise
/// are excluded, so narrative prose in footnotes is not silently dropped.
pub struct NodeClassifier {
    rules: Vec<Box<dyn ClassifyRule>>,
}

impl NodeClassifier {
    /// Build the default rule list over the given configuration
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            rules: vec![
                Box::new(ProtectedAncestorRule {
                    protected_tags: config.protected_tags,
                }),
                Box::new(EmptyOrNonProseRule),
                Box::new(StructuralContainerRule {
                    structural_tags: config.structural_tags,
                    structural_markers: config.structural_markers,
                }),
            ],
        }
    }

    /// Classify one text node
    pub fn classify(&self, node: &NodeContext<'_>) -> Classification {
        for rule in &self.rules {
            if let Some(label) = rule.evaluate(node) {
                return label;
            }
        }
        Classification::Translatable
    }
}

impl Default for NodeClassifier {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

/// Reason string for a protected ancestor tag
fn protected_reason(tag: &str) -> String {
    match tag {
        "code" | "pre" => "protected_code".to_string(),
        "head" | "title" | "style" | "script" => "protected_metadata".to_string(),
        other => format!("protected_{}", other),
    }
}
