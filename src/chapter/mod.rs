/*!
 * Chapter documents: parsed node trees plus classification.
 *
 * - `chapter::dom`: the mutable node tree and its serializer
 * - `chapter::classify`: the rule-based text node classifier
 */

pub mod classify;
pub mod dom;

pub use classify::{AncestorInfo, Classification, ClassifierConfig, NodeClassifier, NodeContext};
pub use dom::{Dom, NodeId};

use crate::errors::AppError;

/// One chapter of the book, owned exclusively for one orchestration pass.
#[derive(Debug)]
pub struct ChapterDocument {
    /// Archive path of the chapter, used as its id
    pub path: String,
    /// Position in the declared reading order
    pub spine_index: usize,
    /// Mutable node tree
    pub dom: Dom,
}

impl ChapterDocument {
    /// Parse raw chapter markup into a document
    pub fn parse(path: &str, spine_index: usize, bytes: &[u8]) -> Result<Self, AppError> {
        Ok(Self {
            path: path.to_string(),
            spine_index,
            dom: Dom::parse(bytes)?,
        })
    }

    /// Serialize the (possibly rewritten) tree back to chapter bytes
    pub fn serialize(&self) -> Vec<u8> {
        self.dom.serialize()
    }

    /// Ancestor info for one of this chapter's nodes, nearest first
    pub fn ancestors_of(&self, id: NodeId) -> Vec<AncestorInfo> {
        self.dom
            .ancestor_ids(id)
            .into_iter()
            .filter_map(|ancestor| {
                self.dom.element_local_tag(ancestor).map(|tag| AncestorInfo {
                    tag,
                    epub_type: self
                        .dom
                        .attribute_local(ancestor, "type")
                        .map(|v| v.to_string()),
                    role: self
                        .dom
                        .attribute_local(ancestor, "role")
                        .map(|v| v.to_string()),
                })
            })
            .collect()
    }
}
