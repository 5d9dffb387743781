/// Reusable fragments with named slots, and the binder that clones them
/// into a document.
///
/// A fragment is a small element tree declared in RON. Any node may carry a
/// `slot` name; binding a fragment clones it under a target element and
/// returns the handle of every slot node. Slot names never reach the
/// document, so a later bind cannot rediscover them.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::core::document::{Document, NodeId};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),
    #[error("template '{template}' declares slot '{slot}' more than once")]
    DuplicateSlot { template: String, slot: String },
    #[error("template '{template}' has no slot '{slot}'")]
    MissingSlot { template: String, slot: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// Slot name → bound element, produced by one bind.
pub type SlotMap = FxHashMap<String, NodeId>;

/// One element of a fragment definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentNode {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub slot: Option<String>,
    pub text: Option<String>,
    pub scrollable: bool,
    pub children: Vec<FragmentNode>,
}

impl FragmentNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn slot(mut self, name: &str) -> Self {
        self.slot = Some(name.to_string());
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    pub fn child(mut self, child: FragmentNode) -> Self {
        self.children.push(child);
        self
    }

    /// Slot names in document order, duplicates included.
    pub fn slot_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_slots(&mut names);
        names
    }

    fn collect_slots<'a>(&'a self, names: &mut Vec<&'a str>) {
        if let Some(slot) = &self.slot {
            names.push(slot);
        }
        for child in &self.children {
            child.collect_slots(names);
        }
    }

    fn instantiate(&self, doc: &mut Document, slots: &mut SlotMap) -> NodeId {
        let id = doc.create_element(&self.tag);
        for class in &self.classes {
            doc.add_class(id, class);
        }
        for (name, value) in &self.attributes {
            doc.set_attribute(id, name, value);
        }
        if self.scrollable {
            doc.set_scrollable(id, true);
        }
        if let Some(text) = &self.text {
            doc.append_text(id, text);
        }
        if let Some(slot) = &self.slot {
            slots.insert(slot.clone(), id);
        }
        for child in &self.children {
            let child_id = child.instantiate(doc, slots);
            doc.append_child(id, child_id);
        }
        id
    }
}

/// The set of named fragments available to the widget.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    fragments: FxHashMap<String, FragmentNode>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fragment under `name`, replacing any previous one.
    /// Rejects fragments that declare a slot name twice.
    pub fn register(&mut self, name: &str, fragment: FragmentNode) -> Result<(), TemplateError> {
        let mut seen = FxHashSet::default();
        for slot in fragment.slot_names() {
            if !seen.insert(slot) {
                return Err(TemplateError::DuplicateSlot {
                    template: name.to_string(),
                    slot: slot.to_string(),
                });
            }
        }
        self.fragments.insert(name.to_string(), fragment);
        Ok(())
    }

    /// Load a registry from a RON map of fragment name to fragment.
    pub fn load_from_ron(path: &Path) -> Result<TemplateRegistry, TemplateError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<TemplateRegistry, TemplateError> {
        let raw: BTreeMap<String, FragmentNode> = ron::from_str(input)?;
        let mut registry = TemplateRegistry::new();
        for (name, fragment) in raw {
            registry.register(&name, fragment)?;
        }
        Ok(registry)
    }

    /// Merge another registry into this one. Fragments from `other`
    /// override fragments in `self` with the same name.
    pub fn merge(&mut self, other: TemplateRegistry) {
        self.fragments.extend(other.fragments);
    }

    pub fn get(&self, name: &str) -> Option<&FragmentNode> {
        self.fragments.get(name)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.keys().map(String::as_str)
    }

    /// Clone the fragment `name` into `target` and return its slots.
    pub fn bind(
        &self,
        doc: &mut Document,
        name: &str,
        target: NodeId,
    ) -> Result<SlotMap, TemplateError> {
        let fragment = self
            .fragments
            .get(name)
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        let mut slots = SlotMap::default();
        let root = fragment.instantiate(doc, &mut slots);
        doc.append_child(target, root);
        tracing::debug!(template = name, slots = slots.len(), "bound template");
        Ok(slots)
    }

    /// Bind the template behind a typed slot record.
    pub fn bind_record<R: SlotRecord>(
        &self,
        doc: &mut Document,
        target: NodeId,
    ) -> Result<R, TemplateError> {
        let slots = self.bind(doc, R::TEMPLATE, target)?;
        R::from_slots(&slots)
    }

    /// Verify that the template behind `R` exists and declares every slot
    /// `R` needs.
    pub fn check<R: SlotRecord>(&self) -> Result<(), TemplateError> {
        let fragment = self
            .fragments
            .get(R::TEMPLATE)
            .ok_or_else(|| TemplateError::NotFound(R::TEMPLATE.to_string()))?;
        let declared = fragment.slot_names();
        for slot in R::SLOTS {
            if !declared.contains(slot) {
                return Err(missing(R::TEMPLATE, slot));
            }
        }
        Ok(())
    }
}

/// Clone the fragment `name` from `registry` into `target`.
pub fn bind_template(
    doc: &mut Document,
    registry: &TemplateRegistry,
    name: &str,
    target: NodeId,
) -> Result<SlotMap, TemplateError> {
    registry.bind(doc, name, target)
}

/// A typed view over the slots of one template.
pub trait SlotRecord: Sized {
    /// Registry name of the template.
    const TEMPLATE: &'static str;
    /// Slots the record reads.
    const SLOTS: &'static [&'static str];

    fn from_slots(slots: &SlotMap) -> Result<Self, TemplateError>;
}

fn missing(template: &str, slot: &str) -> TemplateError {
    TemplateError::MissingSlot {
        template: template.to_string(),
        slot: slot.to_string(),
    }
}

fn take_slot(slots: &SlotMap, template: &str, slot: &str) -> Result<NodeId, TemplateError> {
    slots.get(slot).copied().ok_or_else(|| missing(template, slot))
}

/// Where a submitted question's text goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSlots {
    pub question: NodeId,
}

impl SlotRecord for QuestionSlots {
    const TEMPLATE: &'static str = "question";
    const SLOTS: &'static [&'static str] = &["question"];

    fn from_slots(slots: &SlotMap) -> Result<Self, TemplateError> {
        Ok(Self {
            question: take_slot(slots, Self::TEMPLATE, "question")?,
        })
    }
}

/// Container the answer message tree renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSlots {
    pub response: NodeId,
}

impl SlotRecord for ResponseSlots {
    const TEMPLATE: &'static str = "response";
    const SLOTS: &'static [&'static str] = &["response"];

    fn from_slots(slots: &SlotMap) -> Result<Self, TemplateError> {
        Ok(Self {
            response: take_slot(slots, Self::TEMPLATE, "response")?,
        })
    }
}

/// The three lists of the tutorial placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialSlots {
    pub examples: NodeId,
    pub capabilities: NodeId,
    pub limitations: NodeId,
}

impl SlotRecord for TutorialSlots {
    const TEMPLATE: &'static str = "examples";
    const SLOTS: &'static [&'static str] = &["examples", "capabilities", "limitations"];

    fn from_slots(slots: &SlotMap) -> Result<Self, TemplateError> {
        Ok(Self {
            examples: take_slot(slots, Self::TEMPLATE, "examples")?,
            capabilities: take_slot(slots, Self::TEMPLATE, "capabilities")?,
            limitations: take_slot(slots, Self::TEMPLATE, "limitations")?,
        })
    }
}
