/// Message tree rendering.
///
/// A [`RenderTask`] walks a message tree depth-first and materializes it
/// into the document. The traversal is held as an explicit frame stack, so
/// the task can stop after every revealed word and pick up where it left
/// off on the next resume. Children render strictly one after another: a
/// sibling starts only once the previous one, animation included, is done.

use std::collections::VecDeque;

use crate::core::document::{Document, NodeId};
use crate::core::reveal::{Reveal, RevealPoll, CURSOR_CLASS};
use crate::schema::message::{MessageContent, MessageNode};

/// Class of the span each text leaf is revealed into.
pub const REGION_CLASS: &str = "chat-reveal";

/// Outcome of one resume of a render task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPoll {
    /// Suspended after a revealed word.
    Pending,
    /// The whole tree is in the document.
    Ready,
}

#[derive(Debug, Clone)]
enum Frame {
    /// Siblings still to render into `container`, in order.
    Nodes {
        container: NodeId,
        pending: VecDeque<MessageNode>,
    },
    Reveal(Reveal),
}

#[derive(Debug, Clone)]
pub struct RenderTask {
    stack: Vec<Frame>,
    cursor_class: String,
    words_shown: usize,
}

impl RenderTask {
    /// Render `nodes` into `container`, one after another.
    pub fn new(container: NodeId, nodes: Vec<MessageNode>, cursor_class: &str) -> Self {
        Self {
            stack: vec![Frame::Nodes {
                container,
                pending: nodes.into(),
            }],
            cursor_class: cursor_class.to_string(),
            words_shown: 0,
        }
    }

    pub fn for_node(container: NodeId, node: MessageNode, cursor_class: &str) -> Self {
        Self::new(container, vec![node], cursor_class)
    }

    pub fn is_ready(&self) -> bool {
        self.stack.is_empty()
    }

    /// Words revealed so far across all leaves.
    pub fn words_shown(&self) -> usize {
        self.words_shown
    }

    /// Advance until the next revealed word or until the tree is complete.
    pub fn resume(&mut self, doc: &mut Document) -> TaskPoll {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return TaskPoll::Ready;
            };
            match frame {
                Frame::Reveal(reveal) => match reveal.resume(doc) {
                    RevealPoll::Suspended => {
                        self.words_shown += 1;
                        return TaskPoll::Pending;
                    }
                    RevealPoll::Done => {
                        self.stack.pop();
                    }
                },
                Frame::Nodes { container, pending } => match pending.pop_front() {
                    Some(node) => {
                        let container = *container;
                        if let Some(next) = open_node(doc, container, node, &self.cursor_class) {
                            self.stack.push(next);
                        }
                    }
                    None => {
                        self.stack.pop();
                    }
                },
            }
        }
    }

    /// Resume until the tree is complete without waiting between words.
    pub fn run_to_end(&mut self, doc: &mut Document) {
        while self.resume(doc) == TaskPoll::Pending {}
    }
}

/// Materialize the element for `node` and return the frame that renders
/// its content, if any.
fn open_node(
    doc: &mut Document,
    container: NodeId,
    node: MessageNode,
    cursor_class: &str,
) -> Option<Frame> {
    let sink = if node.tag.is_empty() {
        container
    } else {
        let el = doc.create_element(&node.tag);
        doc.append_child(container, el)
    };

    if let Some(link) = &node.link {
        if node.tag.is_empty() {
            tracing::warn!(link = %link, "ignoring link on a node without a tag");
        } else {
            doc.set_attribute(sink, "href", link);
            doc.set_attribute(sink, "target", "_blank");
        }
    }

    let is_image = node.is_image();
    match node.content {
        MessageContent::Text(source) if is_image => {
            doc.set_attribute(sink, "src", &source);
            None
        }
        MessageContent::Text(text) => {
            let region = doc.create_element("span");
            doc.add_class(region, REGION_CLASS);
            doc.append_child(sink, region);
            Some(Frame::Reveal(Reveal::from_text(region, &text, cursor_class)))
        }
        MessageContent::Children(children) => Some(Frame::Nodes {
            container: sink,
            pending: children.into(),
        }),
        MessageContent::Unsupported(value) => {
            tracing::warn!(tag = %node.tag, content = %value, "unsupported message content, rendering nothing");
            None
        }
    }
}

/// Render `node` into `container` to completion, with no delay between
/// words.
pub fn render_into(doc: &mut Document, container: NodeId, node: &MessageNode) {
    RenderTask::for_node(container, node.clone(), CURSOR_CLASS).run_to_end(doc);
}
