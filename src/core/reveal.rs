/// Word-by-word text reveal.
///
/// A [`Reveal`] owns one freshly created, empty text region. Each
/// [`Reveal::resume`] shows exactly one more word and suspends; the resume
/// after the last word removes the trailing cursor marker and completes.

use std::collections::VecDeque;

use crate::core::document::{Document, NodeId};

/// Default class of the trailing in-progress marker.
pub const CURSOR_CLASS: &str = "chat-block-cursor";

/// Outcome of one resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPoll {
    /// A word was shown; resume again after the tick interval.
    Suspended,
    /// Every word is shown and the marker is gone.
    Done,
}

#[derive(Debug, Clone)]
pub struct Reveal {
    region: NodeId,
    words: VecDeque<String>,
    shown: usize,
    marker: Option<NodeId>,
    cursor_class: String,
    started: bool,
    finished: bool,
}

impl Reveal {
    pub fn new<I>(region: NodeId, words: I, cursor_class: &str) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            region,
            words: words.into_iter().collect(),
            shown: 0,
            marker: None,
            cursor_class: cursor_class.to_string(),
            started: false,
            finished: false,
        }
    }

    /// Reveal `text` split on single spaces.
    pub fn from_text(region: NodeId, text: &str, cursor_class: &str) -> Self {
        Self::new(region, text.split(' ').map(str::to_string), cursor_class)
    }

    pub fn remaining(&self) -> usize {
        self.words.len()
    }

    pub fn is_done(&self) -> bool {
        self.finished
    }

    pub fn resume(&mut self, doc: &mut Document) -> RevealPoll {
        if self.finished {
            return RevealPoll::Done;
        }
        if !self.started {
            self.started = true;
            self.marker = Some(self.ensure_marker(doc));
        }

        match self.words.pop_front() {
            Some(word) => {
                if self.shown == 0 {
                    doc.append_text(self.region, &word);
                } else {
                    doc.append_text(self.region, &format!(" {word}"));
                }
                self.shown += 1;
                doc.scroll_into_view(self.region);
                tracing::trace!(region = self.region.0, word = %word, "revealed word");
                RevealPoll::Suspended
            }
            None => {
                if let Some(marker) = self.marker.take() {
                    doc.remove(marker);
                }
                self.finished = true;
                RevealPoll::Done
            }
        }
    }

    /// Resume until done without waiting between words.
    pub fn run_to_end(&mut self, doc: &mut Document) {
        while self.resume(doc) == RevealPoll::Suspended {}
    }

    /// Reuse a marker already sitting right after the region, otherwise
    /// insert a new one there.
    fn ensure_marker(&self, doc: &mut Document) -> NodeId {
        if let Some(next) = doc.next_sibling(self.region) {
            if doc.has_class(next, &self.cursor_class) {
                return next;
            }
        }
        let marker = doc.create_element("span");
        doc.add_class(marker, &self.cursor_class);
        doc.insert_after(self.region, marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURSOR: &str = CURSOR_CLASS;

    fn setup() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new("div");
        let root = doc.root();
        doc.set_scrollable(root, true);
        let parent = doc.create_element("p");
        doc.append_child(root, parent);
        let region = doc.create_element("span");
        doc.append_child(parent, region);
        (doc, parent, region)
    }

    #[test]
    fn reveals_one_word_per_resume() {
        let (mut doc, parent, region) = setup();
        let mut reveal = Reveal::new(region, ["a", "b", "c"].map(String::from), CURSOR);

        assert_eq!(reveal.resume(&mut doc), RevealPoll::Suspended);
        assert_eq!(doc.text_content(region), "a");
        assert_eq!(doc.find_by_class(parent, CURSOR).len(), 1);

        assert_eq!(reveal.resume(&mut doc), RevealPoll::Suspended);
        assert_eq!(doc.text_content(region), "a b");

        assert_eq!(reveal.resume(&mut doc), RevealPoll::Suspended);
        assert_eq!(doc.text_content(region), "a b c");
        assert_eq!(reveal.remaining(), 0);

        assert_eq!(reveal.resume(&mut doc), RevealPoll::Done);
        assert!(doc.find_by_class(parent, CURSOR).is_empty());
        assert_eq!(doc.text_content(region), "a b c");
    }

    #[test]
    fn marker_sits_right_after_region() {
        let (mut doc, _, region) = setup();
        let mut reveal = Reveal::from_text(region, "hello world", CURSOR);
        reveal.resume(&mut doc);
        let marker = doc.next_sibling(region).unwrap();
        assert!(doc.has_class(marker, CURSOR));
    }

    #[test]
    fn existing_marker_is_reused() {
        let (mut doc, parent, region) = setup();
        let existing = doc.create_element("span");
        doc.add_class(existing, CURSOR);
        doc.append_child(parent, existing);

        let mut reveal = Reveal::from_text(region, "one", CURSOR);
        reveal.resume(&mut doc);
        assert_eq!(doc.find_by_class(parent, CURSOR), vec![existing]);
        reveal.run_to_end(&mut doc);
        assert!(doc.find_by_class(parent, CURSOR).is_empty());
    }

    #[test]
    fn empty_word_list_cleans_up_marker_at_once() {
        let (mut doc, parent, region) = setup();
        let mut reveal = Reveal::new(region, Vec::<String>::new(), CURSOR);
        assert_eq!(reveal.resume(&mut doc), RevealPoll::Done);
        assert!(doc.find_by_class(parent, CURSOR).is_empty());
        assert_eq!(doc.text_content(region), "");
        assert!(reveal.is_done());
    }

    #[test]
    fn leading_space_is_an_empty_first_word() {
        let (mut doc, _, region) = setup();
        let mut reveal = Reveal::from_text(region, " peppers", CURSOR);
        reveal.run_to_end(&mut doc);
        assert_eq!(doc.text_content(region), " peppers");
    }

    #[test]
    fn words_are_single_space_separated_in_order() {
        let (mut doc, _, region) = setup();
        let words: Vec<String> = (0..20).map(|i| format!("w{i}")).collect();
        let expected = words.join(" ");
        let mut reveal = Reveal::new(region, words, CURSOR);
        reveal.run_to_end(&mut doc);
        assert_eq!(doc.text_content(region), expected);
    }

    #[test]
    fn scrolls_nearest_scrollable_ancestor() {
        let (mut doc, _, region) = setup();
        let root = doc.root();
        let mut reveal = Reveal::from_text(region, "hi", CURSOR);
        reveal.resume(&mut doc);
        assert_eq!(doc.scroll_position(root), Some(region));
    }

    #[test]
    fn resume_after_done_is_a_no_op() {
        let (mut doc, _, region) = setup();
        let mut reveal = Reveal::from_text(region, "x", CURSOR);
        reveal.run_to_end(&mut doc);
        assert_eq!(reveal.resume(&mut doc), RevealPoll::Done);
        assert_eq!(doc.text_content(region), "x");
    }
}
