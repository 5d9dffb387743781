/// Rendering property tests: tree shape, order and word spacing.

use persona_chat::core::document::{Document, NodeId};
use persona_chat::core::render::{render_into, RenderTask, TaskPoll, REGION_CLASS};
use persona_chat::core::reveal::{Reveal, CURSOR_CLASS};
use persona_chat::core::template::{bind_template, FragmentNode, TemplateRegistry};
use persona_chat::schema::message::{MessageContent, MessageNode};
use persona_chat::schema::persona::Persona;

fn scrollable_doc() -> Document {
    let mut doc = Document::new("div");
    let root = doc.root();
    doc.set_scrollable(root, true);
    doc
}

/// Expected leaf texts in declaration order; `None` marks a media leaf.
fn expected_leaves(node: &MessageNode, out: &mut Vec<Option<String>>) {
    match &node.content {
        MessageContent::Text(_) if node.is_image() => out.push(None),
        MessageContent::Text(text) => out.push(Some(text.clone())),
        MessageContent::Children(children) => {
            for child in children {
                expected_leaves(child, out);
            }
        }
        MessageContent::Unsupported(_) => {}
    }
}

/// Rendered leaves in document order.
fn rendered_leaves(doc: &Document, root: NodeId) -> Vec<Option<String>> {
    doc.descendants(root)
        .into_iter()
        .filter_map(|id| {
            if doc.has_class(id, REGION_CLASS) {
                Some(Some(doc.text_content(id)))
            } else if doc.tag(id) == Some("img") {
                Some(None)
            } else {
                None
            }
        })
        .collect()
}

#[test]
fn every_shipped_response_preserves_shape_and_order() {
    let persona = Persona::load_from_json(std::path::Path::new("persona_data/default/persona.json")).unwrap();
    assert!(!persona.responses.is_empty());

    for entry in &persona.responses {
        let mut doc = scrollable_doc();
        let root = doc.root();
        let mut expected = Vec::new();
        for message in &entry.messages {
            expected_leaves(message, &mut expected);
            render_into(&mut doc, root, message);
        }
        assert_eq!(rendered_leaves(&doc, root), expected, "entry {:?}", entry.keywords);
        assert!(doc.find_by_class(root, CURSOR_CLASS).is_empty());
    }
}

#[test]
fn deep_nesting_renders_without_a_depth_limit() {
    let mut node = MessageNode::text("span", "bottom");
    for _ in 0..200 {
        node = MessageNode::children("div", vec![node]);
    }
    let mut doc = scrollable_doc();
    let root = doc.root();
    render_into(&mut doc, root, &node);
    assert_eq!(doc.find_by_tag(root, "div").len(), 200);
    assert_eq!(doc.text_content(root), "bottom");
}

#[test]
fn reveal_spacing_for_many_word_lists() {
    let lists: Vec<Vec<&str>> = vec![
        vec![],
        vec!["solo"],
        vec!["a", "b"],
        vec!["The", "quick", "brown", "fox", "jumped", "over", "the", "lazy", "fox"],
    ];
    for words in lists {
        let mut doc = scrollable_doc();
        let root = doc.root();
        let region = doc.create_element("span");
        doc.append_child(root, region);
        let mut reveal = Reveal::new(region, words.iter().map(|w| w.to_string()), CURSOR_CLASS);

        let mut progression = Vec::new();
        while reveal.resume(&mut doc) == persona_chat::core::reveal::RevealPoll::Suspended {
            progression.push(doc.text_content(region));
        }
        let expected: Vec<String> = (1..=words.len()).map(|n| words[..n].join(" ")).collect();
        assert_eq!(progression, expected);
        assert!(doc.find_by_class(root, CURSOR_CLASS).is_empty());
    }
}

#[test]
fn rendering_never_touches_earlier_siblings() {
    let mut doc = scrollable_doc();
    let root = doc.root();
    let earlier = doc.create_element("p");
    doc.append_child(root, earlier);
    doc.set_text(earlier, "already here");
    let before = doc.to_html(earlier);

    let mut task = RenderTask::new(
        root,
        vec![MessageNode::text("", "inline words"), MessageNode::text("p", "more")],
        CURSOR_CLASS,
    );
    while task.resume(&mut doc) == TaskPoll::Pending {
        assert_eq!(doc.to_html(earlier), before);
        assert_eq!(doc.children(root)[0], earlier);
    }
}

#[test]
fn binder_feeds_renderer() {
    let mut registry = TemplateRegistry::new();
    registry
        .register(
            "response",
            FragmentNode::new("div")
                .class("chat-answer")
                .child(FragmentNode::new("div").slot("response")),
        )
        .unwrap();

    let mut doc = scrollable_doc();
    let root = doc.root();
    let first = bind_template(&mut doc, &registry, "response", root).unwrap();
    let second = bind_template(&mut doc, &registry, "response", root).unwrap();
    render_into(&mut doc, first["response"], &MessageNode::text("p", "first"));
    render_into(&mut doc, second["response"], &MessageNode::text("p", "second"));

    assert_eq!(doc.text_content(first["response"]), "first");
    assert_eq!(doc.text_content(second["response"]), "second");
    assert_eq!(doc.find_by_class(root, "chat-answer").len(), 2);
}
