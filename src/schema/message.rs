use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Tag whose string content is a media source rather than text to reveal.
pub const IMAGE_TAG: &str = "img";

/// One node of a structured answer.
///
/// An empty `tag` means the content is rendered straight into the parent's
/// container instead of into a new wrapping element.
///
/// Deserialization never fails: a malformed node keeps whatever parts are
/// usable, and anything else becomes [`MessageContent::Unsupported`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageNode {
    #[serde(rename = "el")]
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub content: MessageContent,
}

/// The payload of a [`MessageNode`]: a leaf string or an ordered list of
/// children, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Children(Vec<MessageNode>),
    /// Any other JSON shape. Rendered as nothing.
    Unsupported(Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Unsupported(Value::Null)
    }
}

impl<'de> Deserialize<'de> for MessageNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(MessageNode::from_value)
    }
}

/// A string field, or `None` with a warning when the value has another shape.
fn string_field(map: &mut serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => {
            tracing::warn!(field = key, value = %other, "ignoring message field that is not a string");
            None
        }
    }
}

impl MessageNode {
    /// Build a node from arbitrary JSON. Children are converted one by one,
    /// so one bad child does not take its siblings with it.
    pub fn from_value(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                tracing::warn!(value = %other, "message node is not an object");
                return Self {
                    tag: String::new(),
                    link: None,
                    content: MessageContent::Unsupported(other),
                };
            }
        };

        let tag = string_field(&mut map, "el").unwrap_or_default();
        let link = string_field(&mut map, "link");
        let content = match map.remove("content").unwrap_or(Value::Null) {
            Value::String(text) => MessageContent::Text(text),
            Value::Array(children) => {
                MessageContent::Children(children.into_iter().map(Self::from_value).collect())
            }
            other => MessageContent::Unsupported(other),
        };

        Self { tag, link, content }
    }

    /// A leaf node holding literal text (or a media source for `img`).
    pub fn text(tag: &str, text: &str) -> Self {
        Self {
            tag: tag.to_string(),
            link: None,
            content: MessageContent::Text(text.to_string()),
        }
    }

    /// An interior node holding children in render order.
    pub fn children(tag: &str, children: Vec<MessageNode>) -> Self {
        Self {
            tag: tag.to_string(),
            link: None,
            content: MessageContent::Children(children),
        }
    }

    pub fn with_link(mut self, link: &str) -> Self {
        self.link = Some(link.to_string());
        self
    }

    pub fn is_image(&self) -> bool {
        self.tag == IMAGE_TAG
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.content, MessageContent::Children(_))
    }

    /// Number of string leaves in this subtree, media leaves included.
    pub fn leaf_count(&self) -> usize {
        match &self.content {
            MessageContent::Text(_) => 1,
            MessageContent::Children(children) => children.iter().map(Self::leaf_count).sum(),
            MessageContent::Unsupported(_) => 0,
        }
    }

    /// Calls `visit` on this node and every descendant, depth-first in
    /// declaration order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a MessageNode)) {
        visit(self);
        if let MessageContent::Children(children) = &self.content {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_leaf_node() {
        let node: MessageNode = serde_json::from_str(r#"{"el": "p", "content": "Hello"}"#).unwrap();
        assert_eq!(node, MessageNode::text("p", "Hello"));
        assert!(node.is_leaf());
    }

    #[test]
    fn parse_nested_node_with_link() {
        let json = r#"{
            "el": "li",
            "content": [
                {"el": "strong", "content": "Spicy"},
                {"el": "", "content": " peppers"},
                {"el": "a", "link": "https://example.com", "content": "menu"}
            ]
        }"#;
        let node: MessageNode = serde_json::from_str(json).unwrap();
        let MessageContent::Children(children) = &node.content else {
            panic!("expected children, got {:?}", node.content);
        };
        assert_eq!(children.len(), 3);
        assert_eq!(children[1].tag, "");
        assert_eq!(children[2].link.as_deref(), Some("https://example.com"));
        assert_eq!(node.leaf_count(), 3);
    }

    #[test]
    fn unrecognized_content_is_unsupported() {
        let node: MessageNode = serde_json::from_str(r#"{"el": "p", "content": 42}"#).unwrap();
        assert!(matches!(node.content, MessageContent::Unsupported(_)));
        assert_eq!(node.leaf_count(), 0);

        let missing: MessageNode = serde_json::from_str(r#"{"el": "p"}"#).unwrap();
        assert_eq!(missing.content, MessageContent::Unsupported(serde_json::Value::Null));
    }

    #[test]
    fn bad_child_does_not_drop_siblings() {
        let node: MessageNode =
            serde_json::from_str(r#"{"el": "ul", "content": [{"el": "li", "content": "a"}, "oops"]}"#)
                .unwrap();
        let MessageContent::Children(children) = &node.content else {
            panic!("expected children, got {:?}", node.content);
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], MessageNode::text("li", "a"));
        assert_eq!(children[1].content, MessageContent::Unsupported(Value::from("oops")));
        assert_eq!(node.leaf_count(), 1);
    }

    #[test]
    fn non_string_link_and_tag_are_dropped() {
        let node: MessageNode =
            serde_json::from_str(r#"{"el": 3, "link": 5, "content": "ok"}"#).unwrap();
        assert_eq!(node, MessageNode::text("", "ok"));

        let null_link: MessageNode =
            serde_json::from_str(r#"{"el": "p", "link": null, "content": "ok"}"#).unwrap();
        assert_eq!(null_link, MessageNode::text("p", "ok"));
    }

    #[test]
    fn walk_visits_in_declaration_order() {
        let node = MessageNode::children(
            "ul",
            vec![MessageNode::text("li", "one"), MessageNode::text("li", "two")],
        );
        let mut seen = Vec::new();
        node.walk(&mut |n| seen.push(n.tag.clone()));
        assert_eq!(seen, vec!["ul", "li", "li"]);
    }

    #[test]
    fn image_detection() {
        assert!(MessageNode::text("img", "cat.png").is_image());
        assert!(!MessageNode::text("p", "cat.png").is_image());
    }
}
