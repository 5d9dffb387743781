//! WASM bindings for persona-chat: powers the embeddable web demo.
//!
//! JS owns the timer: call `tick()` every `tick_interval_ms()` until it
//! returns false, then re-render from `html()`.

use wasm_bindgen::prelude::*;

use persona_chat::core::config::WidgetConfig;
use persona_chat::core::template::TemplateRegistry;
use persona_chat::core::widget::ChatWidget;
use persona_chat::schema::persona::Persona;

// ---------------------------------------------------------------------------
// Embedded default data: compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const TEMPLATES: &str = include_str!("../../persona_data/default/templates.ron");
    pub const CONFIG: &str = include_str!("../../persona_data/default/config.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct QuestionInfo<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(serde::Serialize)]
struct TurnInfo<'a> {
    question: &'a str,
    keyword: Option<&'a str>,
    done: bool,
}

#[wasm_bindgen]
pub struct ChatDemo {
    widget: ChatWidget,
}

#[wasm_bindgen]
impl ChatDemo {
    /// Create a chat for the persona given as JSON. A persona that fails to
    /// parse gives an empty persona, which answers everything with the
    /// fallback.
    #[wasm_bindgen(constructor)]
    pub fn new(persona_json: &str) -> Result<ChatDemo, JsError> {
        let templates = TemplateRegistry::parse_ron(data::TEMPLATES)
            .map_err(|e| JsError::new(&format!("Template parse error: {e}")))?;
        let config = WidgetConfig::parse_ron(data::CONFIG)
            .map_err(|e| JsError::new(&format!("Config parse error: {e}")))?;
        let persona = Persona::parse_json_or_default(persona_json);

        let widget = ChatWidget::builder()
            .with_templates(templates)
            .with_config(config)
            .with_persona(persona)
            .build()
            .map_err(|e| JsError::new(&format!("Widget build error: {e}")))?;

        Ok(ChatDemo { widget })
    }

    /// Submit a free-text question. The answer reveals on later ticks.
    pub fn submit(&mut self, question: &str) -> Result<(), JsError> {
        self.widget
            .submit(question)
            .map(|_| ())
            .map_err(|e| JsError::new(&format!("Submit error: {e}")))
    }

    /// Submit the canned question with the given id.
    pub fn ask(&mut self, question_id: &str) -> Result<(), JsError> {
        self.widget
            .ask(question_id)
            .map(|_| ())
            .map_err(|e| JsError::new(&format!("Ask error: {e}")))
    }

    /// Reveal one more word of every pending answer. Returns true while
    /// anything is still animating.
    pub fn tick(&mut self) -> bool {
        self.widget.tick() > 0
    }

    /// Finish every pending answer at once.
    pub fn drain(&mut self) {
        self.widget.drain();
    }

    /// The whole chat as HTML.
    pub fn html(&self) -> String {
        self.widget.to_html()
    }

    /// Return JSON array of `{id, text}` canned questions.
    pub fn questions(&self) -> String {
        let questions: Vec<QuestionInfo> = self
            .widget
            .questions()
            .iter()
            .map(|q| QuestionInfo {
                id: &q.id,
                text: &q.text,
            })
            .collect();
        serde_json::to_string(&questions).unwrap_or_else(|_| "[]".to_string())
    }

    /// Return JSON array of the questions asked this session.
    pub fn history(&self) -> String {
        let turns: Vec<TurnInfo> = self
            .widget
            .history()
            .iter()
            .map(|turn| TurnInfo {
                question: &turn.question,
                keyword: turn.keyword.as_deref(),
                done: !self.widget.is_running(turn.task),
            })
            .collect();
        serde_json::to_string(&turns).unwrap_or_else(|_| "[]".to_string())
    }

    /// Milliseconds JS should wait between ticks.
    pub fn tick_interval_ms(&self) -> u32 {
        self.widget.config().tick_interval().as_millis() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo(persona_json: &str) -> ChatDemo {
        ChatDemo::new(persona_json)
            .ok()
            .expect("embedded templates and config should build")
    }

    #[test]
    fn broken_persona_answers_with_fallback() {
        let mut chat = demo("{\"responses\": [");
        assert_eq!(chat.questions(), "[]");
        assert!(chat.submit("anything").is_ok());
        chat.drain();
        assert!(chat.html().contains("I dunno mate."));
        assert_eq!(
            chat.history(),
            r#"[{"question":"anything","keyword":null,"done":true}]"#
        );
    }

    #[test]
    fn persona_json_drives_answers() {
        let mut chat = demo(
            r#"{"questions": [{"id": "v", "text": "Vacation?"}],
                "responses": [{"keywords": ["vacation"], "messages": [{"el": "p", "content": "Lisbon in spring"}]}]}"#,
        );
        assert_eq!(chat.questions(), r#"[{"id":"v","text":"Vacation?"}]"#);
        assert!(chat.ask("v").is_ok());
        assert!(chat.tick());
        assert!(!chat.html().contains("Lisbon in spring"));
        chat.drain();
        assert!(!chat.tick());
        assert!(chat.html().contains("Lisbon in spring"));
        assert_eq!(chat.tick_interval_ms(), 50);
    }
}
