/// The chat widget: turn orchestration on top of the binder, resolver and
/// scheduler.
///
/// `submit` renders the question, resolves it and queues the answer for
/// animation, then returns. The answer reveals as the scheduler ticks.

use std::path::Path;
use thiserror::Error;

use crate::core::config::{ConfigError, WidgetConfig};
use crate::core::document::{Document, NodeId};
use crate::core::render::RenderTask;
use crate::core::resolver::{KeywordIndex, Resolver};
use crate::core::scheduler::{Scheduler, TaskId};
use crate::core::template::{
    QuestionSlots, ResponseSlots, SlotRecord, TemplateError, TemplateRegistry, TutorialSlots,
};
use crate::schema::persona::{CannedQuestion, Persona, PersonaError};

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("persona error: {0}")]
    Persona(#[from] PersonaError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("unknown question id: {0}")]
    UnknownQuestion(String),
}

/// One submitted question, kept for the session only.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub question: String,
    /// Keyword that picked the answer; `None` means the fallback.
    pub keyword: Option<String>,
    pub task: TaskId,
}

pub struct ChatWidget {
    scheduler: Scheduler,
    templates: TemplateRegistry,
    resolver: Resolver,
    persona: Persona,
    config: WidgetConfig,
    answer_area: NodeId,
    placeholder: Option<NodeId>,
    history: Vec<Turn>,
}

/// Builder for constructing a `ChatWidget`.
#[derive(Default)]
pub struct ChatWidgetBuilder {
    persona_path: Option<String>,
    templates_path: Option<String>,
    config_path: Option<String>,
    /// Directly provided persona (for testing without files).
    persona: Option<Persona>,
    /// Directly provided templates (for testing without files).
    templates: Option<TemplateRegistry>,
    config: Option<WidgetConfig>,
}

impl ChatWidget {
    pub fn builder() -> ChatWidgetBuilder {
        ChatWidgetBuilder::default()
    }

    /// Render `question`, resolve it and queue the answer. Returns as soon
    /// as the answer is queued; it reveals on subsequent ticks.
    pub fn submit(&mut self, question: &str) -> Result<TaskId, WidgetError> {
        let answer_area = self.answer_area;
        let doc = self.scheduler.document_mut();

        if let Some(placeholder) = self.placeholder.take() {
            if doc.children(answer_area) == [placeholder] {
                doc.clear_children(answer_area);
            }
        }

        let question_slots: QuestionSlots = self.templates.bind_record(doc, answer_area)?;
        doc.set_text(question_slots.question, question);

        let keyword = self.resolver.matched_keyword(question);
        let messages = self.resolver.resolve(question).to_vec();

        let response_slots: ResponseSlots = self.templates.bind_record(doc, answer_area)?;
        let task = self.scheduler.spawn(RenderTask::new(
            response_slots.response,
            messages,
            &self.config.cursor_class,
        ));

        tracing::info!(
            question,
            keyword = keyword.as_deref().unwrap_or("<fallback>"),
            task = task.0,
            "submitted turn"
        );
        self.history.push(Turn {
            question: question.to_string(),
            keyword,
            task,
        });
        Ok(task)
    }

    /// Submit the canned question with the given id.
    pub fn ask(&mut self, question_id: &str) -> Result<TaskId, WidgetError> {
        let text = self
            .persona
            .question(question_id)
            .map(|q| q.text.clone())
            .ok_or_else(|| WidgetError::UnknownQuestion(question_id.to_string()))?;
        self.submit(&text)
    }

    /// Advance every in-flight answer by one word. Returns how many are
    /// still running.
    pub fn tick(&mut self) -> usize {
        self.scheduler.tick()
    }

    /// Finish every in-flight answer without waiting.
    pub fn drain(&mut self) {
        self.scheduler.drain();
    }

    /// Animate every in-flight answer on the configured tick interval.
    #[cfg(feature = "async-driver")]
    pub async fn run_until_idle(&mut self) {
        self.scheduler.run_until_idle().await;
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    pub fn is_running(&self, task: TaskId) -> bool {
        self.scheduler.is_running(task)
    }

    pub fn document(&self) -> &Document {
        self.scheduler.document()
    }

    pub fn answer_area(&self) -> NodeId {
        self.answer_area
    }

    /// True while the tutorial placeholder is still showing.
    pub fn shows_placeholder(&self) -> bool {
        self.placeholder.is_some()
    }

    pub fn to_html(&self) -> String {
        let doc = self.scheduler.document();
        doc.to_html(doc.root())
    }

    pub fn questions(&self) -> &[CannedQuestion] {
        &self.persona.questions
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }
}

impl ChatWidgetBuilder {
    pub fn persona_path(mut self, path: &str) -> Self {
        self.persona_path = Some(path.to_string());
        self
    }

    pub fn templates_path(mut self, path: &str) -> Self {
        self.templates_path = Some(path.to_string());
        self
    }

    pub fn config_path(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    /// Provide the persona directly (for testing without files).
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = Some(persona);
        self
    }

    /// Provide templates directly (for testing without files).
    pub fn with_templates(mut self, templates: TemplateRegistry) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn with_config(mut self, config: WidgetConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the widget. Missing templates or slots are fatal; a persona
    /// that fails to load is replaced by the empty persona.
    pub fn build(self) -> Result<ChatWidget, WidgetError> {
        let config = match (self.config, &self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => WidgetConfig::load_from_ron(Path::new(path))?,
            (None, None) => WidgetConfig::default(),
        };

        let mut templates = self.templates.unwrap_or_default();
        if let Some(ref path) = self.templates_path {
            templates.merge(TemplateRegistry::load_from_ron(Path::new(path))?);
        }
        templates.check::<QuestionSlots>()?;
        templates.check::<ResponseSlots>()?;
        templates.check::<TutorialSlots>()?;

        let persona = match (self.persona, &self.persona_path) {
            (Some(persona), _) => persona,
            (None, Some(path)) => Persona::load_or_default(Path::new(path)),
            (None, None) => Persona::default(),
        };

        let resolver = Resolver::new(
            KeywordIndex::build(&persona.responses),
            &config.fallback_text,
            config.normalization,
        );
        tracing::debug!(
            keywords = resolver.index().len(),
            questions = persona.questions.len(),
            "built keyword index"
        );

        let mut doc = Document::new("div");
        let root = doc.root();
        doc.add_class(root, "chat");
        doc.set_scrollable(root, true);
        let answer_area = doc.create_element("div");
        doc.add_class(answer_area, "chat-response");
        doc.append_child(root, answer_area);

        let placeholder = show_tutorial(&mut doc, &templates, &persona, answer_area, &config)?;

        Ok(ChatWidget {
            scheduler: Scheduler::new(doc, config.tick_interval()),
            templates,
            resolver,
            persona,
            config,
            answer_area,
            placeholder: Some(placeholder),
            history: Vec::new(),
        })
    }
}

/// Fill the tutorial template into the answer area, instantly.
fn show_tutorial(
    doc: &mut Document,
    templates: &TemplateRegistry,
    persona: &Persona,
    answer_area: NodeId,
    config: &WidgetConfig,
) -> Result<NodeId, WidgetError> {
    let slots: TutorialSlots = templates.bind_record(doc, answer_area)?;
    let tutorial = &persona.tutorial;
    for (slot, lines) in [
        (slots.examples, &tutorial.examples),
        (slots.capabilities, &tutorial.capabilities),
        (slots.limitations, &tutorial.limitations),
    ] {
        for line in lines {
            let li = doc.create_element("li");
            doc.set_text(li, line);
            doc.append_child(slot, li);
        }
    }

    // The bound fragment root is the last child of the answer area.
    let placeholder = doc
        .children(answer_area)
        .last()
        .copied()
        .ok_or_else(|| TemplateError::NotFound(TutorialSlots::TEMPLATE.to_string()))?;
    doc.add_class(placeholder, &config.placeholder_class);
    Ok(placeholder)
}
