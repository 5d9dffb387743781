/// Persona Linter: validates a persona file and, optionally, a template registry.
///
/// Usage: persona_linter <persona.json> [--templates <path>] [--normalization all|first-only]

use clap::{Parser, ValueEnum};
use persona_chat::core::resolver::{KeywordIndex, Normalization, Resolver};
use persona_chat::core::template::{
    QuestionSlots, ResponseSlots, TemplateRegistry, TutorialSlots,
};
use persona_chat::schema::message::{MessageContent, MessageNode};
use persona_chat::schema::persona::Persona;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    All,
    FirstOnly,
}

impl From<Mode> for Normalization {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::All => Normalization::All,
            Mode::FirstOnly => Normalization::FirstOnly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "persona_linter", about = "Validate a persona file")]
struct Args {
    /// Persona file (JSON).
    persona: String,

    /// Template registry (RON) to check for the required fragments.
    #[arg(long)]
    templates: Option<String>,

    /// Question normalization the widget will use.
    #[arg(long, value_enum, default_value_t = Mode::All)]
    normalization: Mode,
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("error"))
        .without_time()
        .init();

    let persona = match Persona::load_from_json(Path::new(&args.persona)) {
        Ok(persona) => persona,
        Err(e) => {
            eprintln!("ERROR: Failed to load persona: {}", e);
            process::exit(1);
        }
    };

    println!(
        "Loaded {} responses, {} canned questions",
        persona.responses.len(),
        persona.questions.len()
    );

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if let Some(ref path) = args.templates {
        match TemplateRegistry::load_from_ron(Path::new(path)) {
            Ok(registry) => {
                for result in [
                    registry.check::<QuestionSlots>(),
                    registry.check::<ResponseSlots>(),
                    registry.check::<TutorialSlots>(),
                ] {
                    if let Err(e) = result {
                        errors.push(e.to_string());
                    }
                }
            }
            Err(e) => errors.push(format!("failed to load templates: {}", e)),
        }
    }

    let normalization: Normalization = args.normalization.into();
    lint_persona(&persona, normalization, &mut errors, &mut warnings);

    println!("\n=== Persona Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_persona(
    persona: &Persona,
    normalization: Normalization,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let index = KeywordIndex::build(&persona.responses);
    for collision in index.collisions() {
        warnings.push(format!(
            "keyword '{}' in response #{} is shadowed by response #{}",
            collision.keyword, collision.shadowed, collision.winner
        ));
    }

    for (i, entry) in persona.responses.iter().enumerate() {
        if entry.keywords.is_empty() {
            warnings.push(format!("response #{} has no keywords and can never be chosen", i));
        }
        if entry.messages.is_empty() {
            errors.push(format!("response #{} has no messages", i));
        }
        for keyword in &entry.keywords {
            if let Some(reason) = unmatchable(keyword, normalization) {
                errors.push(format!(
                    "keyword '{}' in response #{} can never match: {}",
                    keyword, i, reason
                ));
            }
        }
        for message in &entry.messages {
            lint_message(message, i, errors, warnings);
        }
    }

    let resolver = Resolver::new(index, "", normalization);
    for question in &persona.questions {
        if resolver.matched_keyword(&question.text).is_none() {
            warnings.push(format!(
                "canned question '{}' only gets the fallback answer",
                question.id
            ));
        }
    }
}

fn unmatchable(keyword: &str, normalization: Normalization) -> Option<&'static str> {
    let key = keyword.trim();
    if key.is_empty() {
        return Some("empty");
    }
    if key.contains(char::is_whitespace) {
        return Some("questions are split on spaces");
    }
    if normalization == Normalization::All && normalization.apply(key) != key.to_lowercase() {
        return Some("punctuation is stripped from questions");
    }
    None
}

fn lint_message(
    message: &MessageNode,
    response: usize,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    message.walk(&mut |node| {
        let tag: &str = if node.tag.is_empty() { "<untagged>" } else { &node.tag };
        match &node.content {
            MessageContent::Unsupported(value) => errors.push(format!(
                "response #{}: '{}' node has unsupported content {}",
                response, tag, value
            )),
            MessageContent::Children(_) if node.is_image() => errors.push(format!(
                "response #{}: image node has children instead of a source",
                response
            )),
            MessageContent::Text(text) if text.is_empty() && !node.is_image() => warnings.push(
                format!("response #{}: '{}' node has empty text", response, tag),
            ),
            _ => {}
        }
        if node.link.is_some() && node.tag.is_empty() {
            warnings.push(format!(
                "response #{}: link on an untagged node is ignored",
                response
            ));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lint(json: &str) -> (Vec<String>, Vec<String>) {
        let persona = Persona::parse_json(json).unwrap();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        lint_persona(&persona, Normalization::All, &mut errors, &mut warnings);
        (errors, warnings)
    }

    #[test]
    fn clean_persona_passes() {
        let (errors, warnings) = lint(
            r#"{"questions": [{"id": "v", "text": "vacation?"}],
                "responses": [{"keywords": ["vacation"], "messages": [{"el": "p", "content": "Hi"}]}]}"#,
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn reports_shadowed_keywords() {
        let (_, warnings) = lint(
            r#"{"responses": [
                {"keywords": ["pets"], "messages": [{"el": "p", "content": "a"}]},
                {"keywords": ["pets"], "messages": [{"el": "p", "content": "b"}]}
            ]}"#,
        );
        assert!(warnings.iter().any(|w| w.contains("'pets' in response #0 is shadowed by response #1")));
    }

    #[test]
    fn reports_unmatchable_keywords() {
        let (errors, _) = lint(
            r#"{"responses": [{"keywords": ["ice cream", "what?"], "messages": [{"el": "p", "content": "a"}]}]}"#,
        );
        assert_eq!(errors.len(), 2, "{errors:?}");
    }

    #[test]
    fn reports_malformed_nodes() {
        let (errors, warnings) = lint(
            r#"{"responses": [{"keywords": ["x"], "messages": [
                {"el": "p", "content": 3},
                {"el": "img", "content": [{"el": "p", "content": "no"}]},
                {"el": "", "link": "https://example.com", "content": "bare"}
            ]}]}"#,
        );
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(warnings.iter().any(|w| w.contains("untagged")));
    }

    #[test]
    fn reports_questions_without_keywords() {
        let (_, warnings) = lint(r#"{"questions": [{"id": "q", "text": "hello"}]}"#);
        assert!(warnings.iter().any(|w| w.contains("'q' only gets the fallback")));
    }
}
