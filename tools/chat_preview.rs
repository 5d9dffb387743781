/// Chat Preview: interactive shell for trying a persona in the terminal.
///
/// Usage: chat_preview --templates <path> [--persona <path>] [--config <path>] [--instant] [-v]
///
/// Commands:
///   <any text>    : ask a free-text question
///   ask <id>      : ask a canned question
///   questions     : list canned questions
///   history       : list questions asked this session
///   html          : dump the rendered document
///   help          : list commands
///   quit          : exit

use clap::Parser;
use persona_chat::core::document::NodeId;
use persona_chat::core::render::REGION_CLASS;
use persona_chat::core::widget::ChatWidget;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "chat_preview", about = "Try a persona in the terminal")]
struct Args {
    /// Template registry (RON).
    #[arg(long, default_value = "persona_data/default/templates.ron")]
    templates: String,

    /// Persona file (JSON). A missing or broken file gives the empty persona.
    #[arg(long, default_value = "persona_data/default/persona.json")]
    persona: String,

    /// Widget config (RON).
    #[arg(long)]
    config: Option<String>,

    /// Print answers at once instead of word by word.
    #[arg(long)]
    instant: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info,persona_chat=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut builder = ChatWidget::builder()
        .templates_path(&args.templates)
        .persona_path(&args.persona);
    if let Some(ref config) = args.config {
        builder = builder.config_path(config);
    }
    let mut widget = match builder.build() {
        Ok(widget) => widget,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loaded {} canned questions", widget.questions().len());
    println!("Keywords: {}", widget.resolver().index().len());
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("you> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let submitted = match cmd.to_lowercase().as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
                continue;
            }
            "questions" => {
                for q in widget.questions() {
                    println!("  {:<12} {}", q.id, q.text);
                }
                continue;
            }
            "history" => {
                for (i, turn) in widget.history().iter().enumerate() {
                    println!(
                        "  {}. {} [{}]",
                        i + 1,
                        turn.question,
                        turn.keyword.as_deref().unwrap_or("fallback")
                    );
                }
                continue;
            }
            "html" => {
                println!("{}", widget.to_html());
                continue;
            }
            "ask" => widget.ask(rest.trim()),
            _ => widget.submit(line),
        };

        if let Err(e) = submitted {
            println!("ERROR: {}", e);
            continue;
        }

        print!("bot> ");
        let mut stream = AnswerStream::default();
        if args.instant {
            widget.drain();
            print!("{}", stream.advance(&widget));
        } else {
            stream_answer(&mut widget, &mut stream).await;
        }
        println!();
    }
}

/// Tags that start a new line when a reveal region inside them begins.
const BLOCK_TAGS: &[&str] = &["p", "li", "div", "ul", "ol", "h1", "h2", "h3", "img", "blockquote"];

/// Tracks how much of the latest answer has been printed.
#[derive(Debug, Default)]
struct AnswerStream {
    region: usize,
    printed: usize,
}

impl AnswerStream {
    /// Text revealed since the last call. A region that lives in a
    /// different block than the one before it is put on a new line.
    fn advance(&mut self, widget: &ChatWidget) -> String {
        let doc = widget.document();
        let Some(&fragment) = doc.children(widget.answer_area()).last() else {
            return String::new();
        };
        let regions = doc.find_by_class(fragment, REGION_CLASS);
        let mut out = String::new();
        while let Some(&region) = regions.get(self.region) {
            if self.printed == 0
                && self.region > 0
                && block_of(widget, regions[self.region - 1]) != block_of(widget, region)
            {
                out.push('\n');
            }
            let text = doc.text_content(region);
            if let Some(new) = text.get(self.printed..) {
                out.push_str(new);
            }
            self.printed = text.len();
            if self.region + 1 < regions.len() {
                self.region += 1;
                self.printed = 0;
            } else {
                break;
            }
        }
        out
    }
}

fn block_of(widget: &ChatWidget, node: NodeId) -> Option<NodeId> {
    let doc = widget.document();
    let mut current = doc.parent(node);
    while let Some(id) = current {
        if doc.tag(id).is_some_and(|tag| BLOCK_TAGS.contains(&tag)) {
            return Some(id);
        }
        current = doc.parent(id);
    }
    None
}

/// Tick on the widget's interval, printing each newly revealed word.
async fn stream_answer(widget: &mut ChatWidget, stream: &mut AnswerStream) {
    let mut interval = tokio::time::interval(widget.config().tick_interval());
    let mut stdout = io::stdout();
    while !widget.is_idle() {
        interval.tick().await;
        widget.tick();
        print!("{}", stream.advance(widget));
        stdout.flush().ok();
    }
}

fn print_help() {
    println!("Commands:");
    println!("  <any text>   ask a free-text question");
    println!("  ask <id>     ask a canned question");
    println!("  questions    list canned questions");
    println!("  history      list questions asked this session");
    println!("  html         dump the rendered document");
    println!("  help         show this help");
    println!("  quit         exit");
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_chat::schema::message::MessageNode;
    use persona_chat::schema::persona::{Persona, ResponseEntry};

    fn widget(messages: Vec<MessageNode>) -> ChatWidget {
        let persona = Persona {
            responses: vec![ResponseEntry {
                keywords: vec!["plans".to_string()],
                messages,
            }],
            ..Persona::default()
        };
        ChatWidget::builder()
            .templates_path("persona_data/default/templates.ron")
            .with_persona(persona)
            .build()
            .unwrap()
    }

    #[test]
    fn blocks_are_printed_on_separate_lines() {
        let mut w = widget(vec![
            MessageNode::text("p", "one two"),
            MessageNode::children(
                "ul",
                vec![
                    MessageNode::children(
                        "li",
                        vec![MessageNode::text("strong", "Spicy"), MessageNode::text("", " peppers")],
                    ),
                    MessageNode::text("li", "three"),
                ],
            ),
        ]);
        w.submit("plans?").unwrap();

        let mut stream = AnswerStream::default();
        let mut printed = String::new();
        while !w.is_idle() {
            w.tick();
            printed.push_str(&stream.advance(&w));
        }
        assert_eq!(printed, "one two\nSpicy peppers\nthree");
    }

    #[test]
    fn drained_answer_prints_in_one_go() {
        let mut w = widget(vec![MessageNode::text("p", "a b"), MessageNode::text("p", "c")]);
        w.submit("plans").unwrap();
        w.drain();
        let mut stream = AnswerStream::default();
        assert_eq!(stream.advance(&w), "a b\nc");
        assert_eq!(stream.advance(&w), "");
    }
}
