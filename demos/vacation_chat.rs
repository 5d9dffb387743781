/// Vacation Chat example: a short scripted session against the default persona.
///
/// Asks a canned question, a free-text question that only hits the fallback,
/// and a question with punctuation, then prints the rendered document.
///
/// Run with: cargo run --example vacation_chat

use persona_chat::core::widget::ChatWidget;
use std::time::Instant;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
        .init();

    let mut widget = ChatWidget::builder()
        .templates_path("persona_data/default/templates.ron")
        .persona_path("persona_data/default/persona.json")
        .config_path("persona_data/default/config.ron")
        .build()
        .expect("Failed to build chat widget");

    println!("=== Vacation Chat ===\n");
    println!("Canned questions:");
    for q in widget.questions() {
        println!("  [{}] {}", q.id, q.text);
    }
    println!();

    // --- Turn 1: canned question ---
    widget.ask("vacation").expect("Unknown canned question");
    let started = Instant::now();
    widget.run_until_idle().await;
    println!("Turn 1 revealed in {:?}", started.elapsed());

    // --- Turn 2: nothing matches ---
    widget
        .submit("Can you fix my printer?")
        .expect("Failed to submit question");

    // --- Turn 3: queued while turn 2 is still animating ---
    widget
        .submit("What FOOD, exactly?!")
        .expect("Failed to submit question");
    widget.run_until_idle().await;

    println!("\nHistory:");
    for (i, turn) in widget.history().iter().enumerate() {
        println!(
            "  {}. {:<32} -> {}",
            i + 1,
            turn.question,
            turn.keyword.as_deref().unwrap_or("(fallback)")
        );
    }

    println!("\n--- Rendered document ---\n{}", widget.to_html());
}
