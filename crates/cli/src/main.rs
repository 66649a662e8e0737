//! Runs one script file through the full pipeline and prints the grid.
//!
//! Usage: `gridpy <script.py>` — console events (captured output,
//! failures) go to stderr; the resulting grid goes to stdout,
//! tab-separated.

use anyhow::Context;
use gridpy_core::Cell;
use gridpy_events::ConsoleEventKind;
use gridpy_runner::{RunnerConfig, ScriptRunner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gridpy=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let path = std::env::args()
        .nth(1)
        .context("usage: gridpy <script.py>")?;
    let code = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {path}"))?;

    let runner = ScriptRunner::new(RunnerConfig::from_env());

    // Mirror console events to stderr while the task runs.
    let mut events = runner.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.kind {
                ConsoleEventKind::Log => eprintln!("{}", event.text),
                ConsoleEventKind::Error => eprintln!("error: {}", event.text),
            }
        }
    });

    let value = runner.invoke(&code, None).await;
    for row in value.rows() {
        let line: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Cell::Number(n) => n.to_string(),
                Cell::Text(s) => s.clone(),
                Cell::Bool(b) => b.to_string(),
                Cell::Empty => String::new(),
            })
            .collect();
        println!("{}", line.join("\t"));
    }

    printer.abort();
    Ok(())
}
