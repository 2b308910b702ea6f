use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use controller::{events, Controller, Model, View};
use storage::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod terminal;

use config::{load_settings, normalize_database_url, report_warnings, Settings};
use terminal::{parse_line, Line, OutputFormat, TerminalView, HELP};

#[derive(Parser, Debug)]
#[command(name = "todo", about = "Terminal todo list")]
struct Cli {
    /// Overrides `database_url` from todo.toml / DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,
    /// Initial route, e.g. `#/active`.
    #[arg(long)]
    route: Option<String>,
    #[arg(long, value_enum)]
    output: Option<OutputFormat>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read commands from stdin (the default).
    Interactive,
    /// Add a todo and print the list.
    Add { title: Vec<String> },
    /// Print the list for the route.
    List,
    /// Delete every todo.
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (settings, warnings) = load_settings();
    let settings = apply_cli(settings, &cli);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(std::io::stderr)
        .init();
    report_warnings(&warnings);

    let storage = Storage::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open todo database '{}'", settings.database_url))?;
    storage.health_check().await?;
    info!(database_url = %settings.database_url, "opened todo database");

    let model: Arc<dyn Model> = Arc::new(storage.clone());
    let view: Arc<dyn View> = Arc::new(TerminalView::new(std::io::stdout(), settings.output));
    let mut controller = Controller::new(model, view);

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Interactive => interactive(controller, &settings).await?,
        Command::Add { title } => {
            controller.set_view(&settings.default_route).await?;
            controller.new_todo(&title.join(" ")).await?;
        }
        Command::List => controller.set_view(&settings.default_route).await?,
        Command::Reset => {
            let removed = storage.remove_all().await?;
            println!("removed {removed} todos");
        }
    }

    Ok(())
}

fn apply_cli(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(url) = &cli.database_url {
        settings.database_url = url.clone();
    }
    if let Some(route) = &cli.route {
        settings.default_route = route.clone();
    }
    if let Some(output) = cli.output {
        settings.output = output;
    }
    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

async fn interactive(mut controller: Controller, settings: &Settings) -> Result<()> {
    let (sender, inputs) = events::channel(settings.event_queue_capacity);
    let worker = tokio::spawn(async move {
        controller.run(inputs).await;
    });

    sender.navigate(settings.default_route.clone())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Line::Input(input)) => sender.send(input).await?,
            Ok(Line::Help) => eprintln!("{HELP}"),
            Ok(Line::Quit) => break,
            Ok(Line::Blank) => {}
            Err(err) => eprintln!("{err}"),
        }
    }

    drop(sender);
    worker.await.context("controller task panicked")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_settings() {
        let cli = Cli::parse_from([
            "todo",
            "--database-url",
            "./override.db",
            "--route",
            "#/completed",
            "--output",
            "json",
            "list",
        ]);
        let settings = apply_cli(Settings::default(), &cli);

        assert_eq!(settings.database_url, "sqlite://./override.db");
        assert_eq!(settings.default_route, "#/completed");
        assert_eq!(settings.output, OutputFormat::Json);
        assert!(matches!(cli.command, Some(Command::List)));
    }

    #[test]
    fn add_collects_the_whole_title() {
        let cli = Cli::parse_from(["todo", "add", "buy", "oat", "milk"]);
        match cli.command {
            Some(Command::Add { title }) => assert_eq!(title.join(" "), "buy oat milk"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn defaults_survive_without_flags() {
        let cli = Cli::parse_from(["todo"]);
        let settings = apply_cli(Settings::default(), &cli);
        assert_eq!(settings, Settings::default());
        assert!(cli.command.is_none());
    }
}
