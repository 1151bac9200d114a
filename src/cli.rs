use std::cmp;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use atty::Stream;
use clap::{Parser, Subcommand};
use question_search::extract::extract_file;
use question_search::keys::{DEFAULT_TOGGLE_SHORTCUT, Shortcut};
use question_search::render::{HighlightedText, QuestionBlock, SEARCH_DISPLAY_LIMIT};
use question_search::{
    AssetSource, Controller, PopupController, QuestionRecord, QuestionStore, RenderedList,
    ResultsView, SearchConfig, UiEvent, count_label, load_questions, render,
};
use serde_json::json;
use termimad::crossterm::style::Stylize;
use termimad::MadSkin;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "question-search", about = "Search the bundled quiz questions", version)]
pub struct Cli {
    /// Emit JSON instead of formatted text.
    #[arg(long, global = true)]
    json: bool,

    /// Read questions from this JSON file instead of the bundled set.
    #[arg(long, global = true, env = "QUESTION_SEARCH_DATA")]
    data: Option<PathBuf>,

    /// Chord that toggles the search overlay, e.g. `Ctrl+Shift+Q`.
    #[arg(
        long,
        global = true,
        env = "QUESTION_SEARCH_TOGGLE",
        default_value = DEFAULT_TOGGLE_SHORTCUT
    )]
    toggle_shortcut: Shortcut,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the first questions of the set.
    List {
        /// Maximum number of questions to show.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Find questions containing the query in their text, number, options,
    /// answers or explanation.
    Search {
        /// Text to look for; matching ignores case.
        query: String,
        /// Maximum number of questions to show.
        #[arg(short, long, default_value_t = SEARCH_DISPLAY_LIMIT)]
        limit: usize,
    },
    /// Show every question with the given number.
    Show {
        /// Question number, compared as text.
        number: String,
    },
    /// Search interactively; `:clear` resets, `:quit` exits.
    Interactive,
    /// Build a question file from a saved exam HTML page.
    Extract {
        /// HTML page to read.
        html: PathBuf,
        /// Write the JSON here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the popup page and question API over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, env = "QUESTION_SEARCH_ADDR", default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let source = cli
        .data
        .clone()
        .map(AssetSource::File)
        .unwrap_or_default();
    init_tracing(&cli.command);
    let config = SearchConfig {
        toggle_shortcut: cli.toggle_shortcut,
        ..SearchConfig::default()
    };

    match cli.command {
        Command::List { limit } => handle_list(&source, limit, cli.json),
        Command::Search { query, limit } => handle_search(&source, query, limit, cli.json),
        Command::Show { number } => handle_show(&source, number, cli.json),
        Command::Interactive => handle_interactive(source, config),
        Command::Extract { html, output } => handle_extract(&html, output.as_deref()),
        #[cfg(feature = "web")]
        Command::Serve { addr } => handle_serve(source, addr, config),
    }
}

fn init_tracing(command: &Command) {
    let default_level = match command {
        #[cfg(feature = "web")]
        Command::Serve { .. } => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn handle_list(source: &AssetSource, limit: usize, as_json: bool) -> Result<(), Box<dyn Error>> {
    let store = QuestionStore::new(load_questions(source)?);
    let limit = cmp::max(1, limit);
    let count = count_label(store.total(), store.matched(), "");

    if as_json {
        let payload = json!({
            "count": count,
            "total": store.total(),
            "limit": limit,
            "results": store.visible(limit).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let list = render(store.visible(limit), "");
        print_results(&count, &list);
    }
    Ok(())
}

fn handle_search(
    source: &AssetSource,
    query: String,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if query.trim().is_empty() {
        return Err("Search query cannot be empty".into());
    }
    let mut store = QuestionStore::new(load_questions(source)?);
    store.apply(&query);
    let limit = cmp::max(1, limit);
    let count = count_label(store.total(), store.matched(), &query);

    if as_json {
        let payload = json!({
            "query": query.trim(),
            "count": count,
            "total": store.total(),
            "matched": store.matched(),
            "limit": limit,
            "results": store.visible(limit).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        let list = render(store.visible(limit), &query);
        if list.is_empty() {
            println!("No questions found matching \"{}\".", query.trim());
            return Ok(());
        }
        print_results(&count, &list);
    }
    Ok(())
}

fn handle_show(source: &AssetSource, number: String, as_json: bool) -> Result<(), Box<dyn Error>> {
    let records = load_questions(source)?;
    let matches: Vec<&QuestionRecord> = records
        .iter()
        .filter(|record| record.number() == number.trim())
        .collect();
    if matches.is_empty() {
        return Err(format!("No question numbered {number:?}").into());
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        let list = render(matches, "");
        for block in &list.blocks {
            print_block(block);
        }
    }
    Ok(())
}

fn handle_interactive(source: AssetSource, config: SearchConfig) -> Result<(), Box<dyn Error>> {
    println!(
        "Overlay toggle: {}. Type `:clear` to reset, `:quit` to exit.",
        config.toggle_shortcut
    );
    let mut popup = PopupController::new(config);
    let loaded = load_questions(&source).map_err(|err| err.to_string());
    popup.handle(UiEvent::Loaded(loaded));
    print_view(popup.view());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("search> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let command = line.trim();
        if command == ":quit" || command == ":q" {
            break;
        }
        let event = if command == ":clear" {
            UiEvent::Clear
        } else {
            UiEvent::Input(line)
        };
        popup.handle(event);
        print_view(popup.view());
    }
    Ok(())
}

fn handle_extract(html: &Path, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let records = extract_file(html)?;
    let json = serde_json::to_string_pretty(&records)?;
    match output {
        Some(path) => fs::write(path, json + "\n")?,
        None => println!("{json}"),
    }
    eprintln!("Extracted {} questions from {}", records.len(), html.display());
    Ok(())
}

#[cfg(feature = "web")]
fn handle_serve(
    source: AssetSource,
    addr: std::net::SocketAddr,
    search: SearchConfig,
) -> Result<(), Box<dyn Error>> {
    use question_search::web::{WebConfig, serve};

    let config = WebConfig {
        addr,
        source,
        search,
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(config))?;
    Ok(())
}

fn print_view(view: &ResultsView) {
    if let Some(error) = &view.error {
        println!("{error}");
        return;
    }
    if view.no_results {
        println!("{}", view.count);
        println!("No questions found matching your search.");
        return;
    }
    print_results(&view.count, &view.list);
}

fn print_results(count: &str, list: &RenderedList) {
    print_heading(count);
    for block in &list.blocks {
        print_block(block);
    }
}

fn print_heading(text: &str) {
    if stdout_is_tty() {
        let skin = MadSkin::default();
        skin.print_inline(&format!("**{text}**\n"));
    } else {
        println!("{text}");
    }
}

fn print_block(block: &QuestionBlock) {
    println!();
    println!("{} [{}]", styled(&block.number, "Question "), block.kind);
    println!("{}", styled(&block.question, ""));
    if block.has_options() {
        println!("  Options:");
        for option in &block.options {
            println!("    - {}", styled(option, ""));
        }
    }
    if block.has_correct_answers() {
        println!("  Correct Answer(s):");
        for answer in &block.correct_answers {
            println!("    * {}", styled(answer, ""));
        }
    }
    if let Some(explanation) = &block.explanation {
        println!("  Explanation:");
        println!("    {}", styled(explanation, ""));
    }
}

fn styled(text: &HighlightedText, prefix: &str) -> String {
    let tty = stdout_is_tty();
    let mut out = String::from(prefix);
    for segment in &text.segments {
        if segment.highlighted && tty {
            out.push_str(&segment.text.as_str().black().on_yellow().to_string());
        } else {
            out.push_str(&segment.text);
        }
    }
    out
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}
