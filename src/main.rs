use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bookscape::store::Value;
use bookscape::{catalog, ingest, BookRecord, Fetcher, ResultSet, Settings, Store};
use clap::{Parser, Subcommand};

const DEFAULT_SEARCH_TERM: &str = "Data Science";

#[derive(Parser)]
#[command(name = "bookscape", about = "Search, store and analyze Google Books metadata")]
struct Cli {
    /// Settings file (defaults to ./bookscape.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database, overriding `database_path` from the settings.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch books matching a search term and save them.
    Search {
        #[arg(default_value = DEFAULT_SEARCH_TERM)]
        term: String,
        #[arg(long)]
        max_results: Option<u32>,
    },
    /// List the available analyses.
    Queries,
    /// Run one analysis by name.
    Query { name: String },
    /// Show details of every stored book.
    Books,
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(path) = cli.database {
        settings.database_path = path;
    }

    let mut store = Store::open(&settings.database_path, settings.store.on_duplicate)
        .with_context(|| format!("opening {}", settings.database_path.display()))?;
    store.init_schema()?;

    match cli.command {
        Command::Search { term, max_results } => {
            let fetcher = Fetcher::from_settings(settings.fetch.clone())?;
            match ingest(&fetcher, &mut store, &term, max_results) {
                Ok(report) if report.saved() > 0 => {
                    println!("Fetched and saved {} books to the database.", report.saved());
                }
                Ok(_) => {
                    println!("No books found. Please try a different search term.");
                }
                Err(err) => {
                    log::error!("ingestion failed for \"{}\": {}", term, err);
                    eprintln!("{}", err);
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Queries => {
            for name in catalog::names() {
                println!("{}", name);
            }
        }
        Command::Query { name } => {
            let query = catalog::lookup(&name)?;
            let result = query.run(&store)?;
            print!("{}", render_table(&result));
        }
        Command::Books => {
            for book in store.books()? {
                print!("{}", render_book(&book));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Text(text) => text.clone(),
        Value::Blob(bytes) => format!("<{} bytes>", bytes.len()),
    }
}

fn render_table(result: &ResultSet) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();
    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            cells
                .iter()
                .map(|row| row[index].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(result.columns.iter().map(String::as_str).collect()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out.push_str(&format!("({} rows)\n", result.len()));
    out
}

fn render_book(book: &BookRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", book.title));
    out.push_str(&format!("Authors: {}\n", book.authors));
    out.push_str(&format!("Description: {}\n", book.description));
    out.push_str(&format!("Categories: {}\n", book.categories));
    out.push_str(&format!("Published Year: {}\n", book.published_year));
    out.push_str(&format!(
        "Average Rating: {} (based on {} ratings)\n",
        book.average_rating, book.ratings_count
    ));
    out.push_str(&format!("Publisher: {}\n", book.publisher));
    out.push_str(&format!("Page Count: {} pages\n", book.page_count));
    if !book.image_link.is_empty() {
        out.push_str(&format!("Cover: {}\n", book.image_link));
    }
    if !book.buy_link.is_empty() {
        out.push_str(&format!("Buy the book here: {}\n", book.buy_link));
    }
    out.push_str("---\n");
    out
}

#[cfg(test)]
mod tests {
    use super::{render_book, render_table};
    use bookscape::store::Value;
    use bookscape::{BookRecord, ResultSet};

    #[test]
    fn table_aligns_columns() {
        let result = ResultSet {
            columns: vec!["publisher".to_string(), "n".to_string()],
            rows: vec![
                vec![Value::Text("Acme".to_string()), Value::Integer(12)],
                vec![Value::Text("Beta Books".to_string()), Value::Null],
            ],
        };
        let rendered = render_table(&result);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "publisher  | n");
        assert_eq!(lines[1], "-----------+---");
        assert_eq!(lines[2], "Acme       | 12");
        assert_eq!(lines[3], "Beta Books |");
        assert_eq!(lines[4], "(2 rows)");
    }

    #[test]
    fn book_details_skip_empty_links() {
        let rendered = render_book(&BookRecord::default());
        assert!(rendered.starts_with("N/A\nAuthors: Unknown Author\n"));
        assert!(!rendered.contains("Buy the book here"));
        assert!(!rendered.contains("Cover:"));
    }
}
