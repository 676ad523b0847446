use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use stache::Engine;
use streamtable::{
    JsonFileSource, PageTarget, SharedTable, StreamLoader, StreamTable, TableOptions,
};
use tracing::{debug, info, warn};

mod logging;

const MOVIE_ROW: &str = include_str!("../templates/row.mustache");

/// Rows fetched per chunk with `--stream` when the options set no limit.
const DEFAULT_CHUNK: usize = 50;

/// Render a JSON dataset through a streamtable and print the markup.
#[derive(Debug, Parser)]
#[command(name = "stdemo", version)]
struct Args {
    /// JSON file holding an array of rows
    #[arg(default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/data/movies.json"))]
    data: PathBuf,

    /// Table options as JSON; movie defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Row template; sees `record` and `index`
    #[arg(long)]
    template: Option<PathBuf>,

    /// Rows per page
    #[arg(long)]
    per_page: Option<usize>,

    /// Search text
    #[arg(long)]
    search: Option<String>,

    /// Sort by a declared column. Repeat to flip the direction.
    #[arg(long)]
    sort: Vec<String>,

    /// `first`, `prev`, `next`, `last` or a 1-based page number
    #[arg(long)]
    page: Option<PageTarget>,

    /// Fetch the file in chunks through the stream loader
    #[arg(long)]
    stream: bool,

    /// Milliseconds between fetches, overriding `stream_after`
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    logging::init();
    let args = Args::parse();

    let mut options = load_options(args.config.as_deref()).await?;
    if let Some(per_page) = args.per_page {
        options.pagination.per_page = Some(per_page);
    }
    if args.stream && options.fetch_data_limit.is_none() {
        options.fetch_data_limit = Some(DEFAULT_CHUNK);
    }

    let template = match &args.template {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .wrap_err_with(|| format!("reading row template {}", path.display()))?,
        None => MOVIE_ROW.to_string(),
    };

    let source = JsonFileSource::new(&args.data);
    let mut builder = StreamTable::builder()
        .options(options)
        .template_view(&Engine::new(), &template)?
        .on_pagination(|summary| {
            debug!(
                page = summary.page + 1,
                from = summary.from,
                to = summary.to,
                total = summary.total,
                "pagination changed"
            );
        })
        .after_add(|event| {
            info!(
                added = event.added,
                total = event.total_rows,
                visible = event.visible_rows,
                "rows added"
            );
        });
    if !args.stream {
        builder = builder.rows(source.read_all().await?);
    }
    let table = builder.build()?.into_shared();

    if args.stream {
        stream(source, Rc::clone(&table), args.interval_ms.map(Duration::from_millis)).await;
    }

    let mut table = table.borrow_mut();
    for field in &args.sort {
        let spec = table.toggle_sort(field)?;
        info!(%spec, "sorted");
    }
    if let Some(query) = &args.search {
        table.search(query);
    }
    if let Some(target) = args.page {
        if table.paginate(target).is_none() {
            warn!(?target, pages = table.page_count(), "page unchanged");
        }
    }

    println!("{}", table.container_markup());
    let summary = table.summary();
    println!(
        "<p>Showing {} to {} of {} entries</p>",
        summary.from, summary.to, summary.total
    );
    Ok(())
}

async fn load_options(path: Option<&Path>) -> color_eyre::Result<TableOptions> {
    let Some(path) = path else {
        return Ok(movie_options());
    };
    let json = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("reading table options {}", path.display()))?;
    Ok(TableOptions::from_json(&json)?)
}

fn movie_options() -> TableOptions {
    TableOptions {
        fields: Some(["name", "director", "actor", "year"].map(String::from).to_vec()),
        sorting: ["rating:desc:number", "year:asc:number", "name"]
            .map(String::from)
            .to_vec(),
        ..TableOptions::default()
    }
}

async fn stream(source: JsonFileSource, table: SharedTable, interval: Option<Duration>) {
    let mut loader = StreamLoader::new(source, table);
    if let Some(interval) = interval {
        loader = loader.with_interval(interval);
    }
    tokio::task::LocalSet::new()
        .run_until(async move { loader.spawn_local().finished().await })
        .await;
}
