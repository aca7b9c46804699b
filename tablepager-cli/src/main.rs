mod cli;

use std::error::Error;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use log::debug;
use log::info;
use log::warn;
use simplelog::ColorChoice;
use simplelog::Config;
use simplelog::LevelFilter;
use simplelog::TermLogger;
use simplelog::TerminalMode;
use simplelog::WriteLogger;
use tablepager_lib::PagedTable;
use tablepager_lib::TableState;
use tablepager_lib::catalog::CatalogServer;
use tablepager_lib::catalog::Product;
use tablepager_lib::catalog::ServerConfig;
use tablepager_lib::catalog::load_products;
use tablepager_lib::config::TableConfig;
use tablepager_lib::fetch::HttpFetcher;
use tablepager_lib::fetch::PageFetcher;
use tablepager_lib::model::FilterDescriptor;
use tablepager_lib::model::FilterSet;
use tablepager_lib::model::PageSize;
use tablepager_lib::model::Row;
use tablepager_lib::store::ColumnDef;
use tablepager_lib::table::Navigation;
use tablepager_lib::table::Settled;
use tablepager_lib::table::TableSnapshot;

use crate::cli::Cli;
use crate::cli::Commands;

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref(), cli.verbose) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let result = match cli.command {
        Commands::Serve { products, addr } => serve(&products, addr).await,
        Commands::Browse {
            products,
            config,
            page_size,
            title,
            category,
            max_pages,
        } => {
            let filters = [("title", title), ("category", category)];
            browse(&products, config, page_size, &filters, max_pages).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(log_file: Option<&Path>, verbose: bool) -> Result<(), BoxError> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match log_file {
        Some(path) => WriteLogger::init(level, Config::default(), File::create(path)?)?,
        None => TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?,
    }
    Ok(())
}

async fn serve(products: &Path, addr: std::net::SocketAddr) -> Result<(), BoxError> {
    let products = load_products(products)?;
    let server = CatalogServer::bind(ServerConfig::default().with_addr(addr), products).await?;
    println!("Serving {}/products (Ctrl+C to stop)", server.url());

    tokio::signal::ctrl_c().await?;
    server.shutdown().await;
    Ok(())
}

async fn browse(
    products: &Path,
    config: Option<PathBuf>,
    page_size: Option<u32>,
    filters: &[(&str, Option<String>)],
    max_pages: Option<usize>,
) -> Result<(), BoxError> {
    let mut table_config = match config {
        Some(path) => TableConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => TableConfig::default(),
    };
    if let Some(size) = page_size {
        let size = PageSize::try_from(size).map_err(|n| format!("page size must be 5, 10 or 20, got {}", n))?;
        table_config = table_config.with_page_size(size);
    }

    let server = CatalogServer::bind(ServerConfig::default(), load_products(products)?).await?;
    let fetcher: HttpFetcher<Product> = HttpFetcher::new(&server.url())?;

    let state = TableState::new("products", table_config)
        .with_columns(vec![
            ColumnDef::new("id", "ID").width(40),
            ColumnDef::new("title", "Title").width(420),
            ColumnDef::new("category", "Category").width(180),
            ColumnDef::new("price", "Price").width(80),
            ColumnDef::new("rating.rate", "Rating").width(70),
        ])
        .with_filters(
            FilterSet::new()
                .with("title", FilterDescriptor::empty_text())
                .with("category", FilterDescriptor::empty_text()),
        );
    let table = PagedTable::new(state, fetcher);
    table.subscribe(|event| debug!("[cli] {:?}", event));

    for (column, value) in filters {
        if let Some(value) = value {
            table.set_text(column, value);
        }
    }
    // Filters settle before the first fetch.
    table.flush_filters().await;
    table.load().await;

    let mut shown = 0;
    loop {
        let snapshot = table.snapshot();
        if let Some(error) = &snapshot.last_error {
            warn!("[cli] fetch failed: {}", error);
            break;
        }
        print_page(&snapshot);
        shown += 1;

        if max_pages.is_some_and(|max| shown >= max) {
            break;
        }
        match table.next_page().await {
            Navigation::Rejected(reason) => {
                info!("[cli] done after {} pages: {}", shown, reason);
                break;
            }
            Navigation::Fetched(Settled::Failed(message)) => {
                warn!("[cli] fetch failed: {}", message);
                break;
            }
            _ => {}
        }
    }

    report_cache(&table);
    server.shutdown().await;
    Ok(())
}

fn print_page<R: Row>(snapshot: &TableSnapshot<R>) {
    match snapshot.fetched_at {
        Some(at) => println!("-- page {} (fetched {}) --", snapshot.page, at.format("%H:%M:%S")),
        None => println!("-- page {} --", snapshot.page),
    }

    let widths: Vec<usize> = snapshot
        .columns
        .iter()
        .map(|c| (c.width / 10).max(4) as usize)
        .collect();

    let header: Vec<String> = snapshot
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| fit(&c.header, *w))
        .collect();
    println!("{}", header.join(" "));

    if snapshot.is_empty() {
        println!("(no rows)");
    }
    for row in &snapshot.rows {
        let cells: Vec<String> = snapshot
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| fit(&row.field(&c.id).to_string(), *w))
            .collect();
        println!("{}", cells.join(" "));
    }
}

fn fit(text: &str, width: usize) -> String {
    let mut out: String = text.chars().take(width).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', width - len));
    out
}

fn report_cache<R: Row, F: PageFetcher<R>>(table: &PagedTable<R, F>) {
    table.inspect(|state| {
        info!(
            "[cli] {} pages cached for {} (exhausted: {})",
            state.cache().len(),
            state.observed_identity(),
            state.cache().is_exhausted()
        );
    });
}
