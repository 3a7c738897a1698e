use anyhow::{bail, Result};
use clap::Parser;
use cli::{BookmarkArgs, Cli, Commands, QueryArgs, TraceLevel};
use colored::*;
use marketdeck_core::bookmarks::BookmarkStore;
use marketdeck_core::client_ext::build_client;
use marketdeck_core::debounce::Debouncer;
use marketdeck_core::page::{run_page, spawn_schedule};
use marketdeck_core::schema::crypto::Crypto;
use marketdeck_core::schema::forex::{ForexDimension, ForexPair};
use marketdeck_core::schema::news::{Article, NewsDimension};
use marketdeck_core::schema::stock::{Stock, StockDimension};
use marketdeck_core::schema::Domain;
use marketdeck_core::{Action, Config, Loaded, Page, Selection, Source};
use render::{Card, ConsolePresenter};
use session::Input;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use tracing::{debug, error, info, subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

mod cli;
mod render;
mod session;
mod ui;

fn preprocess(trace_level: Level) {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(my_subscriber).expect("Set subscriber");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.trace {
        TraceLevel::DEBUG => Level::DEBUG,
        TraceLevel::INFO => Level::INFO,
        TraceLevel::WARN => Level::WARN,
        TraceLevel::ERROR => Level::ERROR,
    };

    preprocess(log_level);
    trace!("Command line input recorded: {cli:#?}");

    let mut config = Config::from_env()?;
    if cli.offline {
        config.offline = true;
    }
    if let Some(ms) = cli.timeout_ms {
        config.set_request_timeout_ms(ms);
    }
    debug!("{config:?}");

    let http_client = build_client(&config)?;

    ////////////////////////////////////////////////////////////////////////////////////////////////////

    // cli framework:
    // "> marketdeck <COMMAND>"
    match cli.command {
        // "> marketdeck crypto [--search S] [--sort K] [--pages N] [--all]"
        Commands::Crypto { query, sort } => {
            show::<Crypto>(&http_client, &config, &query, sort, vec![]).await;
        }

        // "> marketdeck stocks [--market M] [--sector S] ..."
        Commands::Stocks {
            query,
            sort,
            market,
            sector,
        } => {
            let filters = vec![
                (StockDimension::Market, market),
                (StockDimension::Sector, sector),
            ];
            show::<Stock>(&http_client, &config, &query, sort, filters).await;
        }

        // "> marketdeck forex [--type T] [--base B] ..."
        Commands::Forex {
            query,
            sort,
            pair_type,
            base,
        } => {
            let filters = vec![
                (ForexDimension::PairType, pair_type),
                (ForexDimension::Base, base),
            ];
            show::<ForexPair>(&http_client, &config, &query, sort, filters).await;
        }

        // "> marketdeck news [--category C] ..."
        Commands::News {
            query,
            sort,
            category,
        } => {
            let filters = vec![(NewsDimension::Category, category)];
            show::<Article>(&http_client, &config, &query, sort, filters).await;
        }

        // "> marketdeck browse <crypto|stocks|forex|news>"
        Commands::Browse { domain } => match domain {
            Domain::Crypto => browse::<Crypto, _>(&http_client, &config, not_saved::<Crypto>).await,
            Domain::Stocks => browse::<Stock, _>(&http_client, &config, not_saved::<Stock>).await,
            Domain::Forex => browse::<ForexPair, _>(&http_client, &config, not_saved::<ForexPair>).await,
            Domain::News => browse_news(&http_client, &config).await?,
        },

        ////////////////////////////////////////////////////////////////////////////////////////////////////

        // "> marketdeck bookmarks [list add remove]"
        Commands::Bookmarks { action } => {
            let store = BookmarkStore::new(&config.bookmarks_path);
            match action {
                BookmarkArgs::List => {
                    let saved = store.list().await?;
                    println!("{}", format!("{} bookmarked articles", saved.len()).bold());
                    let now = chrono::Utc::now();
                    for article in &saved {
                        println!("{}", article.card(now));
                    }
                }

                BookmarkArgs::Add { id } => {
                    let loaded = load::<Article>(&http_client, &config).await;
                    let Some(article) = loaded.records.iter().find(|a| a.id == id) else {
                        bail!("no article with id {id} in the current headlines");
                    };
                    if store.add(article).await? {
                        println!("Bookmarked \"{}\"", article.title);
                    } else {
                        println!("Already bookmarked");
                    }
                }

                BookmarkArgs::Remove { id } => {
                    if store.remove(&id).await? {
                        println!("Removed {id}");
                    } else {
                        bail!("no bookmark with id {id}");
                    }
                }
            }
        }
    }

    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

async fn load<R: Source>(http_client: &reqwest::Client, config: &Config) -> Loaded<R> {
    let pb = ui::spinner(format!("Loading {}", R::NOUN));
    let loaded = R::load(http_client, config).await;
    pb.finish_and_clear();
    info!("{} {} | {}", loaded.records.len(), R::NOUN, loaded.mode);
    loaded
}

/// Loads one page, applies the command line query and prints it once.
async fn show<R: Source + Card>(
    http_client: &reqwest::Client,
    config: &Config,
    args: &QueryArgs,
    sort: Option<R::Sort>,
    filters: Vec<(R::Dimension, Option<String>)>,
) {
    let mut page = Page::new(load::<R>(http_client, config).await);

    let query = page.query_mut();
    if let Some(term) = &args.search {
        query.set_search(term);
    }
    if let Some(sort) = sort {
        query.set_sort(sort);
    }
    for (dimension, value) in filters {
        if let Some(value) = value {
            query.set_filter(dimension, Selection::parse(&value));
        }
    }
    if args.all {
        query.show_all();
    } else {
        for _ in 1..args.pages.max(1) {
            query.load_more();
        }
    }

    render::print_overview(page.records());
    page.present(&mut ConsolePresenter);
}

fn not_saved<R: Card>(record: &R) {
    println!("{}", format!("Only articles can be bookmarked ({} given)", record.id()).yellow());
}

/// Interactive session over stdin until `quit` or end of input.
async fn browse<R, F>(http_client: &reqwest::Client, config: &Config, on_bookmark: F)
where
    R: Source + Card,
    R::Sort: FromStr,
    F: FnMut(&R),
{
    let page = Page::new(load::<R>(http_client, config).await);
    render::print_overview(page.records());
    println!("{}", "type `help` for commands".dimmed());

    let (tx, rx) = mpsc::unbounded_channel::<Action<R>>();
    let mut schedules = vec![spawn_schedule(tx.clone(), config.refresh_every, || {
        Action::Refresh { manual: false }
    })];
    if R::DRIFTS {
        schedules.push(spawn_schedule(tx.clone(), config.drift_every, || Action::Drift));
    }

    let searches = {
        let tx = tx.clone();
        Debouncer::spawn(config.search_debounce, move |term: String| {
            let _ = tx.send(Action::Search(term));
        })
    };
    let reader = tokio::spawn(read_commands::<R>(tx, searches));

    run_page(page, http_client, config, rx, &mut ConsolePresenter, on_bookmark).await;

    for schedule in schedules {
        schedule.abort();
    }
    reader.abort();
}

/// The news session, with bookmarks written by a separate task.
async fn browse_news(http_client: &reqwest::Client, config: &Config) -> Result<()> {
    let store = BookmarkStore::new(&config.bookmarks_path);
    let (tx, mut rx) = mpsc::unbounded_channel::<Article>();

    let writer = tokio::spawn(async move {
        while let Some(article) = rx.recv().await {
            match store.add(&article).await {
                Ok(true) => println!("{}", format!("Bookmarked \"{}\"", article.title).green()),
                Ok(false) => println!("Already bookmarked"),
                Err(e) => error!("bookmark write failed | {e:#}"),
            }
        }
    });

    browse::<Article, _>(http_client, config, move |article: &Article| {
        let _ = tx.send(article.clone());
    })
    .await;

    writer.await?;
    Ok(())
}

async fn read_commands<R>(actions: UnboundedSender<Action<R>>, searches: Debouncer<String>)
where
    R: Card,
    R::Sort: FromStr,
{
    let mut lines = LinesStream::new(BufReader::new(tokio::io::stdin()).lines());
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("failed reading stdin | {e}");
                break;
            }
        };

        match session::parse::<R>(&line) {
            Input::Search(term) => {
                searches.send(term);
            }
            Input::Act(action) => {
                let quit = matches!(action, Action::Quit);
                if actions.send(action).is_err() || quit {
                    break;
                }
            }
            Input::Help => println!("{}", session::HELP),
            Input::Blank => {}
            Input::Invalid(message) => println!("{}", message.red()),
        }
    }

    searches.close().await;
    let _ = actions.send(Action::Quit);
}
