use clap::{Args, Parser, Subcommand, ValueEnum};
use marketdeck_core::schema::{forex::ForexSort, news::NewsSort, Domain, MarketSort};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing
    #[arg(long, value_enum, default_value_t = TraceLevel::WARN, ignore_case = true)]
    pub trace: TraceLevel,

    /// Serve demo data without touching the network
    #[arg(long)]
    pub offline: bool,

    /// Per-endpoint timeout, in milliseconds (overrides REQUEST_TIMEOUT_MS)
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cryptocurrency market caps and prices.
    Crypto {
        #[command(flatten)]
        query: QueryArgs,

        /// market_cap, price, volume or change
        #[arg(long)]
        sort: Option<MarketSort>,
    },

    /// Tracked US equities.
    Stocks {
        #[command(flatten)]
        query: QueryArgs,

        /// market_cap, price, volume or change
        #[arg(long)]
        sort: Option<MarketSort>,

        /// nasdaq or nyse
        #[arg(long)]
        market: Option<String>,

        /// e.g. technology, healthcare
        #[arg(long)]
        sector: Option<String>,
    },

    /// Currency pairs, derived from USD reference rates.
    Forex {
        #[command(flatten)]
        query: QueryArgs,

        /// popularity, change or volume
        #[arg(long)]
        sort: Option<ForexSort>,

        /// major, minor or exotic
        #[arg(long = "type")]
        pair_type: Option<String>,

        /// Base currency code, e.g. EUR
        #[arg(long)]
        base: Option<String>,
    },

    /// Financial headlines.
    News {
        #[command(flatten)]
        query: QueryArgs,

        /// latest, trending or popular
        #[arg(long)]
        sort: Option<NewsSort>,

        /// crypto, stocks, forex, economy or general
        #[arg(long)]
        category: Option<String>,
    },

    /// Interactive session on one page; type `help` once it is running.
    Browse { domain: Domain },

    /// Saved news articles.
    Bookmarks {
        #[command(subcommand)]
        action: BookmarkArgs,
    },
}

/// Controls shared by every one-shot page.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Case-insensitive substring matched against the searchable fields
    #[arg(long, short)]
    pub search: Option<String>,

    /// Number of pages to show
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Show every match
    #[arg(long)]
    pub all: bool,
}

#[derive(Subcommand, Debug)]
pub enum BookmarkArgs {
    /// Print every bookmarked article.
    List,

    /// Bookmark an article from the current headlines by id.
    Add { id: String },

    /// Drop a bookmark by id.
    Remove { id: String },
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum TraceLevel {
    DEBUG,
    INFO,
    WARN,
    ERROR,
}
