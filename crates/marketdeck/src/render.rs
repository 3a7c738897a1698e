use chrono::{DateTime, Utc};
use colored::*;
use marketdeck_core::presenter::{Presenter, View};
use marketdeck_core::schema::crypto::{self, Crypto, CryptoDimension};
use marketdeck_core::schema::forex::{self, ForexDimension, ForexPair};
use marketdeck_core::schema::news::{self, Article, NewsDimension};
use marketdeck_core::schema::stock::{self, Stock, StockDimension};
use marketdeck_core::{time, DataMode, Record};

/// How a record type is drawn on the console, and which control names it answers to.
pub trait Card: Record {
    /// Whether the page takes part in the demo price drift.
    const DRIFTS: bool = true;

    fn card(&self, now: DateTime<Utc>) -> String;

    /// Aggregate line printed above the cards.
    fn overview(records: &[Self]) -> Option<String>;

    /// Parses a filter name typed in a session.
    fn dimension(name: &str) -> Option<Self::Dimension>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Prints each page state to stdout.
#[derive(Default)]
pub struct ConsolePresenter;

impl<R: Card> Presenter<R> for ConsolePresenter {
    fn present(&mut self, view: &View<'_, R>) {
        println!();
        println!("{}", banner(view.mode));
        println!("{}", view.summary().bold());

        if view.is_empty() {
            println!("  {}", format!("No {} found. Try another search or filter.", R::NOUN).dimmed());
            return;
        }

        let now = Utc::now();
        for record in view.visible() {
            println!("{}", record.card(now));
        }

        if view.load_more() {
            println!("{}", "  more available: `more` or `all`".dimmed());
        }
    }
}

pub fn banner(mode: &DataMode) -> ColoredString {
    match mode {
        DataMode::Live { .. } => mode.to_string().green(),
        DataMode::Demo { .. } => mode.to_string().yellow(),
    }
}

pub fn print_overview<R: Card>(records: &[R]) {
    if let Some(line) = R::overview(records) {
        println!("{}", line.cyan());
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// `1.23T`, `845.00B`, `12.50M`, `3.20K`; plain below a thousand.
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    match abs {
        a if a >= 1e12 => format!("{:.2}T", value / 1e12),
        a if a >= 1e9 => format!("{:.2}B", value / 1e9),
        a if a >= 1e6 => format!("{:.2}M", value / 1e6),
        a if a >= 1e3 => format!("{:.2}K", value / 1e3),
        _ => format!("{value:.2}"),
    }
}

/// Two decimals for anything above a dollar, six below.
pub fn price(value: f64) -> String {
    if value.abs() >= 1.0 {
        format!("${value:.2}")
    } else {
        format!("${value:.6}")
    }
}

fn signed(change: f64) -> ColoredString {
    let text = format!("{change:+.2}%");
    if change >= 0.0 {
        text.green()
    } else {
        text.red()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

impl Card for Crypto {
    fn card(&self, _now: DateTime<Utc>) -> String {
        format!(
            "  {:<14} {:<6} {:>16}  {:>8}  cap {:>9}  vol {:>9}",
            self.name,
            self.symbol.to_uppercase(),
            price(self.price),
            signed(self.change_24h.unwrap_or(0.0)),
            compact(self.market_cap),
            compact(self.volume),
        )
    }

    fn overview(records: &[Self]) -> Option<String> {
        let stats = crypto::overview(records);
        Some(format!(
            "Market cap ${} | 24h volume ${} | BTC dominance {:.1}%",
            compact(stats.total_market_cap),
            compact(stats.total_volume),
            stats.btc_dominance
        ))
    }

    fn dimension(_name: &str) -> Option<CryptoDimension> {
        None
    }
}

impl Card for Stock {
    fn card(&self, _now: DateTime<Utc>) -> String {
        let pe = self
            .pe_ratio
            .map(|pe| format!("{pe:.1}"))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "  {:<6} {:<28} {:>10}  {:>8}  cap {:>9}  vol {:>9}  {} / {}  P/E {}  div {:.2}%",
            self.symbol.bold(),
            self.name,
            price(self.price),
            signed(self.change),
            compact(self.market_cap),
            compact(self.volume as f64),
            self.sector,
            self.market.to_uppercase(),
            pe,
            self.dividend,
        )
    }

    fn overview(records: &[Self]) -> Option<String> {
        let counts = stock::sector_counts(records);
        if counts.is_empty() {
            return None;
        }
        let sectors: Vec<String> = counts
            .iter()
            .map(|(sector, n)| format!("{sector} {n}"))
            .collect();
        Some(format!("Sectors: {}", sectors.join(", ")))
    }

    fn dimension(name: &str) -> Option<StockDimension> {
        match name.to_lowercase().as_str() {
            "market" => Some(StockDimension::Market),
            "sector" => Some(StockDimension::Sector),
            _ => None,
        }
    }
}

impl Card for ForexPair {
    fn card(&self, _now: DateTime<Utc>) -> String {
        format!(
            "  {:<8} {:<34} [{:<6}] {:>12.4}  {:>8}  vol {:>9}  H {:.4} L {:.4}",
            self.pair.bold(),
            self.name,
            self.kind,
            self.rate,
            signed(self.change),
            compact(self.volume as f64),
            self.high,
            self.low,
        )
    }

    fn overview(records: &[Self]) -> Option<String> {
        forex::most_active(records)
            .map(|pair| format!("Most active: {} ({} traded)", pair.pair, compact(pair.volume as f64)))
    }

    fn dimension(name: &str) -> Option<ForexDimension> {
        match name.to_lowercase().as_str() {
            "type" | "pair_type" | "pair-type" => Some(ForexDimension::PairType),
            "base" => Some(ForexDimension::Base),
            _ => None,
        }
    }
}

impl Card for Article {
    const DRIFTS: bool = false;

    fn card(&self, now: DateTime<Utc>) -> String {
        let mut flags = String::new();
        if self.breaking {
            flags.push_str(&format!("{} ", "BREAKING".red().bold()));
        }
        if self.trending {
            flags.push_str(&format!("{} ", "TRENDING".yellow()));
        }

        format!(
            "  {flags}{}\n    {} | {} | {} | {} min read | {}\n    {}\n    {}",
            self.title.bold(),
            self.source,
            self.author,
            time::relative(self.published_at, now),
            self.read_minutes,
            self.category,
            self.excerpt,
            self.id.dimmed(),
        )
    }

    fn overview(records: &[Self]) -> Option<String> {
        news::breaking_headline(records).map(|article| format!("Breaking: {}", article.title))
    }

    fn dimension(name: &str) -> Option<NewsDimension> {
        name.eq_ignore_ascii_case("category")
            .then_some(NewsDimension::Category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_picks_the_largest_unit() {
        assert_eq!(compact(1.68e12), "1.68T");
        assert_eq!(compact(845e9), "845.00B");
        assert_eq!(compact(12_500_000.0), "12.50M");
        assert_eq!(compact(3_200.0), "3.20K");
        assert_eq!(compact(999.0), "999.00");
    }

    #[test]
    fn sub_dollar_prices_keep_precision() {
        assert_eq!(price(43250.75), "$43250.75");
        assert_eq!(price(0.0812), "$0.081200");
    }

    #[test]
    fn filter_names() {
        assert_eq!(Stock::dimension("Sector"), Some(StockDimension::Sector));
        assert_eq!(ForexPair::dimension("type"), Some(ForexDimension::PairType));
        assert_eq!(Article::dimension("category"), Some(NewsDimension::Category));
        assert_eq!(Crypto::dimension("market"), None);
        assert_eq!(Stock::dimension("colour"), None);
    }

    #[test]
    fn cards_carry_the_identifying_fields() {
        let now = Utc::now();
        let coin = &crypto::demo_coins()[0];
        assert!(coin.card(now).contains("Bitcoin"));

        let article = &news::demo_articles(now)[0];
        let card = article.card(now);
        assert!(card.contains("45 min ago"), "{card}");
        assert!(card.contains("demo-1"), "{card}");
    }
}
