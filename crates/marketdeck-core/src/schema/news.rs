use crate::api::{fetch_configured, DataMode, Endpoint, Transport};
use crate::config::Config;
use crate::query::{QueryState, Selection};
use crate::record::Record;
use crate::schema::{Loaded, Source};
use crate::time::read_minutes;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, trace};

/// Share of live articles flagged as trending.
const TRENDING_P: f64 = 0.2;

/// Live articles at the head of the feed flagged as breaking.
const BREAKING_HEAD: usize = 2;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NewsCategory {
    Crypto,
    Stocks,
    Forex,
    Economy,
    General,
}

/// A normalized news item; also the shape persisted in the bookmark store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Source URL for live articles, `demo-N` for the static set.
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: NewsCategory,
    pub source: String,
    pub author: String,
    pub url: Option<String>,
    pub image: String,
    pub read_minutes: u32,
    pub trending: bool,
    pub breaking: bool,
    pub published_at: DateTime<Utc>,
}

impl Article {
    /// Trending articles count double, scaled by read time.
    pub fn popularity(&self) -> u32 {
        let weight = if self.trending { 2 } else { 1 };
        weight * self.read_minutes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NewsDimension {
    Category,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NewsSort {
    #[default]
    Latest,
    Trending,
    Popular,
}

impl Record for Article {
    type Sort = NewsSort;
    type Dimension = NewsDimension;

    const PAGE_SIZE: usize = 12;
    const NOUN: &'static str = "articles";

    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.title, &self.excerpt, &self.content, &self.source]
    }

    fn category(&self, dimension: NewsDimension) -> &str {
        match dimension {
            NewsDimension::Category => self.category.as_ref(),
        }
    }

    fn compare(&self, other: &Self, sort: NewsSort) -> Ordering {
        let newest = other.published_at.cmp(&self.published_at);
        match sort {
            NewsSort::Latest => newest,
            NewsSort::Trending => other.trending.cmp(&self.trending).then(newest),
            NewsSort::Popular => other.popularity().cmp(&self.popularity()).then(newest),
        }
    }

    fn summary(query: &QueryState<Self>, matched: usize, visible: usize) -> String {
        if !query.search().is_empty() {
            return format!("Found {matched} articles matching \"{}\"", query.search());
        }
        match query.filter(NewsDimension::Category) {
            Selection::Only(category) => format!("Showing {visible} {category} articles"),
            Selection::All if matched > visible => format!("Showing {visible} of {matched} articles"),
            Selection::All => format!("Showing all {matched} articles"),
        }
    }
}

#[async_trait]
impl Source for Article {
    async fn load(transport: &dyn Transport, config: &Config) -> Loaded<Self> {
        let now = Utc::now();
        let Some(key) = config.news_api_key.as_deref() else {
            debug!("no news API key; serving demo articles");
            return Loaded {
                records: demo_articles(now),
                mode: DataMode::Demo {
                    reason: "NEWS_API_KEY not set".to_string(),
                },
            };
        };

        let (raw, mode) = fetch_configured(transport, &endpoints(key), config)
            .await
            .or_demo(Vec::new);
        let records = match mode {
            DataMode::Live { .. } => normalize_live(raw, now),
            DataMode::Demo { .. } => demo_articles(now),
        };
        debug!("{} articles loaded | {mode}", records.len());
        Loaded { records, mode }
    }
}

fn normalize_live(raw: Vec<RawArticle>, now: DateTime<Utc>) -> Vec<Article> {
    normalize(raw, now, &mut rand::rng())
}

/// GNews business headlines, authenticated by `token`.
pub fn endpoints(token: &str) -> Vec<Endpoint<Vec<RawArticle>>> {
    vec![Endpoint::new(
        "GNews",
        format!(
            "https://gnews.io/api/v4/top-headlines?token={token}&lang=en&country=us&max=50&topic=business&sortby=publishedAt"
        ),
        gnews,
    )]
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

const CRYPTO_WORDS: [&str; 8] = [
    "crypto", "bitcoin", "ethereum", "blockchain", "nft", "dogecoin", "cryptocurrency", "binance",
];
const STOCK_WORDS: [&str; 12] = [
    "stock", "nasdaq", "s&p", "earnings", "tesla", "apple", "microsoft", "amazon", "google", "nvidia",
    "trading", "dow",
];
const FOREX_WORDS: [&str; 9] = [
    "forex", "dollar", "euro", "yen", "currency", "exchange rate", "fx", "gbp", "jpy",
];
const ECONOMY_WORDS: [&str; 9] = [
    "fed", "interest rate", "inflation", "gdp", "economy", "recession", "central bank",
    "unemployment", "retail sales",
];

/// Keyword categorisation; the first matching group wins.
pub fn categorize(text: &str) -> NewsCategory {
    let text = text.to_lowercase();
    let any = |words: &[&str]| words.iter().any(|word| text.contains(word));

    if any(&CRYPTO_WORDS) {
        NewsCategory::Crypto
    } else if any(&STOCK_WORDS) {
        NewsCategory::Stocks
    } else if any(&FOREX_WORDS) {
        NewsCategory::Forex
    } else if any(&ECONOMY_WORDS) {
        NewsCategory::Economy
    } else {
        NewsCategory::General
    }
}

/// Stock photo shown for articles without an image.
pub fn fallback_image(category: NewsCategory) -> &'static str {
    match category {
        NewsCategory::Crypto => "https://images.unsplash.com/photo-1518546305927-5a555bb7020d?w=400&auto=format&fit=crop",
        NewsCategory::Stocks => "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?w=400&auto=format&fit=crop",
        NewsCategory::Forex => "https://images.unsplash.com/photo-1580519542036-c47de6196ba5?w=400&auto=format&fit=crop",
        NewsCategory::Economy => "https://images.unsplash.com/photo-1460925895917-afdab827c52f?w=400&auto=format&fit=crop",
        NewsCategory::General => "https://images.unsplash.com/photo-1585829365295-ab7cd400c167?w=400&auto=format&fit=crop",
    }
}

/// Maps provider articles onto [`Article`].
///
/// The first two are flagged breaking, each is trending with probability 0.2.
/// Unparseable publish times fall back to `now`.
pub fn normalize(raw: Vec<RawArticle>, now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<Article> {
    raw.into_iter()
        .enumerate()
        .map(|(index, article)| {
            let title = article.title.unwrap_or_else(|| "No title".to_string());
            let content = article
                .content
                .or_else(|| article.description.clone())
                .unwrap_or_default();
            let category = categorize(&format!("{title} {content}"));
            let published_at = article
                .published_at
                .as_deref()
                .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
                .map(|at| at.with_timezone(&Utc))
                .unwrap_or(now);

            Article {
                id: article
                    .url
                    .clone()
                    .unwrap_or_else(|| format!("gnews-{}", index + 1)),
                excerpt: article
                    .description
                    .unwrap_or_else(|| "Click to read more...".to_string()),
                read_minutes: read_minutes(&content),
                image: article
                    .image
                    .unwrap_or_else(|| fallback_image(category).to_string()),
                source: article
                    .source
                    .and_then(|source| source.name)
                    .unwrap_or_else(|| "Unknown Source".to_string()),
                author: "News Source".to_string(),
                url: article.url,
                trending: rng.random_bool(TRENDING_P),
                breaking: index < BREAKING_HEAD,
                title,
                content,
                category,
                published_at,
            }
        })
        .collect()
}

/// The headline for the breaking-news banner.
pub fn breaking_headline(articles: &[Article]) -> Option<&Article> {
    articles.iter().find(|article| article.breaking)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Static articles served without a key or a reachable provider, dated relative to `now`.
pub fn demo_articles(now: DateTime<Utc>) -> Vec<Article> {
    let demo = |n: usize,
                minutes_ago: i64,
                title: &str,
                excerpt: &str,
                content: &str,
                category: NewsCategory,
                source: &str,
                author: &str,
                image: &str,
                read: u32,
                hot: bool| Article {
        id: format!("demo-{n}"),
        title: title.to_string(),
        excerpt: excerpt.to_string(),
        content: content.to_string(),
        category,
        source: source.to_string(),
        author: author.to_string(),
        url: None,
        image: image.to_string(),
        read_minutes: read,
        trending: hot,
        breaking: hot,
        published_at: now - Duration::minutes(minutes_ago),
    };

    vec![
        demo(
            1,
            45,
            "Federal Reserve Holds Rates Steady, Signals Future Cuts",
            "The Federal Reserve maintained interest rates but indicated potential cuts later this year as inflation shows signs of cooling.",
            "In a widely anticipated decision, the Federal Open Market Committee voted to keep the benchmark interest rate unchanged. Chairman Powell emphasized that while inflation has moderated, the committee needs more confidence before considering rate cuts. Markets reacted positively to the dovish tone.",
            NewsCategory::Economy,
            "Reuters",
            "Financial Desk",
            "https://images.unsplash.com/photo-1590283603385-17ffb3a7f29f?w=400&auto=format&fit=crop",
            3,
            true,
        ),
        demo(
            2,
            2 * 60,
            "Bitcoin Surges Past $45,000 as ETF Inflows Continue",
            "Cryptocurrency markets rally as institutional investment in Bitcoin ETFs reaches record levels, driving prices to new yearly highs.",
            "Bitcoin broke through the $45,000 resistance level amid strong institutional demand. Daily inflows into spot Bitcoin ETFs reached $250 million, the highest level in three months. Analysts attribute the surge to growing institutional adoption and positive regulatory developments.",
            NewsCategory::Crypto,
            "CoinDesk",
            "Crypto Analyst",
            "https://images.unsplash.com/photo-1518546305927-5a555bb7020d?w=400&auto=format&fit=crop",
            4,
            true,
        ),
        demo(
            3,
            4 * 60,
            "Tech Giants Report Strong Q4 Earnings, AI Investments Pay Off",
            "Major technology companies exceed earnings expectations, driven by strong performance in cloud computing and AI services.",
            "Apple, Microsoft, and Google parent Alphabet all reported better-than-expected quarterly earnings. Cloud computing revenue grew by 25% year-over-year, while AI-driven services showed significant traction. The NASDAQ composite index reached a new all-time high following the reports.",
            NewsCategory::Stocks,
            "Bloomberg",
            "Tech Analyst",
            "https://images.unsplash.com/photo-1551288049-bebda4e38f71?w=400&auto=format&fit=crop",
            5,
            false,
        ),
        demo(
            4,
            6 * 60,
            "US Dollar Weakens Against Major Currencies After Inflation Data",
            "The US dollar index fell after consumer price data came in lower than expected, boosting risk appetite in currency markets.",
            "The DXY dollar index declined 0.6% following the release of cooler-than-expected inflation figures. EUR/USD climbed to 1.0950 while GBP/USD broke through 1.2750. Traders now price in a higher probability of Fed rate cuts in the second quarter.",
            NewsCategory::Forex,
            "Financial Times",
            "Forex Desk",
            "https://images.unsplash.com/photo-1553877522-43269d4ea984?w=400&auto=format&fit=crop",
            3,
            false,
        ),
    ]
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////

// >> Input: GNews `top-headlines`
// ==========================================================================
#[derive(Deserialize, Debug)]
struct Headlines {
    articles: Vec<RawArticle>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<String>,
    pub source: Option<RawSource>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RawSource {
    pub name: Option<String>,
}

fn gnews(value: Value) -> Option<Vec<RawArticle>> {
    let headlines: Headlines = serde_json::from_value(value).ok()?;
    trace!("GNews returned {} articles", headlines.articles.len());
    Some(headlines.articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::Scripted;
    use crate::pipeline;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn keywords_pick_the_first_matching_group() {
        assert_eq!(categorize("Bitcoin ETF approved"), NewsCategory::Crypto);
        assert_eq!(categorize("Tesla earnings beat; dollar slips"), NewsCategory::Stocks);
        assert_eq!(categorize("Yen weakens overnight"), NewsCategory::Forex);
        assert_eq!(categorize("GDP grew 2%"), NewsCategory::Economy);
        assert_eq!(categorize("Local bakery opens"), NewsCategory::General);
    }

    #[test]
    fn normalize_fills_gaps_and_flags_the_head() {
        let now = Utc::now();
        let raw = vec![
            RawArticle {
                title: Some("Nasdaq closes higher".into()),
                description: Some("Stocks rallied.".into()),
                url: Some("https://example.com/a".into()),
                published_at: Some("2024-03-01T12:00:00Z".into()),
                source: Some(RawSource { name: Some("Wire".into()) }),
                ..RawArticle::default()
            },
            RawArticle::default(),
            RawArticle {
                published_at: Some("yesterday".into()),
                ..RawArticle::default()
            },
        ];
        let articles = normalize(raw, now, &mut StdRng::seed_from_u64(3));

        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].id, "https://example.com/a");
        assert_eq!(articles[0].content, "Stocks rallied.");
        assert_eq!(articles[0].category, NewsCategory::Stocks);
        assert_eq!(articles[0].source, "Wire");
        assert_eq!(articles[0].published_at.to_rfc3339(), "2024-03-01T12:00:00+00:00");

        assert_eq!(articles[1].id, "gnews-2");
        assert_eq!(articles[1].title, "No title");
        assert_eq!(articles[1].excerpt, "Click to read more...");
        assert_eq!(articles[1].source, "Unknown Source");
        assert_eq!(articles[1].image, fallback_image(NewsCategory::General));
        assert_eq!(articles[1].read_minutes, 1);

        assert_eq!(articles[2].published_at, now);
        let breaking: Vec<bool> = articles.iter().map(|a| a.breaking).collect();
        assert_eq!(breaking, vec![true, true, false]);
    }

    #[test]
    fn about_a_fifth_of_live_articles_trend() {
        let raw: Vec<RawArticle> = (0..1000).map(|_| RawArticle::default()).collect();
        let articles = normalize(raw, Utc::now(), &mut StdRng::seed_from_u64(11));
        let trending = articles.iter().filter(|a| a.trending).count();
        assert!((120..280).contains(&trending), "{trending} trending");
    }

    #[test]
    fn summaries_follow_the_active_control() {
        let articles = demo_articles(Utc::now());
        let mut query = QueryState::<Article>::new();
        let run = |query: &QueryState<Article>| {
            let result = pipeline::run(&articles, query);
            Article::summary(query, result.matched_len(), result.visible_len())
        };

        assert_eq!(run(&query), "Showing all 4 articles");
        query.set_visible(2);
        assert_eq!(run(&query), "Showing 2 of 4 articles");
        query.set_filter(NewsDimension::Category, Selection::parse("crypto"));
        assert_eq!(run(&query), "Showing 1 crypto articles");
        query.set_search("Bitcoin");
        assert_eq!(run(&query), "Found 1 articles matching \"bitcoin\"");
    }

    #[test]
    fn popular_weighs_trending_by_read_time() {
        let articles = demo_articles(Utc::now());
        let mut query = QueryState::<Article>::new();
        query.set_sort(NewsSort::Popular);
        let ids: Vec<&str> = pipeline::run(&articles, &query)
            .visible()
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        // popularity 8, 6, 5, 3
        assert_eq!(ids, vec!["demo-2", "demo-1", "demo-3", "demo-4"]);
        assert_eq!(breaking_headline(&articles).map(|a| a.id.as_str()), Some("demo-1"));
    }

    #[test]
    fn articles_serialize_in_camel_case() {
        let article = demo_articles(Utc::now()).remove(1);
        let value = serde_json::to_value(&article).expect("serializable");
        assert_eq!(value["readMinutes"], json!(4));
        assert_eq!(value["category"], json!("crypto"));
        assert!(value.get("publishedAt").is_some());
    }

    #[tokio::test]
    async fn without_a_key_nothing_is_requested() {
        let transport = Scripted::new();
        let loaded = Article::load(&transport, &Config::default()).await;
        assert_eq!(loaded.records.len(), 4);
        assert!(loaded.mode.is_demo());
        assert!(transport.requested().is_empty());
    }

    #[tokio::test]
    async fn a_keyed_load_uses_gnews() {
        let config = Config {
            news_api_key: Some("k".into()),
            ..Config::default()
        };
        let url = endpoints("k").remove(0).url;
        let transport = Scripted::new().respond(
            &url,
            Ok(json!({ "totalArticles": 1, "articles": [
                { "title": "Euro climbs", "url": "https://example.com/euro",
                  "publishedAt": "2024-03-01T12:00:00Z", "source": { "name": "Desk" } }
            ]})),
        );
        let loaded = Article::load(&transport, &config).await;
        assert_eq!(loaded.mode, DataMode::Live { endpoint: "GNews".into() });
        assert_eq!(loaded.records[0].category, NewsCategory::Forex);
        assert!(loaded.records[0].breaking);
    }
}
