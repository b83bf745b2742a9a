// src/services/news.rs
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;

use super::error::{FetchError, Result};
use crate::models::NewsItem;

const RSS_URL: &str = "https://feeds.finance.yahoo.com/rss/2.0/headline";
pub const TOP_NEWS: usize = 10;

// Word polarities in [-1, 1].
const LEXICON: &[(&str, f64)] = &[
    ("beat", 0.6), ("beats", 0.6), ("bullish", 0.7), ("gain", 0.5), ("gains", 0.5),
    ("good", 0.7), ("great", 0.8), ("growth", 0.5), ("high", 0.2), ("higher", 0.3),
    ("improve", 0.5), ("improved", 0.5), ("outperform", 0.6), ("positive", 0.6),
    ("profit", 0.5), ("profitable", 0.6), ("rally", 0.6), ("record", 0.4), ("rise", 0.4),
    ("rises", 0.4), ("soar", 0.7), ("soars", 0.7), ("strong", 0.5), ("surge", 0.6),
    ("surges", 0.6), ("upgrade", 0.6), ("win", 0.6), ("best", 1.0),
    ("bad", -0.7), ("bearish", -0.7), ("crash", -0.8), ("cut", -0.4), ("cuts", -0.4),
    ("decline", -0.5), ("declines", -0.5), ("down", -0.2), ("downgrade", -0.6), ("drop", -0.5),
    ("drops", -0.5), ("fall", -0.4), ("falls", -0.4), ("fear", -0.6), ("lawsuit", -0.5),
    ("loss", -0.5), ("losses", -0.5), ("low", -0.2), ("lower", -0.3), ("miss", -0.5),
    ("misses", -0.5), ("negative", -0.6), ("plunge", -0.8), ("plunges", -0.8), ("risk", -0.3),
    ("slump", -0.6), ("weak", -0.5), ("worse", -0.6), ("worst", -1.0),
];

const NEGATORS: &[&str] = &["not", "no", "never", "without", "isn't", "wasn't", "don't", "doesn't", "didn't"];
const INTENSIFIERS: &[(&str, f64)] = &[("very", 1.3), ("extremely", 1.5), ("sharply", 1.4), ("slightly", 0.5)];

/// Polarity of a piece of text in [-1, 1]; 0 when no known word occurs.
///
/// Matched word polarities are averaged. A negator directly before a word
/// (optionally with an intensifier between) flips and damps it, an
/// intensifier scales it.
pub fn sentiment_score(text: &str) -> f64 {
    let words: Vec<String> = text
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();

    let mut total = 0.0;
    let mut hits = 0usize;
    for (i, word) in words.iter().enumerate() {
        let Some(&(_, polarity)) = LEXICON.iter().find(|(w, _)| w == word) else {
            continue;
        };
        let mut score = polarity;
        let mut j = i;
        if j > 0 {
            if let Some(&(_, factor)) = INTENSIFIERS.iter().find(|(w, _)| *w == words[j - 1]) {
                score *= factor;
                j -= 1;
            }
        }
        if j > 0 && NEGATORS.contains(&words[j - 1].as_str()) {
            score *= -0.5;
        }
        total += score.clamp(-1.0, 1.0);
        hits += 1;
    }

    if hits == 0 {
        0.0
    } else {
        total / hits as f64
    }
}

fn strip_markup(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(raw);
    let fragment = Html::parse_fragment(raw);
    let text: String = fragment.root_element().text().collect();
    // Entity-escaped markup decodes to tags on the first pass.
    let text = if text.contains('<') {
        Html::parse_fragment(&text).root_element().text().collect()
    } else {
        text
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn tag_pattern(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}[^>]*>(.*?)</{tag}>", tag = tag)).unwrap()
}

static ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<item>(.*?)</item>").unwrap());
static TITLE_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("title"));
static DESCRIPTION_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("description"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("link"));
static PUB_DATE_RE: Lazy<Regex> = Lazy::new(|| tag_pattern("pubDate"));

fn field(re: &Regex, block: &str) -> String {
    re.captures(block)
        .and_then(|c| c.get(1))
        .map(|m| strip_markup(m.as_str()))
        .unwrap_or_default()
}

/// Extracts up to `limit` items from an RSS 2.0 document and scores them.
pub fn parse_rss(ticker: &str, xml: &str, limit: usize) -> Result<Vec<NewsItem>> {
    let items: Vec<NewsItem> = ITEM_RE
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .take(limit)
        .map(|m| {
            let block = m.as_str();
            let title = field(&TITLE_RE, block);
            let summary = field(&DESCRIPTION_RE, block);
            NewsItem {
                published: field(&PUB_DATE_RE, block),
                title_sentiment: sentiment_score(&title),
                summary_sentiment: sentiment_score(&summary),
                link: field(&LINK_RE, block),
                title,
                summary,
            }
        })
        .collect();

    if items.is_empty() {
        return Err(FetchError::NoData(ticker.to_string()));
    }
    debug!("Parsed {} news items for {}", items.len(), ticker);
    Ok(items)
}

#[derive(Clone)]
pub struct NewsClient {
    client: Client,
    base_url: String,
}

impl NewsClient {
    pub fn new(client: Client) -> Self {
        NewsClient {
            client,
            base_url: RSS_URL.to_string(),
        }
    }

    pub async fn top_news(&self, ticker: &str) -> Result<Vec<NewsItem>> {
        info!("Fetching news feed for {}", ticker);
        let xml = self.client
            .get(&self.base_url)
            .header("User-Agent", "Mozilla/5.0")
            .query(&[("s", ticker), ("region", "US"), ("lang", "en-US")])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_rss(ticker, &xml, TOP_NEWS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Yahoo! Finance: AAPL News</title>
<item>
  <description>Shares &lt;b&gt;surge&lt;/b&gt; after a strong quarter.</description>
  <guid isPermaLink="false">a1</guid>
  <link>https://finance.yahoo.com/news/a1.html</link>
  <pubDate>Mon, 15 Jan 2024 14:30:00 +0000</pubDate>
  <title>Apple beats estimates</title>
</item>
<item>
  <description><![CDATA[<p>Analysts see <i>weak</i> demand.</p>]]></description>
  <link>https://finance.yahoo.com/news/a2.html</link>
  <pubDate>Tue, 16 Jan 2024 09:00:00 +0000</pubDate>
  <title>Apple shares drop on downgrade</title>
</item>
<item>
  <title>Apple to hold event</title>
  <link>https://finance.yahoo.com/news/a3.html</link>
</item>
</channel></rss>"#;

    #[test]
    fn parses_items_in_feed_order() {
        let items = parse_rss("AAPL", FEED, TOP_NEWS).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Apple beats estimates");
        assert_eq!(items[0].summary, "Shares surge after a strong quarter.");
        assert_eq!(items[0].link, "https://finance.yahoo.com/news/a1.html");
        assert_eq!(items[0].published, "Mon, 15 Jan 2024 14:30:00 +0000");
        assert_eq!(items[1].summary, "Analysts see weak demand.");
        assert_eq!(items[2].summary, "");
    }

    #[test]
    fn scores_titles_and_summaries() {
        let items = parse_rss("AAPL", FEED, TOP_NEWS).unwrap();
        assert!(items[0].title_sentiment > 0.0);
        assert!(items[0].summary_sentiment > 0.0);
        assert!(items[1].title_sentiment < 0.0);
        assert!(items[1].summary_sentiment < 0.0);
        assert_eq!(items[2].title_sentiment, 0.0);
    }

    #[test]
    fn limit_caps_items() {
        assert_eq!(parse_rss("AAPL", FEED, 2).unwrap().len(), 2);
    }

    #[test]
    fn empty_feed_is_no_data() {
        let feed = "<rss><channel><title>nothing</title></channel></rss>";
        assert!(matches!(parse_rss("ZZZZ", feed, TOP_NEWS), Err(FetchError::NoData(_))));
    }

    #[test]
    fn shared_patterns_give_repeatable_results() {
        let first = parse_rss("AAPL", FEED, TOP_NEWS).unwrap();
        let second = parse_rss("AAPL", FEED, TOP_NEWS).unwrap();
        assert_eq!(first, second);

        let block = r#"<title type="text">Apple &amp; peers rally</title>"#;
        assert_eq!(field(&TITLE_RE, block), "Apple & peers rally");
        assert_eq!(field(&LINK_RE, block), "");
    }

    #[test]
    fn negation_and_intensity() {
        assert_eq!(sentiment_score("nothing to see here"), 0.0);
        assert!((sentiment_score("good") - 0.7).abs() < 1e-12);
        assert!(sentiment_score("not good") < 0.0);
        assert!(sentiment_score("very good") > sentiment_score("good"));
        let score = sentiment_score("the best of the best and very great");
        assert!(score <= 1.0 && score > 0.0);
    }
}
