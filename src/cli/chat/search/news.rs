use std::time::Duration;

use eyre::Result;
use futures::future;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::cli::chat::search::{truncate, SearchResult, TextCleaner};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scrapes the search pages of the big three Nepali news portals directly.
/// Used when the general-purpose engines come up empty, typically for very
/// recent Nepal-specific events.
pub struct NewsSearcher {
    onlinekhabar_title_re: Regex,
    ekantipur_article_re: Regex,
    ekantipur_title_re: Regex,
    ekantipur_excerpt_re: Regex,
    setopati_title_re: Regex,
    cleaner: TextCleaner,
}

impl NewsSearcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            onlinekhabar_title_re: Regex::new(r"(?s)<h2[^>]*><a[^>]*>(.*?)</a></h2>")?,
            ekantipur_article_re: Regex::new(r"(?s)<article[^>]*>(.*?)</article>")?,
            ekantipur_title_re: Regex::new(r"(?s)<h2[^>]*>(.*?)</h2>")?,
            ekantipur_excerpt_re: Regex::new(r"(?s)<p[^>]*>(.*?)</p>")?,
            setopati_title_re: Regex::new(r"(?s)<h3[^>]*><a[^>]*>(.*?)</a></h3>")?,
            cleaner: TextCleaner::new()?,
        })
    }

    /// Query all three portals concurrently and merge in priority order:
    /// up to two OnlineKhabar stories, then one each from Ekantipur and
    /// Setopati, capped at `max_results`.
    pub async fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        max_results: usize,
    ) -> Vec<SearchResult> {
        debug!("News site search: {:?}", query);

        let (onlinekhabar, ekantipur, setopati) = future::join3(
            self.fetch(client, "https://www.onlinekhabar.com", query),
            self.fetch(client, "https://ekantipur.com", query),
            self.fetch(client, "https://www.setopati.com", query),
        )
        .await;

        let mut results = Vec::new();
        if let Some(html) = onlinekhabar {
            results.extend(self.parse_onlinekhabar(&html, query));
        }
        if let Some(html) = ekantipur {
            results.extend(self.parse_ekantipur(&html, query));
        }
        if let Some(html) = setopati {
            results.extend(self.parse_setopati(&html, query));
        }

        results.truncate(max_results);
        debug!("News sites produced {} results", results.len());
        results
    }

    async fn fetch(&self, client: &reqwest::Client, base: &str, query: &str) -> Option<String> {
        let url = match Url::parse_with_params(&format!("{base}/search"), &[("q", query)]) {
            Ok(url) => url,
            Err(e) => {
                warn!("Bad news search URL for {base}: {e}");
                return None;
            }
        };

        let response = client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => response.text().await.ok(),
            Ok(response) => {
                debug!("{base} returned status {}", response.status());
                None
            }
            Err(e) => {
                debug!("{base} request failed: {e}");
                None
            }
        }
    }

    fn parse_onlinekhabar(&self, html: &str, query: &str) -> Vec<SearchResult> {
        self.onlinekhabar_title_re
            .captures_iter(html)
            .take(2)
            .filter_map(|c| c.get(1))
            .map(|m| self.cleaner.clean(m.as_str()))
            .filter(|title| title.chars().count() > 10)
            .map(|title| SearchResult {
                title: truncate(&title, 120),
                snippet: format!(
                    "Latest news from OnlineKhabar about {}...",
                    truncate(query, 30)
                ),
                source: "OnlineKhabar".to_string(),
                date: "Recent".to_string(),
                url_hint: "onlinekhabar.com".to_string(),
            })
            .collect()
    }

    fn parse_ekantipur(&self, html: &str, query: &str) -> Vec<SearchResult> {
        let mut results = Vec::new();

        for article in self.ekantipur_article_re.captures_iter(html).take(1) {
            let Some(article) = article.get(1).map(|m| m.as_str()) else {
                continue;
            };
            let Some(title) = self.ekantipur_title_re.captures(article).and_then(|c| c.get(1))
            else {
                continue;
            };
            let title = self.cleaner.clean(title.as_str());
            if title.chars().count() <= 10 {
                continue;
            }

            let snippet = self
                .ekantipur_excerpt_re
                .captures(article)
                .and_then(|c| c.get(1))
                .map(|m| truncate(&self.cleaner.clean(m.as_str()), 200))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| {
                    format!("News from Ekantipur about {}...", truncate(query, 30))
                });

            results.push(SearchResult {
                title: truncate(&title, 120),
                snippet,
                source: "Ekantipur".to_string(),
                date: "Recent".to_string(),
                url_hint: "ekantipur.com".to_string(),
            });
        }

        results
    }

    fn parse_setopati(&self, html: &str, query: &str) -> Vec<SearchResult> {
        self.setopati_title_re
            .captures_iter(html)
            .take(1)
            .filter_map(|c| c.get(1))
            .map(|m| self.cleaner.clean(m.as_str()))
            .filter(|title| title.chars().count() > 10)
            .map(|title| SearchResult {
                title: truncate(&title, 120),
                snippet: format!("Latest from Setopati about {}...", truncate(query, 30)),
                source: "Setopati".to_string(),
                date: "Recent".to_string(),
                url_hint: "setopati.com".to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn onlinekhabar_takes_two_headlines() {
        let html = r#"
            <h2 class="news-title"><a href="/a">प्रधानमन्त्रीले नयाँ मन्त्रिपरिषद् घोषणा गरे</a></h2>
            <h2 class="news-title"><a href="/b">काठमाडौंमा आज ठूलो वर्षा भयो</a></h2>
            <h2 class="news-title"><a href="/c">तेस्रो समाचार शीर्षक यहाँ छ</a></h2>
        "#;

        let results = NewsSearcher::new()
            .unwrap()
            .parse_onlinekhabar(html, "नेपाल सरकार");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "OnlineKhabar");
        assert!(results[0].title.contains("मन्त्रिपरिषद्"));
        assert!(results[0].snippet.contains("OnlineKhabar"));
    }

    #[test]
    fn short_headlines_are_skipped() {
        let html = r#"<h2><a href="/a">Short</a></h2>"#;
        let results = NewsSearcher::new().unwrap().parse_onlinekhabar(html, "q");
        assert!(results.is_empty());
    }

    #[test]
    fn ekantipur_uses_article_excerpt() {
        let html = r#"
            <article class="story">
              <h2>संसदमा बजेट छलफल सुरु भयो</h2>
              <p>अर्थमन्त्रीले आगामी आर्थिक वर्षको बजेट प्रस्तुत गर्दै नयाँ कार्यक्रम घोषणा गरे।</p>
            </article>
        "#;

        let results = NewsSearcher::new().unwrap().parse_ekantipur(html, "बजेट");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "Ekantipur");
        assert!(results[0].snippet.contains("अर्थमन्त्री"));
    }

    #[test]
    fn ekantipur_without_excerpt_gets_stock_snippet() {
        let html = r#"<article><h2>मुख्य समाचारको लामो शीर्षक</h2></article>"#;
        let results = NewsSearcher::new().unwrap().parse_ekantipur(html, "budget news");
        assert_eq!(results.len(), 1);
        assert!(results[0].snippet.contains("News from Ekantipur"));
    }

    #[test]
    fn setopati_takes_one_headline() {
        let html = r#"
            <h3 class="main-title"><a href="/x">निर्वाचन आयोगले मिति घोषणा गर्‍यो</a></h3>
            <h3 class="main-title"><a href="/y">अर्को शीर्षक पनि यहाँ राखिएको छ</a></h3>
        "#;

        let results = NewsSearcher::new().unwrap().parse_setopati(html, "निर्वाचन");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "Setopati");
    }
}
