use eyre::Result;
use regex::Regex;
use tracing::debug;
use url::Url;

use crate::cli::chat::search::{truncate, SearchResult, TextCleaner};

const SEARCH_ENDPOINT: &str = "https://www.google.com/search";

/// Fallback scraper for Google's HTML results page. Only consulted when
/// DuckDuckGo comes back empty, and treated as best-effort: Google's markup
/// shifts often and a parse miss just means zero results.
pub struct GoogleSearch {
    result_re: Regex,
    title_re: Regex,
    snippet_re: Regex,
    cleaner: TextCleaner,
}

impl GoogleSearch {
    pub fn new() -> Result<Self> {
        Ok(Self {
            result_re: Regex::new(r#"(?s)<div class="g">(.*?)</div>\s*</div>\s*</div>"#)?,
            title_re: Regex::new(r"(?s)<h3[^>]*>(.*?)</h3>")?,
            snippet_re: Regex::new(r#"(?s)<div[^>]*class="[^"]*VwiC3b[^"]*"[^>]*>(.*?)</div>"#)?,
            cleaner: TextCleaner::new()?,
        })
    }

    pub async fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>> {
        let url = Url::parse_with_params(
            SEARCH_ENDPOINT,
            &[("q", format!("{query} Nepal").as_str()), ("gl", "np")],
        )?;
        debug!("Google fallback query: {:?}", query);

        let response = client
            .get(url)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("Google returned status {}", response.status());
            return Ok(Vec::new());
        }

        let html = response.text().await?;
        Ok(self.parse(&html, max_results))
    }

    pub fn parse(&self, html: &str, max_results: usize) -> Vec<SearchResult> {
        let mut results = Vec::new();

        for block in self.result_re.captures_iter(html).take(max_results) {
            let Some(block) = block.get(1).map(|m| m.as_str()) else {
                continue;
            };

            let Some(title) = self.title_re.captures(block).and_then(|c| c.get(1)) else {
                continue;
            };
            let title = self.cleaner.clean(title.as_str());

            let snippet = self
                .snippet_re
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| self.cleaner.clean(m.as_str()))
                .unwrap_or_default();

            if snippet.chars().count() > 20 {
                results.push(SearchResult {
                    title: truncate(&title, 100),
                    snippet: truncate(&snippet, 250),
                    source: "Google Search".to_string(),
                    date: "Recent".to_string(),
                    url_hint: "google.com".to_string(),
                });
            }
        }

        debug!("Parsed {} results from Google", results.len());
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_block(title: &str, snippet: &str) -> String {
        format!(
            r#"<div class="g">
  <div class="tF2Cxc">
    <h3 class="LC20lb">{title}</h3>
    <div class="VwiC3b yXK7lf">{snippet}</div>
    <span class="fG8Fp">extra</span>
  </div>
</div>
</div>"#
        )
    }

    #[test]
    fn parses_google_result_markup() {
        let html = result_block(
            "Nepal tourism rebounds",
            "Arrivals climbed sharply this spring as trekking routes reopened across the country.",
        );

        let results = GoogleSearch::new().unwrap().parse(&html, 3);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Nepal tourism rebounds");
        assert_eq!(results[0].source, "Google Search");
        assert_eq!(results[0].date, "Recent");
    }

    #[test]
    fn blocks_without_snippet_are_dropped() {
        let html = r#"<div class="g"><div><div><h3>Bare headline</h3></div></div></div></div>"#;
        assert!(GoogleSearch::new().unwrap().parse(html, 3).is_empty());
    }
}
