use chrono::Datelike;
use eyre::Result;
use regex::{Regex, RegexSet};
use tracing::debug;
use url::Url;

use crate::cli::chat::search::{truncate, SearchResult, TextCleaner};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// DuckDuckGo's plain-HTML endpoint, scraped with the same markup patterns
/// the result page has carried for years.
pub struct DuckDuckGo {
    result_re: Regex,
    title_re: Regex,
    snippet_re: Regex,
    url_re: Regex,
    date_re: Regex,
    irrelevant: RegexSet,
    cleaner: TextCleaner,
}

impl DuckDuckGo {
    pub fn new() -> Result<Self> {
        Ok(Self {
            result_re: Regex::new(r#"(?s)<div class="result[^"]*">(.*?)</div>\s*</div>"#)?,
            title_re: Regex::new(r#"(?s)class="result__title".*?<a[^>]*>(.*?)</a>"#)?,
            snippet_re: Regex::new(r#"(?s)class="result__snippet".*?>(.*?)</a>"#)?,
            url_re: Regex::new(r#"(?s)class="result__url".*?>(.*?)</a>"#)?,
            date_re: Regex::new(
                r"(?i)(\d{1,2}\s+(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\s+\d{4})",
            )?,
            irrelevant: RegexSet::new([
                r"(?i)wikipedia\.org",
                r"(?i)book.*?price",
                r"(?i)buy.*?online",
                r"(?i)\.pdf$",
                r"(?i)advertisement",
                r"(?i)sponsored",
                "यसबारे थप",
            ])?,
            cleaner: TextCleaner::new()?,
        })
    }

    pub async fn search(
        &self,
        client: &reqwest::Client,
        query: &str,
        max_results: usize,
        political: bool,
    ) -> Result<Vec<SearchResult>> {
        let enhanced = enhance_query(query, political);
        debug!("DuckDuckGo query: {:?}", enhanced);

        let url = Url::parse_with_params(
            SEARCH_ENDPOINT,
            &[
                ("q", enhanced.as_str()),
                // Nepal region, no safe-search filtering.
                ("kl", "np-np"),
                ("df", "y"),
                ("t", "ne"),
            ],
        )?;

        let response = client
            .get(url)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("Referer", "https://duckduckgo.com/")
            .header("DNT", "1")
            .send()
            .await?;

        if !response.status().is_success() {
            debug!("DuckDuckGo returned status {}", response.status());
            return Ok(Vec::new());
        }

        let html = response.text().await?;
        Ok(self.parse(&html, max_results))
    }

    /// Extract up to `max_results` cleaned results from a result page.
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

            let url_hint = self
                .url_re
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| self.cleaner.clean(m.as_str()))
                .unwrap_or_else(|| "Unknown".to_string());

            let date = self
                .date_re
                .captures(&snippet)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "Recent".to_string());

            // Drop thin snippets and shopping/encyclopedia noise.
            if snippet.chars().count() > 20 && !self.is_irrelevant(&title, &snippet) {
                results.push(SearchResult {
                    title: truncate(&title, 120),
                    snippet: truncate(&snippet, 300),
                    source: "DuckDuckGo".to_string(),
                    date,
                    url_hint: truncate(&url_hint, 50),
                });
            }
        }

        debug!("Parsed {} results from DuckDuckGo", results.len());
        results
    }

    fn is_irrelevant(&self, title: &str, snippet: &str) -> bool {
        let combined = format!("{title} {snippet}").to_lowercase();
        self.irrelevant.is_match(&combined)
    }
}

fn enhance_query(query: &str, political: bool) -> String {
    if political {
        format!("{query} site:.np OR site:.com.np latest news update")
    } else {
        let current_year = chrono::Local::now().year();
        format!("{query} {current_year} Nepal")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_block(title: &str, snippet: &str, url: &str) -> String {
        format!(
            r#"<div class="result results_links">
  <h2 class="result__title"><a href="/l/?u=x">{title}</a></h2>
  <a class="result__snippet" href="/l/?u=x">{snippet}</a>
  <a class="result__url" href="/l/?u=x">{url}</a>
</div>
</div>"#
        )
    }

    #[test]
    fn parses_title_snippet_and_url() {
        let html = result_block(
            "Nepal&#39;s <b>new cabinet</b> announced",
            "KATHMANDU, 12 Mar 2026 - The parliament confirmed the new council of ministers today.",
            "www.example.com.np/politics",
        );

        let results = DuckDuckGo::new().unwrap().parse(&html, 3);
        assert_eq!(results.len(), 1);

        let result = &results[0];
        assert_eq!(result.title, "Nepal's new cabinet announced");
        assert!(result.snippet.contains("council of ministers"));
        assert_eq!(result.source, "DuckDuckGo");
        assert_eq!(result.date, "12 Mar 2026");
        assert_eq!(result.url_hint, "www.example.com.np/politics");
    }

    #[test]
    fn snippet_without_date_reads_recent() {
        let html = result_block(
            "Kathmandu traffic update",
            "Road widening along Ring Road continues with diversions near Koteshwor in place.",
            "example.np",
        );
        let results = DuckDuckGo::new().unwrap().parse(&html, 3);
        assert_eq!(results[0].date, "Recent");
    }

    #[test]
    fn thin_snippets_are_dropped() {
        let html = result_block("Some headline", "too short", "example.np");
        assert!(DuckDuckGo::new().unwrap().parse(&html, 3).is_empty());
    }

    #[test]
    fn encyclopedia_and_shop_noise_is_filtered() {
        let wiki = result_block(
            "Nepal - en.wikipedia.org",
            "Nepal is a landlocked country in South Asia bordered by China and India.",
            "en.wikipedia.org/wiki/Nepal",
        );
        let shop = result_block(
            "Buy Nepal history book online",
            "Great discounts when you buy this book online today from our big catalogue.",
            "shop.example.com",
        );
        let ddg = DuckDuckGo::new().unwrap();
        assert!(ddg.parse(&wiki, 3).is_empty());
        assert!(ddg.parse(&shop, 3).is_empty());
    }

    #[test]
    fn respects_max_results() {
        let mut html = String::new();
        for i in 0..5 {
            html.push_str(&result_block(
                &format!("Headline number {i}"),
                "A reasonably detailed snippet describing the underlying story in full.",
                "example.np",
            ));
        }
        let results = DuckDuckGo::new().unwrap().parse(&html, 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn long_fields_are_truncated() {
        let long_title = "t".repeat(200);
        let long_snippet = format!("{} end", "s".repeat(400));
        let html = result_block(&long_title, &long_snippet, "example.np");

        let results = DuckDuckGo::new().unwrap().parse(&html, 3);
        assert!(results[0].title.chars().count() <= 123);
        assert!(results[0].title.ends_with("..."));
        assert!(results[0].snippet.chars().count() <= 303);
    }

    #[test]
    fn political_queries_pin_nepali_domains() {
        let q = enhance_query("prime minister", true);
        assert!(q.contains("site:.np"));
        let general = enhance_query("weather kathmandu", false);
        assert!(general.contains("Nepal"));
    }
}
