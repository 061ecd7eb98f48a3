pub mod duckduckgo;
pub mod google;
pub mod news;

use std::time::{Duration, Instant};

use eyre::Result;
use regex::Regex;
use tracing::{debug, info, warn};

use duckduckgo::DuckDuckGo;
use google::GoogleSearch;
use news::NewsSearcher;

/// How many results a search-context block carries at most.
pub const MAX_RESULTS: usize = 3;

/// One scraped search result, already cleaned for prompt use.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub source: String,
    pub date: String,
    pub url_hint: String,
}

/// Keywords whose presence means the answer likely needs information newer
/// than the model's training data. Matched by case-insensitive containment.
const CURRENT_KEYWORDS: &[&str] = &[
    "current", "latest", "recent", "new", "now", "today",
    "prime minister", "president", "pm", "government",
    "minister", "cabinet", "election", "result",
    "2025", "2026", "this year", "as of now",
    "breaking news", "latest update", "just announced",
    "नेपालको", "प्रधानमन्त्री", "राष्ट्रपति", "सरकार",
    "वर्तमान", "हालको", "नयाँ", "ताजा", "आज", "भर्खर",
];

const TIME_PHRASES: &[&str] = &[
    "who is current", "what is current", "latest news",
    "recent development", "today's update", "now serving",
    "current situation", "present government",
];

/// Keywords that route a query through the political-search path.
const POLITICAL_KEYWORDS: &[&str] = &[
    "prime minister", "president", "pm", "government",
    "minister", "cabinet", "head of state", "head of government",
    "प्रधानमन्त्री", "राष्ट्रपति", "सरकार", "मन्त्री",
];

/// Whether a message should trigger a web search for current information.
///
/// Pure containment over fixed keyword and phrase lists; no I/O.
pub fn needs_web_search(text: &str) -> bool {
    let lowered = text.to_lowercase();

    CURRENT_KEYWORDS.iter().any(|k| lowered.contains(k))
        || TIME_PHRASES.iter().any(|p| lowered.contains(p))
}

/// Whether a query asks about political positions and should use the
/// specialized query sequences.
pub fn is_political_query(text: &str) -> bool {
    let lowered = text.to_lowercase();
    POLITICAL_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Strips markup and entities out of scraped HTML fragments.
pub(crate) struct TextCleaner {
    tag_re: Regex,
    whitespace_re: Regex,
}

impl TextCleaner {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            tag_re: Regex::new(r"<[^>]+>")?,
            whitespace_re: Regex::new(r"\s+")?,
        })
    }

    /// Remove tags, decode the handful of entities the news sites emit, and
    /// collapse runs of whitespace.
    pub(crate) fn clean(&self, text: &str) -> String {
        let without_tags = self.tag_re.replace_all(text, " ");
        let decoded = decode_entities(&without_tags);
        self.whitespace_re.replace_all(&decoded, " ").trim().to_string()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&hellip;", "…")
}

/// Truncate to `max` characters, appending an ellipsis when anything was
/// cut. Character-based so Devanagari text is never split mid code point.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}...")
}

/// Web search with Nepal-specific optimization.
///
/// DuckDuckGo's HTML endpoint is the primary source; political queries try
/// hand-tuned query sequences first; Nepali news sites and a Google HTML
/// fallback back the whole thing up. Every failure downgrades to "no
/// results", since a search problem must never break the chat turn.
pub struct WebSearcher {
    client: reqwest::Client,
    duckduckgo: DuckDuckGo,
    google: GoogleSearch,
    news: NewsSearcher,
}

impl WebSearcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            duckduckgo: DuckDuckGo::new()?,
            google: GoogleSearch::new()?,
            news: NewsSearcher::new()?,
        })
    }

    /// Run a search, never failing: errors are logged and collapse to an
    /// empty result list.
    pub async fn search(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        debug!("Searching: {:?}", query);

        let results = if is_political_query(query) {
            self.search_political(query, max_results).await
        } else {
            self.search_general(query, max_results).await
        };

        match results {
            Ok(results) => {
                for result in &results {
                    debug!("Result from {} ({})", result.source, result.url_hint);
                }
                results
            }
            Err(e) => {
                warn!("Search failed for {:?}: {}", query, e);
                Vec::new()
            }
        }
    }

    /// Political positions change; canned query sequences beat the user's
    /// own wording for those.
    async fn search_political(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        for search_query in political_queries(query) {
            match self
                .duckduckgo
                .search(&self.client, &search_query, max_results, true)
                .await
            {
                Ok(results) if !results.is_empty() => {
                    debug!("Political results via {:?}", search_query);
                    return Ok(results);
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!("DuckDuckGo failed for {:?}: {}", search_query, e);
                    continue;
                }
            }
        }

        // Last resort: the Nepali news sites directly.
        Ok(self.news.search(&self.client, query, max_results).await)
    }

    async fn search_general(&self, query: &str, max_results: usize) -> Result<Vec<SearchResult>> {
        match self
            .duckduckgo
            .search(&self.client, query, max_results, false)
            .await
        {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(_) => debug!("DuckDuckGo returned nothing for {:?}", query),
            Err(e) => warn!("DuckDuckGo failed for {:?}: {}", query, e),
        }

        self.google.search(&self.client, query, max_results).await
    }

    /// Fetch results and format them as the search-context block prepended
    /// to the generation prompt. `None` when nothing usable came back.
    pub async fn search_context(&self, query: &str) -> Option<String> {
        let started = Instant::now();
        let results = self.search(query, MAX_RESULTS).await;
        let elapsed = started.elapsed();

        if results.is_empty() {
            info!("No search results for {:?} ({:.2}s)", query, elapsed.as_secs_f64());
            return None;
        }

        info!(
            "Found {} search results for {:?} in {:.2}s",
            results.len(),
            query,
            elapsed.as_secs_f64()
        );

        Some(format_context(query, &results, elapsed))
    }
}

fn political_queries(query: &str) -> Vec<String> {
    let lowered = query.to_lowercase();

    if lowered.contains("prime minister") || lowered.contains("pm") || query.contains("प्रधानमन्त्री") {
        vec![
            "Nepal current Prime Minister 2025 2026 latest".to_string(),
            "Who is Prime Minister of Nepal now".to_string(),
            "नयाँ प्रधानमन्त्री नेपाल २०२६".to_string(),
        ]
    } else if lowered.contains("president") || query.contains("राष्ट्रपति") {
        vec![
            "Nepal President 2025 2026 current".to_string(),
            "Who is President of Nepal now".to_string(),
            "नेपालको राष्ट्रपति २०२६".to_string(),
        ]
    } else {
        vec![format!("{query} Nepal latest 2025 2026")]
    }
}

fn format_context(query: &str, results: &[SearchResult], elapsed: Duration) -> String {
    let current_date = chrono::Local::now().format("%B %d, %Y %H:%M");

    let mut context = format!(
        "🔍 **CURRENT WEB SEARCH RESULTS**\n\n\
         **Search Query:** \"{query}\"\n\
         **Search Time:** {current_date}\n\
         **Results Found:** {count}\n\
         **Search Duration:** {duration:.2}s\n\n",
        query = query,
        current_date = current_date,
        count = results.len(),
        duration = elapsed.as_secs_f64(),
    );

    for (i, result) in results.iter().enumerate() {
        context.push_str(&format!(
            "**RESULT #{n}: {title}**\n\
             {snippet}\n\n\
             *Source: {source} | Date: {date}*\n\
             {rule}\n\n",
            n = i + 1,
            title = result.title,
            snippet = result.snippet,
            source = result.source,
            date = result.date,
            rule = "-".repeat(50),
        ));
    }

    context.push_str(
        "---\n\
         **CRITICAL INSTRUCTIONS:**\n\
         1. Use ONLY the information from these search results\n\
         2. Start with \"Based on current web search:\"\n\
         3. Reference specific result numbers (#1, #2, #3)\n\
         4. If search doesn't answer, say: \"Search results don't contain specific information\"\n\
         5. NEVER guess or use outdated knowledge\n",
    );

    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_info_keywords_trigger_search() {
        assert!(needs_web_search("Who is the current Prime Minister of Nepal?"));
        assert!(needs_web_search("latest news from Kathmandu"));
        assert!(needs_web_search("What happened in the election?"));
        assert!(needs_web_search("petrol price today"));
    }

    #[test]
    fn devanagari_keywords_trigger_search() {
        assert!(needs_web_search("नेपालको प्रधानमन्त्री को हुन्?"));
        assert!(needs_web_search("आज के भयो?"));
        assert!(needs_web_search("ताजा समाचार"));
    }

    #[test]
    fn timeless_questions_skip_search() {
        assert!(!needs_web_search("Explain photosynthesis"));
        assert!(!needs_web_search("How do I cook dal bhat?"));
        assert!(!needs_web_search("timro favourite festival k ho"));
    }

    #[test]
    fn political_queries_are_detected() {
        assert!(is_political_query("who is the prime minister"));
        assert!(is_political_query("Nepal ko President"));
        assert!(is_political_query("नेपालको सरकार"));
        assert!(!is_political_query("best momo in Kathmandu"));
    }

    #[test]
    fn political_query_sequences_are_specialized() {
        let pm = political_queries("who is the prime minister of Nepal");
        assert_eq!(pm.len(), 3);
        assert!(pm[0].contains("Prime Minister"));
        assert!(pm[2].contains("प्रधानमन्त्री"));

        let president = political_queries("नेपालको राष्ट्रपति");
        assert!(president[0].contains("President"));

        let generic = political_queries("education minister budget");
        assert_eq!(generic.len(), 1);
        assert!(generic[0].contains("Nepal latest"));
    }

    #[test]
    fn cleaner_strips_tags_and_entities() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(
            cleaner.clean("<b>Nepal&#39;s</b>   new&nbsp;&amp; old <a href=\"#\">news</a>"),
            "Nepal's new & old news"
        );
    }

    #[test]
    fn truncate_respects_devanagari_boundaries() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("abcdefgh", 5), "abcde...");
        // 4 chars of Devanagari survive a cut at 4 without panicking.
        let cut = truncate("नमस्ते संसार", 4);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn context_block_numbers_results_and_keeps_instructions() {
        let results = vec![
            SearchResult {
                title: "PM sworn in".to_string(),
                snippet: "The new cabinet took office on Sunday.".to_string(),
                source: "DuckDuckGo".to_string(),
                date: "12 Mar 2026".to_string(),
                url_hint: "example.com.np".to_string(),
            },
            SearchResult {
                title: "Budget session".to_string(),
                snippet: "Parliament convened for the budget.".to_string(),
                source: "OnlineKhabar".to_string(),
                date: "Recent".to_string(),
                url_hint: "onlinekhabar.com".to_string(),
            },
        ];

        let context = format_context("nepal government", &results, Duration::from_millis(1234));

        assert!(context.contains("CURRENT WEB SEARCH RESULTS"));
        assert!(context.contains("**Search Query:** \"nepal government\""));
        assert!(context.contains("**Results Found:** 2"));
        assert!(context.contains("**RESULT #1: PM sworn in**"));
        assert!(context.contains("**RESULT #2: Budget session**"));
        assert!(context.contains("*Source: OnlineKhabar | Date: Recent*"));
        assert!(context.contains("CRITICAL INSTRUCTIONS"));
        assert!(context.contains("Based on current web search:"));
        let result_one = context.find("RESULT #1").unwrap();
        let result_two = context.find("RESULT #2").unwrap();
        assert!(result_one < result_two);
    }
}
