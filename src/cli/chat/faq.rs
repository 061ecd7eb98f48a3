use std::collections::HashSet;
use std::fs;
use std::path::Path;

use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cli::chat::language::LanguageMode;

/// Minimum share of a stored question's tokens that must appear in the user
/// query before the FAQ answers locally instead of calling the model.
pub const MATCH_THRESHOLD: f32 = 0.7;

/// One frequently asked question with an answer per language register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    /// English answer.
    pub en: String,
    /// Devanagari answer.
    pub ne: String,
    /// Romanized-Nepali answer.
    pub np: String,
}

/// Fixed FAQ store consulted before every generation call.
///
/// A confident match answers the turn without a network round trip, in the
/// language register the classifier picked. Matching is lexical token
/// overlap; entries neither learn nor reorder at runtime.
pub struct FaqStore {
    entries: Vec<FaqEntry>,
}

impl FaqStore {
    /// The built-in FAQ database.
    pub fn builtin() -> Self {
        Self { entries: builtin_entries() }
    }

    /// Built-in database, unless `<config dir>/kancha/faq.json` exists and
    /// parses, in which case the file replaces it wholesale.
    pub fn load_default() -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("kancha").join("faq.json");
            if path.is_file() {
                match Self::load_from_file(&path) {
                    Ok(store) => {
                        debug!("Loaded {} FAQ entries from {}", store.len(), path.display());
                        return store;
                    }
                    Err(e) => {
                        warn!("Could not load FAQ file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::builtin()
    }

    /// Load entries from a JSON file: an array of objects with `question`,
    /// `en`, `ne`, and `np` fields.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let entries: Vec<FaqEntry> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the best-matching FAQ answer for a query, in the register that
    /// matches the detected language mode.
    ///
    /// The best-scoring entry wins if at least [`MATCH_THRESHOLD`] of its
    /// question tokens appear in the query; otherwise `None`, and the caller
    /// falls through to the generation service.
    pub fn lookup(&self, query: &str, mode: LanguageMode) -> Option<&str> {
        let query_tokens: HashSet<String> = tokenize(query).collect();
        if query_tokens.is_empty() {
            return None;
        }

        let mut best: Option<(&FaqEntry, f32)> = None;
        for entry in &self.entries {
            let score = overlap_score(&query_tokens, &entry.question);
            if score >= MATCH_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        best.map(|(entry, score)| {
            debug!("FAQ hit {:?} (score {:.2})", entry.question, score);
            match mode {
                LanguageMode::English => entry.en.as_str(),
                LanguageMode::Devanagari => entry.ne.as_str(),
                LanguageMode::Nepglish => entry.np.as_str(),
            }
        })
    }
}

/// Share of the stored question's tokens present in the query token set.
fn overlap_score(query_tokens: &HashSet<String>, question: &str) -> f32 {
    let question_tokens: Vec<String> = tokenize(question).collect();
    if question_tokens.is_empty() {
        return 0.0;
    }

    let shared = question_tokens
        .iter()
        .filter(|t| query_tokens.contains(*t))
        .count();

    shared as f32 / question_tokens.len() as f32
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

fn entry(question: &str, en: &str, ne: &str, np: &str) -> FaqEntry {
    FaqEntry {
        question: question.to_string(),
        en: en.to_string(),
        ne: ne.to_string(),
        np: np.to_string(),
    }
}

fn builtin_entries() -> Vec<FaqEntry> {
    vec![
        entry(
            "what is kancha ai",
            "Kancha AI is a bilingual AI assistant designed specifically for Nepali users. \
             I can help with questions in English, Devanagari (नेपाली), or Romanized Nepali \
             (Nepglish). I understand Nepal's culture, education system, and daily life.",
            "Kancha AI एक bilingual AI assistant हो जुन विशेष गरी नेपाली प्रयोगकर्ताहरूको लागि design \
             गरिएको छ। म अंग्रेजी, देवनागरी (नेपाली), वा Romanized Nepali (Nepglish) मा प्रश्नहरूको उत्तर \
             दिन सक्छु।",
            "Kancha AI Nepal ko lagi banayeko bilingual AI assistant ho. Ma English, Devanagari \
             (नेपाली), ya Romanized Nepali (Nepglish) ma help garna sakchu.",
        ),
        entry(
            "who made you",
            "I was created to serve the Nepali community with culturally-aware AI assistance. \
             I'm built using Google's Gemini AI with a custom system designed for Nepali users.",
            "म नेपाली समुदायलाई culturally-aware AI assistance प्रदान गर्न बनाइएको हुँ। म Google को \
             Gemini AI प्रयोग गरेर नेपाली प्रयोगकर्ताहरूको लागि विशेष design गरिएको छु।",
            "Ma Nepali community lai help garna banayeko chu. Google ko Gemini AI use garera \
             Nepali users ko lagi special design gareko chu.",
        ),
        entry(
            "what can you do",
            "I can help with:\n• General questions in English/Nepali\n• Nepal-related \
             information (education, culture, daily life)\n• Study tips and career guidance\n\
             • Language translation\n• Summarizing text\n• Cultural explanations",
            "म यी कुरामा मद्दत गर्न सक्छु:\n• English/Nepali मा सामान्य प्रश्नहरू\n• Nepal-related जानकारी \
             (शिक्षा, संस्कृति, दैनिक जीवन)\n• अध्ययन tips र करियर guidance\n• भाषा अनुवाद\n• Text \
             summarize गर्न\n• सांस्कृतिक व्याख्या",
            "Ma yi kura ma help garna sakchu:\n• English/Nepali ma general questions\n\
             • Nepal-related info (education, culture, daily life)\n• Study tips ra career \
             guidance\n• Language translation\n• Text summarize garna\n• Cultural explanations",
        ),
        entry(
            "see exam",
            "SEE (Secondary Education Examination) is Nepal's grade 10 board exam conducted by \
             the National Examinations Board (NEB). It's a crucial exam that determines \
             eligibility for higher secondary education (+2).",
            "SEE (Secondary Education Examination) नेपालको कक्षा १० को board exam हो जुन राष्ट्रिय \
             परीक्षा बोर्ड (NEB) द्वारा सञ्चालन गरिन्छ। यो उच्च माध्यमिक शिक्षा (+2) को लागि योग्यता निर्धारण गर्ने \
             महत्त्वपूर्ण परीक्षा हो।",
            "SEE (Secondary Education Examination) Nepal ko grade 10 ko board exam ho jun \
             National Examinations Board (NEB) le conduct garchha. Yo higher secondary \
             education (+2) ko lagi eligibility determine garne important exam ho.",
        ),
        entry(
            "dashain",
            "Dashain is Nepal's biggest and most important festival, celebrated for 15 days in \
             September/October. It symbolizes the victory of good over evil and is a time for \
             family reunions, receiving Tika and blessings from elders.",
            "दशैं नेपालको सबैभन्दा ठूलो र महत्त्वपूर्ण चाड हो, जुन सेप्टेम्बर/अक्टोबरमा १५ दिनसम्म मनाइन्छ। यसले \
             असत्यमाथि सत्यको विजयलाई प्रतीक गर्दछ र परिवारको पुनर्मिलन, बुजुर्गहरूबाट टीका र आशीर्वाद प्राप्त गर्ने \
             समय हो।",
            "Dashain Nepal ko sabai bhanda thulo ra important festival ho, jun \
             September/October ma 15 din samma manaincha. Yo evil over good ko victory lai \
             symbolize garchha ani family reunion, elder haru bata Tika ra blessings paune \
             time ho.",
        ),
        entry(
            "ioe entrance",
            "IOE (Institute of Engineering) Entrance is the entrance exam for engineering \
             programs at Tribhuvan University. It's highly competitive and covers Physics, \
             Chemistry, Mathematics, and English. Students need strong preparation and \
             typically score 35+ marks out of 100 for admission.",
            "IOE (Institute of Engineering) Entrance त्रिभुवन विश्वविद्यालयमा इन्जिनियरिङ कार्यक्रमहरूको \
             प्रवेश परीक्षा हो। यो अत्यधिक प्रतिस्पर्धात्मक छ र Physics, Chemistry, Mathematics, र English \
             समावेश गर्दछ। विद्यार्थीहरूलाई बलियो तयारी चाहिन्छ र सामान्यतया १०० मध्ये ३५+ अंक भर्नाको लागि \
             आवश्यक हुन्छ।",
            "IOE (Institute of Engineering) Entrance Tribhuvan University ma engineering \
             programs ko entrance exam ho. Yo highly competitive cha ani Physics, Chemistry, \
             Mathematics, ra English cover garchha. Students lai strong preparation chahincha \
             ani typically 100 madhye 35+ marks admission ko lagi chahincha.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn exact_question_matches_in_every_register() {
        let store = FaqStore::builtin();

        let en = store.lookup("what is kancha ai", LanguageMode::English).unwrap();
        assert!(en.contains("bilingual AI assistant"));

        let np = store.lookup("what is kancha ai", LanguageMode::Nepglish).unwrap();
        assert!(np.contains("banayeko"));

        let ne = store.lookup("what is kancha ai", LanguageMode::Devanagari).unwrap();
        assert!(ne.contains("नेपाली"));
    }

    #[test]
    fn punctuation_and_case_do_not_matter() {
        let store = FaqStore::builtin();
        assert!(store.lookup("What is Kancha AI???", LanguageMode::English).is_some());
        assert!(store.lookup("WHO MADE YOU?", LanguageMode::English).is_some());
    }

    #[test]
    fn extra_query_words_still_match() {
        let store = FaqStore::builtin();
        // All question tokens present: "see exam" inside a longer question.
        let answer = store.lookup("what is the SEE exam in Nepal", LanguageMode::English);
        assert!(answer.unwrap().contains("Secondary Education Examination"));
    }

    #[test]
    fn weak_overlap_falls_through() {
        let store = FaqStore::builtin();
        // Shares "kancha" and "ai" but misses "what"/"is": 2/4 < 0.7.
        assert!(store.lookup("tell me about kancha ai", LanguageMode::English).is_none());
        assert!(store.lookup("how do momos taste", LanguageMode::English).is_none());
    }

    #[test]
    fn empty_query_never_matches() {
        let store = FaqStore::builtin();
        assert!(store.lookup("", LanguageMode::English).is_none());
        assert!(store.lookup("?!", LanguageMode::English).is_none());
    }

    #[test]
    fn json_file_replaces_builtin_entries() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"question": "opening hours", "en": "We open at 9.",
                 "ne": "हामी ९ बजे खोल्छौं।", "np": "Hami 9 baje kholchhau."}}]"#
        )
        .unwrap();

        let store = FaqStore::load_from_file(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.lookup("what is kancha ai", LanguageMode::English).is_none());
        assert_eq!(
            store.lookup("your opening hours?", LanguageMode::English),
            Some("We open at 9.")
        );
    }
}
