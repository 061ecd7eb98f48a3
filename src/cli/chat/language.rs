use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Language register detected for a single user message.
///
/// Exactly one mode is assigned per message. Script detection strictly
/// dominates lexical detection: a single Devanagari code point anywhere in
/// the message forces `Devanagari` regardless of accompanying Romanized
/// words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMode {
    /// Plain English (also the fallback for digits-only or
    /// punctuation-only input).
    English,
    /// Romanized Nepali, possibly mixed with English ("Nepglish").
    Nepglish,
    /// Nepali written natively in the Devanagari script.
    Devanagari,
}

impl LanguageMode {
    /// Short lowercase tag used in the transcript display.
    pub fn tag(&self) -> &'static str {
        match self {
            LanguageMode::English => "english",
            LanguageMode::Nepglish => "nepglish",
            LanguageMode::Devanagari => "devanagari",
        }
    }
}

impl fmt::Display for LanguageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returns true if the character falls in the Devanagari Unicode block
/// (U+0900..=U+097F), which covers natively written Nepali including the
/// Devanagari digits.
pub fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Common Romanized-Nepali words and particles.
///
/// Curated to tokens that do not double as everyday English (or other
/// Latin-script) words, so that whole-token matching stays precise: bare
/// particles like "ma", "ra" or "ko" are left out on purpose, as are
/// collisions such as "tara" (a name) and "hola" (Spanish).
const BUILTIN_WORDS: &[&str] = &[
    // greetings and courtesy
    "namaste", "namaskar", "dhanyabad", "swagat", "sanchai", "sancho",
    // question words
    "kasto", "kasari", "kina", "kahile", "kaha", "kahan", "kun", "kati",
    // demonstratives and comparison
    "yesto", "tyesto", "jasto", "jastai",
    // pronouns and possessives
    "timi", "timro", "timilai", "tapai", "tapain", "tapaiko", "hajur",
    "mero", "malai", "hamro", "hamilai", "aafno", "usko", "unko",
    // copulas and auxiliaries
    "cha", "chha", "chhan", "chaina", "chhaina", "chu", "chhu", "chhau",
    "xa", "xaina", "hunxa", "huncha", "hunchha", "hunuhunchha",
    "hoina", "haina", "thiyo",
    // common verbs
    "bhayo", "bhaneko", "bhanne", "bhanna", "garne", "garna", "gareko",
    "garchha", "garchhu", "garnus", "garnuhos", "sakchu", "sakchha",
    "sakinchha", "paryo", "parcha", "parchha", "lagyo", "lagcha",
    "khana", "khane", "khayau", "khanus", "herne", "hernus",
    "basnus", "aaunus", "jaanus", "parkha", "parkhanus",
    // adjectives and adverbs
    "ramro", "naramro", "ramailo", "mitho", "dherai", "ekdam", "alikati",
    "naya", "purano", "sano", "thulo", "sajilo", "chito", "bistarai",
    // everyday nouns
    "ghar", "gaun", "sathi", "saathi", "didi", "bahini", "keta", "keti",
    "manche", "manchhe", "kaam", "khusi", "dukha", "thaha",
    // time words
    "aja", "bholi", "ahile", "aile", "bihana", "beluka", "raati",
    "pachi", "agadi", "ekchin", "aba",
    // connectives and particles
    "ani", "pani", "euta", "duita",
];

/// The fixed reference list of Romanized-Nepali tokens, modeled as an
/// explicit configuration artifact rather than inlined logic.
///
/// A built-in list ships with the binary; `load_default` additionally reads
/// `<config dir>/kancha/nepali_words.txt` (one token per line, `#` starts a
/// comment) so the list can be extended without recompiling. No learning or
/// frequency adaptation occurs at runtime.
pub struct NepaliLexicon {
    tokens: HashSet<String>,
}

impl NepaliLexicon {
    /// Lexicon containing only the built-in word list.
    pub fn builtin() -> Self {
        let tokens = BUILTIN_WORDS.iter().map(|w| w.to_string()).collect();
        Self { tokens }
    }

    /// Built-in lexicon extended with the user's word file, if present.
    ///
    /// A missing file is normal; an unreadable one is logged and skipped so
    /// that startup never fails on lexicon configuration.
    pub fn load_default() -> Self {
        let mut lexicon = Self::builtin();

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("kancha").join("nepali_words.txt");
            if path.is_file() {
                match lexicon.extend_from_file(&path) {
                    Ok(added) => {
                        debug!("Loaded {} extra lexicon tokens from {}", added, path.display());
                    }
                    Err(e) => {
                        warn!("Could not read lexicon file {}: {}", path.display(), e);
                    }
                }
            }
        }

        lexicon
    }

    /// Add tokens from a word file, one per line. Blank lines and lines
    /// starting with `#` are ignored; tokens are lowercased on the way in.
    ///
    /// Returns the number of tokens that were not already present.
    pub fn extend_from_file(&mut self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let mut added = 0;

        for line in content.lines() {
            let token = line.trim();
            if token.is_empty() || token.starts_with('#') {
                continue;
            }
            if self.tokens.insert(token.to_lowercase()) {
                added += 1;
            }
        }

        Ok(added)
    }

    /// Number of tokens in the lexicon.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether a single lowercased token is a known Romanized-Nepali word.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Classify one message into exactly one language mode.
    ///
    /// Total over any string input, deterministic, and never fails:
    ///
    /// 1. any code point in the Devanagari block wins outright;
    /// 2. otherwise a known Romanized-Nepali token (case-insensitive,
    ///    whole-token match over alphanumeric word splits) means Nepglish;
    /// 3. otherwise English.
    pub fn classify(&self, text: &str) -> LanguageMode {
        if text.chars().any(is_devanagari) {
            return LanguageMode::Devanagari;
        }

        let lowered = text.to_lowercase();
        let mut words = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty());

        if words.any(|w| self.contains(w)) {
            return LanguageMode::Nepglish;
        }

        LanguageMode::English
    }
}
