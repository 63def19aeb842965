//! Candidate name generation.
//!
//! [`NameGenerator`] is a closed set of strategies that each produce a batch
//! of unique candidates:
//!
//! - `Random` draws fixed-length names from `a-z . _`
//! - `Pattern` fills every `{random}` in a template with one 4-character token
//! - `Dictionary` joins an adjective and a noun, optionally with a number
//! - `Leet` rewrites a base word with leet substitutions
//! - `Remote` samples a wordlist fetched over HTTP
//!
//! The local strategies retry until they have `count` unique names or run out
//! of attempts (`count * 50`, `count * 100` for leet). Coming up short is not
//! an error; the result carries a warning instead.
//!
//! ```
//! use name_probe_lib::generate::PatternGenerator;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let generator = PatternGenerator::new("pro_{random}");
//! let mut rng = StdRng::seed_from_u64(7);
//! let result = generator.generate_with_rng(3, &mut rng);
//! assert_eq!(result.names.len(), 3);
//! assert!(result.names.iter().all(|n| n.starts_with("pro_") && n.len() == 8));
//! ```

use crate::error::ProbeError;
use crate::types::GenerationResult;
use crate::utils::dedupe_preserving_order;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tracing::warn;

/// Attempts allowed per requested name.
const ATTEMPTS_PER_NAME: usize = 50;

/// Leet output space is small, so it gets a bigger budget.
const LEET_ATTEMPTS_PER_NAME: usize = 100;

const RANDOM_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz._";
const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const TOKEN_LEN: usize = 4;
const PLACEHOLDER: &str = "{random}";

pub const DEFAULT_RANDOM_LENGTH: usize = 4;
pub const DEFAULT_PATTERN: &str = "user_{random}";

pub const ADJECTIVES: [&str; 22] = [
    "Cool", "Happy", "Red", "Blue", "Dark", "Light", "Fast", "Super", "Hyper", "Mega", "Ultra",
    "Neon", "Cyber", "Tech", "Pro", "Elite", "Master", "Shadow", "Ghost", "Iron", "Gold", "Silver",
];

pub const NOUNS: [&str; 22] = [
    "Tiger", "Bear", "Dragon", "Wolf", "Lion", "Eagle", "Shark", "Bot", "Droid", "Cyborg", "Ninja",
    "Samurai", "Knight", "Wizard", "Titan", "Ranger", "Pilot", "Gamer", "Coder", "Hacker", "Viper",
    "Cobra",
];

/// Leet variants for a lowercase character, if it has any.
fn leet_variants(c: char) -> Option<&'static [char]> {
    match c {
        'a' => Some(&['4', '@']),
        'e' => Some(&['3']),
        'i' => Some(&['1', '!']),
        'o' => Some(&['0']),
        's' => Some(&['5', '$']),
        't' => Some(&['7']),
        'l' => Some(&['1']),
        'b' => Some(&['8']),
        _ => None,
    }
}

// ── Strategy enum ───────────────────────────────────────────────────────────

/// Closed set of generation strategies.
#[derive(Debug, Clone)]
pub enum NameGenerator {
    Random(RandomCharGenerator),
    Pattern(PatternGenerator),
    Dictionary(DictionaryGenerator),
    Leet(LeetGenerator),
    Remote(RemoteListGenerator),
}

impl NameGenerator {
    /// Short identifiers accepted on the command line.
    pub const STRATEGIES: [&'static str; 5] = ["random", "pattern", "dictionary", "leet", "remote"];

    /// Produce up to `count` unique names.
    pub async fn generate(&self, count: usize) -> GenerationResult {
        let result = match self {
            NameGenerator::Remote(remote) => remote.generate(count).await,
            local => {
                let mut rng = StdRng::from_entropy();
                match local.generate_local(count, &mut rng) {
                    Some(result) => result,
                    None => GenerationResult {
                        requested: count,
                        ..Default::default()
                    },
                }
            }
        };

        if let Some(warning) = &result.warning {
            warn!(generator = %self.name(), "{}", warning);
        }
        result
    }

    /// Run a local strategy with the given RNG. Returns `None` for `Remote`.
    pub fn generate_local<R: Rng>(&self, count: usize, rng: &mut R) -> Option<GenerationResult> {
        match self {
            NameGenerator::Random(g) => Some(g.generate_with_rng(count, rng)),
            NameGenerator::Pattern(g) => Some(g.generate_with_rng(count, rng)),
            NameGenerator::Dictionary(g) => Some(g.generate_with_rng(count, rng)),
            NameGenerator::Leet(g) => Some(g.generate_with_rng(count, rng)),
            NameGenerator::Remote(_) => None,
        }
    }

    /// Friendly name of the strategy.
    pub fn name(&self) -> String {
        match self {
            NameGenerator::Random(_) => "Random Characters".to_string(),
            NameGenerator::Pattern(_) => "Pattern Based".to_string(),
            NameGenerator::Dictionary(_) => "Dictionary (Adjective + Noun)".to_string(),
            NameGenerator::Leet(g) => format!("Leet Speak ({})", g.base_word),
            NameGenerator::Remote(_) => "Remote Wordlist".to_string(),
        }
    }
}

impl From<RandomCharGenerator> for NameGenerator {
    fn from(g: RandomCharGenerator) -> Self {
        NameGenerator::Random(g)
    }
}

impl From<PatternGenerator> for NameGenerator {
    fn from(g: PatternGenerator) -> Self {
        NameGenerator::Pattern(g)
    }
}

impl From<DictionaryGenerator> for NameGenerator {
    fn from(g: DictionaryGenerator) -> Self {
        NameGenerator::Dictionary(g)
    }
}

impl From<LeetGenerator> for NameGenerator {
    fn from(g: LeetGenerator) -> Self {
        NameGenerator::Leet(g)
    }
}

impl From<RemoteListGenerator> for NameGenerator {
    fn from(g: RemoteListGenerator) -> Self {
        NameGenerator::Remote(g)
    }
}

/// Draw until `count` unique names are collected or the budget runs out.
///
/// `draw` returns `None` for a rejected draw. The seen-set lives only for
/// this call.
fn collect_unique<F>(count: usize, budget: usize, mut draw: F) -> GenerationResult
where
    F: FnMut() -> Option<String>,
{
    let mut seen = HashSet::with_capacity(count);
    let mut names = Vec::with_capacity(count);
    let mut attempts = 0;

    while names.len() < count && attempts < budget {
        attempts += 1;
        let Some(name) = draw() else { continue };
        if seen.insert(name.clone()) {
            names.push(name);
        }
    }

    let warning = if names.len() < count {
        Some(format!(
            "Could only generate {} of {} unique names (pool exhausted?)",
            names.len(),
            count
        ))
    } else {
        None
    };

    GenerationResult {
        names,
        requested: count,
        warning,
    }
}

fn draw_from<R: Rng>(alphabet: &[u8], len: usize, rng: &mut R) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

// ── Random characters ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RandomCharGenerator {
    pub length: usize,
}

impl Default for RandomCharGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_RANDOM_LENGTH,
        }
    }
}

impl RandomCharGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn generate_with_rng<R: Rng>(&self, count: usize, rng: &mut R) -> GenerationResult {
        collect_unique(count, count * ATTEMPTS_PER_NAME, || {
            let name = draw_from(RANDOM_ALPHABET, self.length, rng);
            is_acceptable_random(&name).then_some(name)
        })
    }
}

/// Reject repeated separators and leading/trailing dots.
pub fn is_acceptable_random(name: &str) -> bool {
    !(name.contains("..") || name.contains("__") || name.starts_with('.') || name.ends_with('.'))
}

// ── Pattern ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PatternGenerator {
    pub template: String,
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN)
    }
}

impl PatternGenerator {
    pub fn new<T: Into<String>>(template: T) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn generate_with_rng<R: Rng>(&self, count: usize, rng: &mut R) -> GenerationResult {
        collect_unique(count, count * ATTEMPTS_PER_NAME, || {
            let token = draw_from(TOKEN_ALPHABET, TOKEN_LEN, rng);
            Some(self.template.replace(PLACEHOLDER, &token))
        })
    }
}

// ── Dictionary ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DictionaryGenerator {
    pub add_numbers: bool,
}

impl DictionaryGenerator {
    pub fn new(add_numbers: bool) -> Self {
        Self { add_numbers }
    }

    pub fn generate_with_rng<R: Rng>(&self, count: usize, rng: &mut R) -> GenerationResult {
        collect_unique(count, count * ATTEMPTS_PER_NAME, || {
            let adjective = ADJECTIVES.choose(rng)?;
            let noun = NOUNS.choose(rng)?;
            let mut name = format!("{}{}", adjective, noun);
            if self.add_numbers {
                name.push_str(&rng.gen_range(0..=999u32).to_string());
            }
            Some(name.to_lowercase())
        })
    }
}

// ── Leet ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LeetGenerator {
    pub base_word: String,
}

impl LeetGenerator {
    /// Chance that a substitutable character is replaced.
    pub const SUBSTITUTION_PROBABILITY: f64 = 0.7;

    pub fn new<W: Into<String>>(base_word: W) -> Self {
        Self {
            base_word: base_word.into(),
        }
    }

    pub fn generate_with_rng<R: Rng>(&self, count: usize, rng: &mut R) -> GenerationResult {
        let base = self.base_word.to_lowercase();
        collect_unique(count, count * LEET_ATTEMPTS_PER_NAME, || {
            let name = base
                .chars()
                .map(|c| match leet_variants(c) {
                    Some(variants) if rng.gen_bool(Self::SUBSTITUTION_PROBABILITY) => {
                        variants[rng.gen_range(0..variants.len())]
                    }
                    _ => c,
                })
                .collect();
            Some(name)
        })
    }
}

// ── Remote wordlist ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RemoteListGenerator {
    pub url: String,
    pub timeout: Duration,
}

impl RemoteListGenerator {
    pub fn new<U: Into<String>>(url: U) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the list, shuffle it, and keep the first `count` entries.
    pub async fn generate(&self, count: usize) -> GenerationResult {
        match self.fetch().await {
            Ok(text) => {
                let mut rng = StdRng::from_entropy();
                sample_word_list(&text, count, &mut rng)
            }
            Err(e) => GenerationResult {
                names: Vec::new(),
                requested: count,
                warning: Some(e.to_string()),
            },
        }
    }

    async fn fetch(&self) -> Result<String, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ProbeError::remote_list(&self.url, e.to_string()))?;

        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProbeError::remote_list(&self.url, e.to_string()))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(ProbeError::remote_list(
                &self.url,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| ProbeError::remote_list(&self.url, e.to_string()))
    }
}

/// Parse, dedupe, shuffle and truncate a fetched wordlist.
pub fn sample_word_list<R: Rng>(text: &str, count: usize, rng: &mut R) -> GenerationResult {
    let mut names = dedupe_preserving_order(parse_word_list(text));
    names.shuffle(rng);
    names.truncate(count);

    let warning = if names.len() < count {
        Some(format!(
            "Wordlist only provided {} of {} requested names",
            names.len(),
            count
        ))
    } else {
        None
    };

    GenerationResult {
        names,
        requested: count,
        warning,
    }
}

/// Read a wordlist as a list literal, or as plain lines if that fails.
///
/// List literals may be JSON arrays or bracketed lists of single- or
/// double-quoted strings and bare numbers.
pub fn parse_word_list(text: &str) -> Vec<String> {
    if let Some(items) = parse_list_literal(text) {
        return items;
    }

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn parse_list_literal(text: &str) -> Option<Vec<String>> {
    let trimmed = text.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return None;
    }

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        );
    }

    parse_quoted_list(&trimmed[1..trimmed.len() - 1])
}

/// Tokenize the inside of `[...]` where items are quoted with `'` or `"`.
fn parse_quoted_list(inner: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }

        let Some(&first) = chars.peek() else { break };

        if first == '\'' || first == '"' {
            chars.next();
            let mut item = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next()? {
                        'n' => item.push('\n'),
                        't' => item.push('\t'),
                        escaped => item.push(escaped),
                    },
                    c if c == first => {
                        closed = true;
                        break;
                    }
                    c => item.push(c),
                }
            }
            if !closed {
                return None;
            }
            items.push(item);
        } else {
            let mut token = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' || c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
            if token.parse::<f64>().is_err() {
                return None;
            }
            items.push(token);
        }

        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return None,
        }
    }

    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn assert_unique(names: &[String]) {
        let set: HashSet<&String> = names.iter().collect();
        assert_eq!(set.len(), names.len(), "duplicates in {:?}", names);
    }

    // ── Random ──────────────────────────────────────────────────────

    #[test]
    fn test_random_names_are_well_formed() {
        let result = RandomCharGenerator::new(6).generate_with_rng(200, &mut rng());
        assert_eq!(result.names.len(), 200);
        assert!(result.warning.is_none());
        assert_unique(&result.names);

        for name in &result.names {
            assert_eq!(name.len(), 6);
            assert!(!name.contains(".."));
            assert!(!name.contains("__"));
            assert!(!name.starts_with('.'));
            assert!(!name.ends_with('.'));
            assert!(name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '.' || c == '_'));
        }
    }

    #[test]
    fn test_random_exhaustion_warns() {
        // Length 1 has only 27 acceptable names ('.' alone is rejected).
        let result = RandomCharGenerator::new(1).generate_with_rng(40, &mut rng());
        assert!(result.names.len() <= 27);
        assert!(result.warning.is_some());
        assert!(!result.is_complete());
        assert_unique(&result.names);
    }

    #[test]
    fn test_acceptable_random_rules() {
        assert!(is_acceptable_random("ab_c"));
        assert!(is_acceptable_random("a.b_"));
        assert!(!is_acceptable_random(".abc"));
        assert!(!is_acceptable_random("abc."));
        assert!(!is_acceptable_random("a..b"));
        assert!(!is_acceptable_random("a__b"));
    }

    // ── Pattern ─────────────────────────────────────────────────────

    #[test]
    fn test_pattern_substitutes_single_token() {
        let result = PatternGenerator::default().generate_with_rng(100, &mut rng());
        assert_eq!(result.names.len(), 100);
        assert_unique(&result.names);

        for name in &result.names {
            let token = name.strip_prefix("user_").unwrap();
            assert_eq!(token.len(), 4);
            assert!(token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_pattern_repeats_same_token() {
        let result = PatternGenerator::new("{random}-{random}").generate_with_rng(10, &mut rng());
        for name in &result.names {
            let (left, right) = name.split_once('-').unwrap();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn test_pattern_without_placeholder_yields_one() {
        let result = PatternGenerator::new("fixed").generate_with_rng(5, &mut rng());
        assert_eq!(result.names, vec!["fixed".to_string()]);
        assert!(result.warning.is_some());
    }

    // ── Dictionary ──────────────────────────────────────────────────

    fn split_dictionary_name(name: &str) -> Option<(&'static str, &'static str, &str)> {
        for adjective in ADJECTIVES {
            let adjective_lower = adjective.to_lowercase();
            if let Some(rest) = name.strip_prefix(adjective_lower.as_str()) {
                for noun in NOUNS {
                    let noun_lower = noun.to_lowercase();
                    if let Some(suffix) = rest.strip_prefix(noun_lower.as_str()) {
                        return Some((adjective, noun, suffix));
                    }
                }
            }
        }
        None
    }

    #[test]
    fn test_dictionary_names_compose_word_lists() {
        let result = DictionaryGenerator::new(false).generate_with_rng(50, &mut rng());
        assert_eq!(result.names.len(), 50);
        assert_unique(&result.names);

        for name in &result.names {
            assert_eq!(name, &name.to_lowercase());
            let (_, _, suffix) = split_dictionary_name(name).expect("adjective + noun");
            assert!(suffix.is_empty());
        }
    }

    #[test]
    fn test_dictionary_numbers_in_range() {
        let result = DictionaryGenerator::new(true).generate_with_rng(100, &mut rng());
        assert_unique(&result.names);

        for name in &result.names {
            let (_, _, suffix) = split_dictionary_name(name).expect("adjective + noun");
            let number: u32 = suffix.parse().expect("numeric suffix");
            assert!(number <= 999);
        }
    }

    #[test]
    fn test_dictionary_exhausts_at_484() {
        let result = DictionaryGenerator::new(false).generate_with_rng(500, &mut rng());
        assert!(result.names.len() <= ADJECTIVES.len() * NOUNS.len());
        assert!(result.warning.is_some());
        assert_unique(&result.names);
    }

    // ── Leet ────────────────────────────────────────────────────────

    #[test]
    fn test_leet_variants_keep_shape() {
        let result = LeetGenerator::new("Viper").generate_with_rng(4, &mut rng());
        assert_unique(&result.names);

        for name in &result.names {
            assert_eq!(name.chars().count(), 5);
            let chars: Vec<char> = name.chars().collect();
            assert_eq!(chars[0], 'v');
            assert!(matches!(chars[1], 'i' | '1' | '!'));
            assert_eq!(chars[2], 'p');
            assert!(matches!(chars[3], 'e' | '3'));
            assert_eq!(chars[4], 'r');
        }
    }

    #[test]
    fn test_leet_without_substitutions_exhausts() {
        let result = LeetGenerator::new("xyz").generate_with_rng(3, &mut rng());
        assert_eq!(result.names, vec!["xyz".to_string()]);
        assert!(result.warning.is_some());
    }

    #[test]
    fn test_generator_names() {
        assert_eq!(
            NameGenerator::from(RandomCharGenerator::default()).name(),
            "Random Characters"
        );
        assert_eq!(
            NameGenerator::from(PatternGenerator::default()).name(),
            "Pattern Based"
        );
        assert_eq!(
            NameGenerator::from(DictionaryGenerator::default()).name(),
            "Dictionary (Adjective + Noun)"
        );
        assert_eq!(
            NameGenerator::from(LeetGenerator::new("viper")).name(),
            "Leet Speak (viper)"
        );
        assert_eq!(
            NameGenerator::from(RemoteListGenerator::new("https://x")).name(),
            "Remote Wordlist"
        );
    }

    #[tokio::test]
    async fn test_async_generate_for_local_strategy() {
        let generator = NameGenerator::from(RandomCharGenerator::new(5));
        let result = generator.generate(10).await;
        assert_eq!(result.requested, 10);
        assert_eq!(result.names.len(), 10);
        assert_unique(&result.names);
    }

    // ── Wordlists ───────────────────────────────────────────────────

    #[test]
    fn test_parse_json_array() {
        let names = parse_word_list(r#"["alpha", "beta", 7]"#);
        assert_eq!(names, vec!["alpha", "beta", "7"]);
    }

    #[test]
    fn test_parse_single_quoted_list() {
        let names = parse_word_list("['alpha', \"beta\", 'it\\'s',\n 'gamma',]");
        assert_eq!(names, vec!["alpha", "beta", "it's", "gamma"]);
    }

    #[test]
    fn test_parse_falls_back_to_lines() {
        let names = parse_word_list("alpha\n\n  beta  \r\ngamma\n");
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);

        let names = parse_word_list("[broken 'list'\nsecond");
        assert_eq!(names, vec!["[broken 'list'", "second"]);
    }

    #[test]
    fn test_parse_rejects_unterminated_quote() {
        assert!(parse_quoted_list("'open, 'b'").is_none());
        assert!(parse_quoted_list("bare").is_none());
        assert_eq!(parse_quoted_list("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_sample_word_list_truncates() {
        let result = sample_word_list("a\nb\nc\nd\ne", 3, &mut rng());
        assert_eq!(result.names.len(), 3);
        assert!(result.warning.is_none());
        for name in &result.names {
            assert!(["a", "b", "c", "d", "e"].contains(&name.as_str()));
        }

        let short = sample_word_list("a\nb", 5, &mut rng());
        assert_eq!(short.names.len(), 2);
        assert!(short.warning.is_some());
    }

    #[test]
    fn test_sample_word_list_drops_repeats() {
        let result = sample_word_list("dup\ndup\ndup\nother", 4, &mut rng());
        let mut names = result.names.clone();
        names.sort();
        assert_eq!(names, vec!["dup", "other"]);
        assert!(result.warning.is_some());

        let result = sample_word_list(r#"["x", "y", "x", "z"]"#, 3, &mut rng());
        let unique: HashSet<&String> = result.names.iter().collect();
        assert_eq!(result.names.len(), 3);
        assert_eq!(unique.len(), 3);
    }

    #[tokio::test]
    async fn test_remote_fetch_failure_is_empty_with_warning() {
        let generator = RemoteListGenerator::new("http://127.0.0.1:9/wordlist.txt")
            .with_timeout(Duration::from_secs(2));
        let result = generator.generate(5).await;
        assert!(result.names.is_empty());
        assert!(result.warning.is_some());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_remote_fetch_real_wordlist() {
        let generator = RemoteListGenerator::new(
            "https://raw.githubusercontent.com/dwyl/english-words/master/words_alpha.txt",
        );
        let result = generator.generate(20).await;
        assert_eq!(result.names.len(), 20);
        assert!(result.warning.is_none());
    }
}
