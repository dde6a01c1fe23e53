//! Domain concept detection
//!
//! A domain concept is a Title Case word or compound (`Order`,
//! `Payment Gateway`) that recurs across the input. Counting happens over all
//! documents before any concept is attributed to a section, so a term used
//! once in each of two files still qualifies.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

static RE_WORD: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9]*").ok());
static RE_INLINE_CODE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"`[^`]*`").ok());

/// Capitalized words that never name a domain concept
pub const STOP_WORDS: &[&str] = &[
    "A", "About", "Acceptance", "After", "All", "Also", "An", "And", "Any", "Api", "As", "At",
    "Background", "Be", "Before", "But", "By", "Can", "Criteria", "Description", "Each",
    "Endpoint", "Endpoints", "Every", "Example", "Examples", "For", "From", "Given", "Goal",
    "Goals", "How", "I", "If", "In", "Is", "It", "Its", "May", "Must", "No", "Non", "Not",
    "Note", "Notes", "Of", "On", "Once", "Or", "Our", "Out", "Overview", "Requirement",
    "Requirements", "Scenario", "Scenarios", "Scope", "Should", "So", "Some", "Stories",
    "Story", "Summary", "That", "The", "Their", "Then", "There", "These", "They", "This",
    "Those", "To", "Use", "Uses", "We", "What", "When", "Where", "Which", "While", "Will",
    "With", "Without", "You", "Your",
];

/// A capitalized word or compound found on a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub term: String,
    /// Opens a sentence (only meaningful for single words)
    pub sentence_initial: bool,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: usize,
    mid_sentence: usize,
    compound: bool,
}

/// Counts capitalized terms across lines and decides which qualify
#[derive(Debug, Default)]
pub struct ConceptDetector {
    tallies: BTreeMap<String, Tally>,
}

impl ConceptDetector {
    /// Create an empty detector
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a line, record its terms and return them in line order.
    ///
    /// Heading lines are labels rather than sentences, so none of their words
    /// count as sentence-initial.
    pub fn observe_line(&mut self, line: &str, is_heading: bool) -> Vec<Candidate> {
        let found = scan_line(line, is_heading);
        for candidate in &found {
            let tally = self.tallies.entry(candidate.term.clone()).or_default();
            tally.total += 1;
            if !candidate.sentence_initial {
                tally.mid_sentence += 1;
            }
            tally.compound = candidate.term.contains(' ');
        }
        found
    }

    /// Whether a term recurs enough to be a concept
    #[must_use]
    pub fn qualifies(&self, term: &str) -> bool {
        self.tallies.get(term).is_some_and(|tally| {
            tally.total >= 2 && (tally.compound || tally.mid_sentence > 0)
        })
    }

    /// All qualifying concepts
    #[must_use]
    pub fn concepts(&self) -> BTreeSet<String> {
        self.tallies
            .keys()
            .filter(|term| self.qualifies(term))
            .cloned()
            .collect()
    }
}

/// Whether a term is excluded outright
#[inline]
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

fn is_capitalized(word: &str) -> bool {
    let Some(first) = word.chars().next() else {
        return false;
    };
    if !first.is_ascii_uppercase() {
        return false;
    }
    // all-caps tokens are acronyms or HTTP verbs
    word.len() == 1 || word.chars().any(|c| c.is_ascii_lowercase())
}

fn scan_line(line: &str, is_heading: bool) -> Vec<Candidate> {
    let Some(word_re) = RE_WORD.as_ref() else {
        return Vec::new();
    };
    let text = match RE_INLINE_CODE.as_ref() {
        Some(re) => re.replace_all(line, " ").into_owned(),
        None => line.to_string(),
    };

    let mut found = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut prev_end: Option<usize> = None;

    for m in word_re.find_iter(&text) {
        let word = m.as_str();
        let gap = &text[prev_end.unwrap_or(0)..m.start()];
        let adjacent = prev_end.is_some() && gap == " ";
        let sentence_initial = !is_heading
            && match prev_end {
                None => !gap.chars().any(char::is_alphabetic),
                Some(_) => gap.contains(['.', '!', '?', ':']),
            };
        prev_end = Some(m.end());

        if !is_capitalized(word) {
            flush_run(&mut run, &mut found);
            continue;
        }
        if !adjacent {
            flush_run(&mut run, &mut found);
        }
        run.push(word);
        if !is_stop_word(word) {
            found.push(Candidate {
                term: word.to_string(),
                sentence_initial,
            });
        }
    }
    flush_run(&mut run, &mut found);
    found
}

fn flush_run(run: &mut Vec<&str>, found: &mut Vec<Candidate>) {
    let start = run.iter().position(|w| !is_stop_word(w));
    let end = run.iter().rposition(|w| !is_stop_word(w));
    if let (Some(start), Some(end)) = (start, end) {
        if end > start {
            found.push(Candidate {
                term: run[start..=end].join(" "),
                sentence_initial: false,
            });
        }
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(line: &str) -> Vec<String> {
        scan_line(line, false).into_iter().map(|c| c.term).collect()
    }

    #[test]
    fn stop_words_are_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn compounds_and_single_words_are_both_reported() {
        assert_eq!(
            terms("Every Payment Gateway call is logged"),
            vec!["Payment", "Gateway", "Payment Gateway"]
        );
    }

    #[test]
    fn acronyms_and_inline_code_are_skipped() {
        assert_eq!(terms("call `Order` via GET on the API with Basket"), vec!["Basket"]);
    }

    #[test]
    fn sentence_initial_words_are_flagged() {
        let found = scan_line("Users sign in. Orders are kept for the Customer", false);
        let initial: Vec<_> = found
            .iter()
            .filter(|c| c.sentence_initial)
            .map(|c| c.term.as_str())
            .collect();
        assert_eq!(initial, vec!["Users", "Orders"]);
    }

    #[test]
    fn heading_words_are_never_sentence_initial() {
        let found = scan_line("## User Registration", true);
        assert!(found.iter().all(|c| !c.sentence_initial));
    }

    #[test]
    fn qualification_needs_repetition_and_a_mid_sentence_use() {
        let mut detector = ConceptDetector::new();
        detector.observe_line("Orders are kept.", false);
        detector.observe_line("Orders expire.", false);
        detector.observe_line("A Customer places it and the Customer pays", false);
        detector.observe_line("Invoice once", false);

        assert!(!detector.qualifies("Orders"));
        assert!(detector.qualifies("Customer"));
        assert!(!detector.qualifies("Invoice"));
        assert_eq!(detector.concepts(), BTreeSet::from(["Customer".to_string()]));
    }
}
