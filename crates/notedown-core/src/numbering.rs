//! Hierarchical section counters and anchor slugs.

use std::collections::{HashMap, HashSet};
use std::fmt;

pub const MAX_HEADING_LEVEL: u8 = 6;

/// One counter slot per heading level, reset to zero at the start of every render pass.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CounterState([u32; MAX_HEADING_LEVEL as usize]);

impl CounterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bumps the slot for `level` (1-based), zeroes every deeper slot and returns the
    /// dotted counter. Skipped levels keep their zero, so `h1` then `h3` yields `1.0.1`.
    pub fn advance(&mut self, level: u8) -> String {
        let idx = usize::from(level.clamp(1, MAX_HEADING_LEVEL)) - 1;
        self.0[idx] += 1;
        for slot in &mut self.0[idx + 1..] {
            *slot = 0;
        }
        self.to_string()
    }

    pub fn reset(&mut self) {
        self.0 = [0; MAX_HEADING_LEVEL as usize];
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|slot| *slot == 0)
    }
}

impl fmt::Display for CounterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(last) = self.0.iter().rposition(|slot| *slot != 0) else {
            return Ok(());
        };
        for (idx, slot) in self.0[..=last].iter().enumerate() {
            if idx > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", slot)?;
        }
        Ok(())
    }
}

/// Lowercases `title` and collapses every run of non-word characters into one `-`.
/// Word characters are `[A-Za-z0-9_]`; leading and trailing separators are kept.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_separator = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
            in_separator = false;
        } else if !in_separator {
            out.push('-');
            in_separator = true;
        }
    }
    out
}

/// Derives anchor slugs for headings. Implementations may keep per-pass state;
/// `reset` is called at the start of every render pass.
pub trait Slugger: fmt::Debug {
    fn slug(&mut self, title: &str) -> String;

    fn reset(&mut self) {}
}

/// Plain [`slugify`] with no collision handling.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiteralSlugger;

impl Slugger for LiteralSlugger {
    fn slug(&mut self, title: &str) -> String {
        slugify(title)
    }
}

/// [`slugify`] with `-1`, `-2`, ... suffixes for repeats within one pass.
#[derive(Clone, Debug, Default)]
pub struct UniqueSlugger {
    repeats: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl UniqueSlugger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Slugger for UniqueSlugger {
    fn slug(&mut self, title: &str) -> String {
        let base = slugify(title);
        let mut n = self.repeats.get(&base).copied().unwrap_or(0);
        let mut candidate = base.clone();
        while self.issued.contains(&candidate) {
            n += 1;
            candidate = format!("{}-{}", base, n);
        }
        self.repeats.insert(base, n);
        self.issued.insert(candidate.clone());
        candidate
    }

    fn reset(&mut self) {
        self.repeats.clear();
        self.issued.clear();
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{CounterState, LiteralSlugger, Slugger, UniqueSlugger, slugify};

    fn counters(levels: &[u8]) -> Vec<String> {
        let mut state = CounterState::new();
        levels.iter().map(|level| state.advance(*level)).collect()
    }

    #[rstest]
    #[case(&[1, 2, 2, 1, 3], &["1", "1.1", "1.2", "2", "2.0.1"])]
    #[case(&[1, 3], &["1", "1.0.1"])]
    #[case(&[2, 2, 1], &["0.1", "0.2", "1"])]
    #[case(&[1, 2, 3, 4, 5, 6, 1], &["1", "1.1", "1.1.1", "1.1.1.1", "1.1.1.1.1", "1.1.1.1.1.1", "2"])]
    #[case(&[1, 2, 3, 2], &["1", "1.1", "1.1.1", "1.2"])]
    fn counters_follow_outline_numbering(#[case] levels: &[u8], #[case] expected: &[&str]) {
        assert_eq!(counters(levels), expected);
    }

    #[test]
    fn out_of_range_levels_are_clamped() {
        let mut state = CounterState::new();
        assert_eq!(state.advance(0), "1");
        assert_eq!(state.advance(9), "1.0.0.0.0.1");
    }

    #[test]
    fn reset_clears_every_slot() {
        let mut state = CounterState::new();
        state.advance(2);
        state.reset();
        assert!(state.is_zero());
        assert_eq!(state.to_string(), "");
    }

    #[rstest]
    #[case("Hello World", "hello-world")]
    #[case("What's new?", "what-s-new-")]
    #[case("  Intro  ", "-intro-")]
    #[case("snake_case stays", "snake_case-stays")]
    #[case("Über Größe", "-ber-gr-e")]
    fn slugs_collapse_non_word_runs(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify(title), expected);
    }

    #[test]
    fn unique_slugger_suffixes_repeats() {
        let mut slugger = UniqueSlugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-1");
        assert_eq!(slugger.slug("Setup 1"), "setup-1-1");
        assert_eq!(slugger.slug("setup"), "setup-2");

        slugger.reset();
        assert_eq!(slugger.slug("Setup"), "setup");
    }

    #[test]
    fn literal_slugger_allows_repeats() {
        let mut slugger = LiteralSlugger;
        assert_eq!(slugger.slug("A"), slugger.slug("A"));
    }
}
