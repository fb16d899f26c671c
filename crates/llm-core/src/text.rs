//! Text Heuristics
//!
//! Helpers that pick structure out of raw model output. They know nothing
//! about providers or conversations.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

static NUMBER_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\s*[:.]\s*").unwrap());
static DASH_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-\s+").unwrap());
static STAR_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\*\s+").unwrap());
static PLUS_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\+\s+").unwrap());
static HAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Han}").unwrap());

/// Words affirming a yes/no question
const YES_WORDS: [&str; 3] = ["yes", "true", "ja"];

/// Whitespace-separated tokens, empty ones dropped
pub fn tokens(response: &str) -> Vec<&str> {
    response.split([' ', '\n', '\t', '\r']).filter(|t| !t.is_empty()).collect()
}

/// First http(s) URL in the response, trailing punctuation trimmed
pub fn first_url(response: &str) -> Option<&str> {
    tokens(response)
        .into_iter()
        .find(|token| token.starts_with("https://") || token.starts_with("http://"))
        .map(|token| token.trim_end_matches([' ', '.', ',', '!', '?']))
}

/// Interpret a reply as yes/no by looking for an affirmative word on its first line.
///
/// Takes the whole prompt result so callers can write `yes_no(model.prompt(..).await)`.
pub fn yes_no(response: Result<String>) -> Result<bool> {
    let response = response?;
    let first_line = response.lines().next().unwrap_or_default().to_lowercase();
    Ok(YES_WORDS.iter().any(|word| first_line.contains(word)))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum ListStyle {
    Numbered,
    Dash,
    Star,
    Plus,
}

impl ListStyle {
    const ALL: [Self; 4] = [Self::Numbered, Self::Dash, Self::Star, Self::Plus];

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Numbered => &*NUMBER_ITEM,
            Self::Dash => &*DASH_ITEM,
            Self::Star => &*STAR_ITEM,
            Self::Plus => &*PLUS_ITEM,
        }
    }

    fn of_line(line: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.pattern().is_match(line))
    }

    /// Item text when `line` is an item of this style
    fn item(self, line: &str) -> Option<String> {
        let pattern = self.pattern();
        pattern
            .is_match(line)
            .then(|| pattern.replace(line, "").into_owned())
            .filter(|item| !item.is_empty())
    }
}

/// Most frequent list style; numbered lists win ties and empty input
fn predominant_style(lines: &[&str]) -> ListStyle {
    let mut counts: HashMap<ListStyle, usize> = HashMap::new();
    for style in lines.iter().filter_map(|line| ListStyle::of_line(line)) {
        *counts.entry(style).or_default() += 1;
    }

    let mut selected = ListStyle::Numbered;
    let mut selected_count = 0;
    for style in ListStyle::ALL {
        let count = counts.get(&style).copied().unwrap_or(0);
        if count > selected_count {
            selected = style;
            selected_count = count;
        }
    }
    selected
}

/// Extract list items from a reply.
///
/// Uses the predominant list style, drops case-insensitive duplicates and
/// items containing Han characters, and stops once more than two non-item
/// lines follow the list.
pub fn list_from_response(response: &str) -> Vec<String> {
    let lines: Vec<&str> = response.split('\n').collect();
    let style = predominant_style(&lines);

    let mut seen = HashSet::new();
    let mut items = Vec::new();
    let mut within_list = false;
    let mut outside_count = 0;

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(item) = style.item(line) {
            if HAN.is_match(&item) {
                continue;
            }

            within_list = true;
            outside_count = 0;

            if seen.insert(item.to_lowercase()) {
                items.push(item);
            }
        } else if within_list {
            outside_count += 1;
            if outside_count > 2 {
                break;
            }
        }
    }

    items
}

/// Body of the first fenced code block, or the input unchanged
pub fn extract_first_code_block(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.split('\n').collect();

    let mut start = None;
    let mut fence = "";
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        match start {
            None => {
                if let Some(found) = ["```", "~~~"].into_iter().find(|f| trimmed.starts_with(f)) {
                    fence = found;
                    start = Some(idx);
                }
            }
            Some(begin) if trimmed.starts_with(fence) => {
                return lines[begin + 1..idx].join("\n");
            }
            Some(_) => {}
        }
    }

    markdown.to_string()
}
