//! Best-effort normalization of generator output into the flowchart subset
//! described in [`crate::rules::RULES`].
//!
//! This is not a parser. It applies a fixed set of line rewrites whose
//! output is a fixed point of the same rewrites, so `normalize` can be
//! applied any number of times.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::DiagramDefinition;

/// Header used when the input does not start with one.
pub const DEFAULT_HEADER: &str = "graph TD;";

const FENCE: &str = "```";

/// Substrings that mark a line as an edge statement.
const ADJACENCY_TOKENS: &[&str] = &["-->", "---", "-.-", "==>", "==="];

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(graph|flowchart)(\s|;|$)").expect("valid header regex"));

static NODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9_]+)\s*\[(.*)\]\s*;*$").expect("valid node regex")
});

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]+").expect("valid identifier regex"));

static DISALLOWED_LABEL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,:!?'/+-]").expect("valid label filter regex"));

/// Normalize arbitrary candidate text into a [`DiagramDefinition`].
///
/// Never fails. The result always starts with a header line, contains no
/// blank lines and ends with a newline.
pub fn normalize(raw: &str) -> DiagramDefinition {
    let mut lines = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(FENCE))
        .peekable();

    let header = match lines.peek() {
        Some(first) if HEADER.is_match(first) => {
            let header = terminate_header(first);
            lines.next();
            header
        }
        _ => DEFAULT_HEADER.to_string(),
    };

    let body: Vec<&str> = lines.collect();
    let taken = identifiers_in(&body);

    let mut out = String::with_capacity(raw.len() + DEFAULT_HEADER.len() + 1);
    out.push_str(&header);
    out.push('\n');

    let mut next_id = 1usize;
    for line in body {
        let statement = if is_edge(line) {
            Some(sanitize_edge(line))
        } else if let Some(caps) = NODE.captures(line) {
            let id = &caps[1];
            let label = clean_label(&caps[2]);
            Some(if label.is_empty() {
                format!("{id}[{id}]")
            } else {
                format!("{id}[{label}]")
            })
        } else {
            let label = clean_label(line);
            if label.is_empty() {
                None
            } else {
                let id = fresh_id(&mut next_id, &taken);
                Some(format!("{id}[{label}]"))
            }
        };

        if let Some(statement) = statement {
            out.push_str(&statement);
            out.push('\n');
        }
    }

    DiagramDefinition::from_normalized(out)
}

/// Whether `line` is a header declaration such as `graph TD` or `flowchart LR;`.
pub fn is_header(line: &str) -> bool {
    HEADER.is_match(line.trim())
}

fn is_edge(line: &str) -> bool {
    ADJACENCY_TOKENS.iter().any(|token| line.contains(token))
}

/// Every identifier a statement line may refer to. Edge lines contribute all
/// of their word tokens, so the set can be larger than the real node set.
fn identifiers_in<'a>(lines: &[&'a str]) -> HashSet<&'a str> {
    let mut ids = HashSet::new();
    for &line in lines {
        if is_edge(line) {
            ids.extend(IDENTIFIER.find_iter(line).map(|m| m.as_str()));
        } else if let Some(id) = NODE.captures(line).and_then(|caps| caps.get(1)) {
            ids.insert(id.as_str());
        }
    }
    ids
}

/// Next `nodeN` identifier not already used in the definition.
fn fresh_id(next: &mut usize, taken: &HashSet<&str>) -> String {
    loop {
        let id = format!("node{next}");
        *next += 1;
        if !taken.contains(id.as_str()) {
            return id;
        }
    }
}

fn terminate_header(line: &str) -> String {
    let mut header = line.trim_end_matches(';').trim_end().to_string();
    header.push(';');
    header
}

/// Quotes become apostrophes and decision braces become rectangle brackets.
fn sanitize_edge(line: &str) -> String {
    line.chars()
        .map(|c| match c {
            '"' => '\'',
            '{' => '[',
            '}' => ']',
            other => other,
        })
        .collect()
}

fn clean_label(label: &str) -> String {
    let filtered = DISALLOWED_LABEL_CHARS.replace_all(label, "");
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
