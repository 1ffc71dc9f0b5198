//! Locating a hunk's old block in the target.

use crate::patch::errors::NearMiss;
use std::borrow::Cow;
use strsim::normalized_levenshtein;

/// Lines either side of the expected position searched for a near miss.
const NEAR_MISS_RADIUS: usize = 100;

/// Lowest similarity worth reporting as a near miss.
const NEAR_MISS_THRESHOLD: f64 = 0.5;

const ACCESS_MODIFIERS: [&str; 4] = ["public", "protected", "private", "final"];

/// Remove access modifier keywords and the whitespace after them.
fn strip_access_modifiers(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    let mut at_boundary = true;
    while let Some(c) = rest.chars().next() {
        if at_boundary {
            let stripped = ACCESS_MODIFIERS.iter().find_map(|modifier| {
                rest.strip_prefix(*modifier)
                    .filter(|after| after.starts_with(char::is_whitespace))
            });
            if let Some(after) = stripped {
                rest = after.trim_start();
                continue;
            }
        }
        out.push(c);
        at_boundary = !(c.is_alphanumeric() || c == '_' || c == '$');
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Line equality, optionally ignoring access modifiers and whitespace runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineComparator {
    pub access: bool,
    pub whitespace: bool,
}

impl LineComparator {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn canonicalize<'a>(&self, line: &'a str) -> Cow<'a, str> {
        if !self.access && !self.whitespace {
            return Cow::Borrowed(line);
        }
        let mut text = if self.access {
            strip_access_modifiers(line)
        } else {
            line.to_string()
        };
        if self.whitespace {
            text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        }
        Cow::Owned(text)
    }

    pub fn equal(&self, a: &str, b: &str) -> bool {
        if !self.access && !self.whitespace {
            return a == b;
        }
        self.canonicalize(a) == self.canonicalize(b)
    }
}

/// Where a hunk's old block was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alignment {
    /// 0-based line index of the first matched line.
    pub index: usize,
    /// Signed distance from the expected index.
    pub offset: isize,
}

impl Alignment {
    pub fn fuzz(&self) -> usize {
        self.offset.unsigned_abs()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HunkMatcher {
    max_fuzz: usize,
    comparator: LineComparator,
}

impl HunkMatcher {
    pub fn new(max_fuzz: usize, comparator: LineComparator) -> Self {
        Self {
            max_fuzz,
            comparator,
        }
    }

    pub fn max_fuzz(&self) -> usize {
        self.max_fuzz
    }

    /// Whether `block` matches `lines` starting at `index`.
    pub fn matches_at(&self, lines: &[String], index: usize, block: &[&str]) -> bool {
        if index + block.len() > lines.len() {
            return false;
        }
        lines[index..index + block.len()]
            .iter()
            .zip(block)
            .all(|(line, expected)| self.comparator.equal(line, expected))
    }

    /// Find `block` at `expected`, then at +1, -1, +2, -2 ... up to the
    /// maximum fuzz. An empty block always aligns at `expected`, clamped
    /// to the end of the file.
    pub fn find(&self, lines: &[String], expected: usize, block: &[&str]) -> Option<Alignment> {
        if block.is_empty() {
            return Some(Alignment {
                index: expected.min(lines.len()),
                offset: 0,
            });
        }
        if self.matches_at(lines, expected, block) {
            return Some(Alignment {
                index: expected,
                offset: 0,
            });
        }
        for distance in 1..=self.max_fuzz {
            let forward = expected + distance;
            if self.matches_at(lines, forward, block) {
                return Some(Alignment {
                    index: forward,
                    offset: distance as isize,
                });
            }
            if let Some(backward) = expected.checked_sub(distance) {
                if self.matches_at(lines, backward, block) {
                    return Some(Alignment {
                        index: backward,
                        offset: -(distance as isize),
                    });
                }
            }
        }
        None
    }

    /// Most similar window near `expected`, for failure diagnostics.
    pub fn nearest(&self, lines: &[String], expected: usize, block: &[&str]) -> Option<NearMiss> {
        if block.is_empty() || lines.len() < block.len() {
            return None;
        }
        let wanted = block
            .iter()
            .map(|line| self.comparator.canonicalize(line))
            .collect::<Vec<_>>()
            .join("\n");
        let last_start = lines.len() - block.len();
        let from = expected.saturating_sub(NEAR_MISS_RADIUS).min(last_start);
        let to = (expected + NEAR_MISS_RADIUS).min(last_start);

        let mut best: Option<NearMiss> = None;
        for start in from..=to {
            let window = lines[start..start + block.len()]
                .iter()
                .map(|line| self.comparator.canonicalize(line))
                .collect::<Vec<_>>()
                .join("\n");
            let similarity = normalized_levenshtein(&wanted, &window);
            if best.map_or(true, |b| similarity > b.similarity) {
                best = Some(NearMiss {
                    line: start + 1,
                    similarity,
                });
            }
        }
        best.filter(|b| b.similarity >= NEAR_MISS_THRESHOLD)
    }
}
