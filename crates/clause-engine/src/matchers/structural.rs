//! Numbered-section document shape.
//!
//! Sections are lines like `4.2 Emergency Procedures` or `7.` followed by a
//! capitalised title. Content runs until the next header.

use super::{build_regex, Document, MatchOutcome};
use crate::packs::schema::{MatcherDefinition, StructuralCheckDefinition};
use regex::{Regex, RegexBuilder};

pub const DEFAULT_HEADER_PATTERN: &str = r"^[ \t]*(\d+(?:\.\d+)*)\.?[ \t]+(\p{Lu}[^\n]*)$";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub number: String,
    pub title: String,
    /// Number of components in `number` (`7.5.1` is depth 3).
    pub depth: usize,
    pub content: String,
}

/// Split `text` into numbered sections using `header` (group 1 = number,
/// group 2 = title).
pub fn parse_sections(header: &Regex, text: &str) -> Vec<Section> {
    let headers: Vec<_> = header.captures_iter(text).collect();
    let mut sections = Vec::with_capacity(headers.len());
    for (idx, caps) in headers.iter().enumerate() {
        let (Some(whole), Some(number), Some(title)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        let end = headers
            .get(idx + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let number = number.as_str().trim_end_matches('.').to_string();
        sections.push(Section {
            depth: number.split('.').count(),
            number,
            title: title.as_str().trim().to_string(),
            content: text[whole.end()..end].trim().to_string(),
        });
    }
    sections
}

#[derive(Debug, Clone)]
enum StructuralCheck {
    SectionExists { title: Regex, source: String },
    MinDepth(usize),
    MinContent { title: Regex, source: String, chars: usize },
    MinSections(usize),
}

#[derive(Debug, Clone)]
pub struct StructuralMatcher {
    header: Regex,
    checks: Vec<StructuralCheck>,
}

impl StructuralMatcher {
    pub fn compile(def: &MatcherDefinition) -> Result<Self, Vec<String>> {
        let MatcherDefinition::Structural { header, checks } = def else {
            return Err(vec![format!("expected structural matcher, got {}", def.type_name())]);
        };

        let mut problems = Vec::new();
        if checks.is_empty() {
            problems.push("structural matcher has no checks".to_string());
        }

        // Titles are matched case-sensitively on the header itself.
        let header_source = header.as_deref().unwrap_or(DEFAULT_HEADER_PATTERN);
        let header = match RegexBuilder::new(header_source)
            .multi_line(true)
            .size_limit(1 << 20)
            .build()
        {
            Ok(re) if re.captures_len() < 3 => {
                problems.push("header pattern needs two capture groups (number, title)".into());
                None
            }
            Ok(re) => Some(re),
            Err(e) => {
                problems.push(format!("invalid header pattern: {}", e));
                None
            }
        };

        let mut compiled = Vec::with_capacity(checks.len());
        for (idx, check) in checks.iter().enumerate() {
            let result = match check {
                StructuralCheckDefinition::SectionExists { title } => build_regex(title)
                    .map(|re| StructuralCheck::SectionExists {
                        title: re,
                        source: title.clone(),
                    }),
                StructuralCheckDefinition::MinDepth { depth } if *depth == 0 => {
                    Err("min_depth must be at least 1".to_string())
                }
                StructuralCheckDefinition::MinDepth { depth } => {
                    Ok(StructuralCheck::MinDepth(*depth))
                }
                StructuralCheckDefinition::MinContent { title, chars } => build_regex(title)
                    .map(|re| StructuralCheck::MinContent {
                        title: re,
                        source: title.clone(),
                        chars: *chars,
                    }),
                StructuralCheckDefinition::MinSections { count } => {
                    Ok(StructuralCheck::MinSections(*count))
                }
            };
            match result {
                Ok(c) => compiled.push(c),
                Err(e) => problems.push(format!("checks[{}]: {}", idx, e)),
            }
        }

        match header {
            Some(header) if problems.is_empty() => Ok(Self {
                header,
                checks: compiled,
            }),
            _ => Err(problems),
        }
    }

    pub fn evaluate(&self, doc: &Document<'_>) -> MatchOutcome {
        let sections = parse_sections(&self.header, doc.raw());
        let mut issues = Vec::new();
        for check in &self.checks {
            match check {
                StructuralCheck::SectionExists { title, source } => {
                    if !sections.iter().any(|s| title.is_match(&s.title)) {
                        issues.push(format!("Missing section matching '{}'", source));
                    }
                }
                StructuralCheck::MinDepth(depth) => {
                    let found = sections.iter().map(|s| s.depth).max().unwrap_or(0);
                    if found < *depth {
                        issues.push(format!(
                            "Document structure depth {} is below required {}",
                            found, depth
                        ));
                    }
                }
                StructuralCheck::MinContent {
                    title,
                    source,
                    chars,
                } => {
                    let matching: Vec<&Section> =
                        sections.iter().filter(|s| title.is_match(&s.title)).collect();
                    match matching.first() {
                        None => issues.push(format!("Missing section matching '{}'", source)),
                        Some(first) => {
                            if !matching.iter().any(|s| s.content.chars().count() >= *chars) {
                                issues.push(format!(
                                    "Section '{} {}' has {} characters of content (minimum {})",
                                    first.number,
                                    first.title,
                                    first.content.chars().count(),
                                    chars
                                ));
                            }
                        }
                    }
                }
                StructuralCheck::MinSections(count) => {
                    if sections.len() < *count {
                        issues.push(format!(
                            "Document has {} numbered sections (minimum {})",
                            sections.len(),
                            count
                        ));
                    }
                }
            }
        }
        MatchOutcome::from_issues(issues)
    }
}
