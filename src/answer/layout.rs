//! Recognises the parts of a structured answer.

use std::sync::LazyLock;

use regex::Regex;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t*#]*Section[ \t]+(\d{1,3}[A-Za-z]{0,2})[ \t]+IPC[ \t]*:[ \t*]*(.*?)[ \t*]*$")
        .expect("header pattern is valid")
});

/// Headings every answer must carry.
pub const MANDATORY_HEADINGS: [&str; 4] = [
    "Explanation:",
    "Key Details:",
    "Punishment:",
    "Example Case Study:",
];

/// Heading that may be left out.
pub const OPTIONAL_HEADING: &str = "Relevant Sections:";

/// The `Section <number> IPC: <title>` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    /// Section number as written, e.g. `302` or `498A`.
    pub number: String,
    /// Section title, possibly empty.
    pub title: String,
}

/// What [`AnswerLayout::parse`] found in an answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerLayout {
    /// Non-empty text before the header, normally the yes/no line.
    pub preamble: Option<String>,
    /// The first section header.
    pub header: Option<SectionHeader>,
    /// Template headings present, in template order.
    pub headings: Vec<&'static str>,
}

impl AnswerLayout {
    /// Parses `answer`.
    #[must_use]
    pub fn parse(answer: &str) -> Self {
        let header_match = HEADER.captures(answer);
        let header_start = header_match
            .as_ref()
            .and_then(|captures| captures.get(0))
            .map(|m| m.start());

        // Without a header there is no way to tell a preamble from the body.
        let preamble = header_start
            .map(|start| answer[..start].trim())
            .filter(|preamble| !preamble.is_empty())
            .map(str::to_string);
        let header = header_match.map(|captures| SectionHeader {
            number: captures[1].to_ascii_uppercase(),
            title: captures[2].trim().to_string(),
        });

        let body = &answer[header_start.unwrap_or(0)..];
        let headings = MANDATORY_HEADINGS
            .iter()
            .chain(std::iter::once(&OPTIONAL_HEADING))
            .copied()
            .filter(|heading| has_heading(body, heading))
            .collect();

        Self {
            preamble,
            header,
            headings,
        }
    }

    /// Whether the preamble opens with a yes or no verdict.
    #[must_use]
    pub fn has_verdict(&self) -> bool {
        self.preamble.as_deref().is_some_and(|preamble| {
            let opening = preamble.trim_start_matches(['*', ' ']);
            ["Yes", "No"].iter().any(|verdict| {
                opening
                    .strip_prefix(verdict)
                    .is_some_and(|rest| !rest.starts_with(char::is_alphanumeric))
            })
        })
    }

    /// Mandatory headings the answer lacks, including the section header.
    #[must_use]
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.header.is_none() {
            missing.push("Section <number> IPC:");
        }
        missing.extend(
            MANDATORY_HEADINGS
                .iter()
                .copied()
                .filter(|heading| !self.headings.contains(heading)),
        );
        missing
    }

    /// Returns `true` when nothing mandatory is missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// Drops everything before the first section header and rewrites that header as plain
/// `Section <number> IPC: <title>`, without markdown emphasis. Answers without a header
/// are returned trimmed but otherwise untouched.
#[must_use]
pub fn strip_preamble(answer: &str) -> String {
    let Some(captures) = HEADER.captures(answer) else {
        return answer.trim().to_string();
    };
    let Some(line) = captures.get(0) else {
        return answer.trim().to_string();
    };
    let number = captures[1].to_ascii_uppercase();
    let title = captures[2].trim();
    let mut stripped = if title.is_empty() {
        format!("Section {number} IPC:")
    } else {
        format!("Section {number} IPC: {title}")
    };
    stripped.push_str(answer[line.end()..].trim_end());
    stripped
}

fn has_heading(body: &str, heading: &str) -> bool {
    body.lines()
        .map(|line| line.trim().trim_matches(['*', '#', ' ']))
        .any(|line| line.starts_with(heading))
}
