//! Metadata block parsing.
//!
//! Every test file carries exactly one delimited comment region,
//! `/*---` … `---*/`, describing the test: free-form categories
//! (`description`, `author`, `info`), an identifier (`es5id`), the expected
//! failure category (`negative`), and two token-list categories (`flags`,
//! `includes`).
//!
//! The grammar is line-oriented. A non-indented `key: value` line opens a
//! category; indented lines continue the current category's value with an
//! embedded newline. A continuation line before any category has opened is
//! malformed metadata and fails the test.

use crate::harness::error::HarnessError;

pub const BLOCK_BEGIN: &str = "/*---";
pub const BLOCK_END: &str = "---*/";

/// Flag token marking a test that must only run in strict mode.
pub const FLAG_ONLY_STRICT: &str = "onlyStrict";

/// Structured record parsed from one test file's metadata block.
///
/// Immutable once parsed; unrecognized categories are grammar-checked and
/// discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMetadata {
    pub description: Option<String>,
    pub author: Option<String>,
    pub info: Option<String>,
    /// Declared test identifier (the `es5id` category).
    pub id: Option<String>,
    /// Expected failure category; absence means the test must complete.
    pub negative: Option<String>,
    pub flags: Vec<String>,
    /// Named fragments to prepend, in declared order. Duplicates permitted.
    pub includes: Vec<String>,
}

impl TestMetadata {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn strict_only(&self) -> bool {
        self.has_flag(FLAG_ONLY_STRICT)
    }

    /// Locate the metadata block in a full test file and parse it.
    pub fn parse(raw: &str) -> Result<Self, HarnessError> {
        Self::parse_block(extract_block(raw)?)
    }

    /// Parse the text between the block delimiters.
    pub fn parse_block(block: &str) -> Result<Self, HarnessError> {
        let mut meta = TestMetadata::default();
        let mut category: Option<String> = None;
        let mut value = String::new();

        // The sentinel line flushes the final open category.
        for line in block.trim().lines().chain(std::iter::once("\u{0}:")) {
            if line.is_empty() || line.starts_with([' ', '\t']) {
                if category.is_none() {
                    return Err(HarnessError::Metadata(
                        "continuation line before any category".to_string(),
                    ));
                }
                value.push('\n');
                value.push_str(line.trim_start());
                continue;
            }
            if let Some(open) = category.take() {
                meta.assign(&open, &value);
            }
            let Some(colon) = line.find(':') else {
                return Err(HarnessError::Metadata(format!(
                    "expected `key: value`, got {line:?}"
                )));
            };
            category = Some(line[..colon].to_string());
            value = line[colon + 1..]
                .trim_start_matches([' ', '>', '\n'])
                .to_string();
        }
        Ok(meta)
    }

    fn assign(&mut self, category: &str, raw: &str) {
        let content = raw.trim();
        match category {
            "description" => self.description = Some(content.to_string()),
            "author" => self.author = Some(content.to_string()),
            "info" => self.info = Some(content.to_string()),
            "es5id" => self.id = Some(content.to_string()),
            "negative" => self.negative = Some(content.to_string()),
            "flags" => self.flags = split_tokens(content),
            "includes" => self.includes = split_tokens(content),
            // Grammar-checked but unused.
            _ => {}
        }
    }

    /// Re-serialize the recognized categories as a metadata block.
    /// Re-parsing the result yields an identical record.
    pub fn to_block(&self) -> String {
        let mut out = String::from(BLOCK_BEGIN);
        out.push('\n');
        write_category(&mut out, "description", self.description.as_deref());
        write_category(&mut out, "author", self.author.as_deref());
        write_category(&mut out, "info", self.info.as_deref());
        write_category(&mut out, "es5id", self.id.as_deref());
        if !self.includes.is_empty() {
            write_category(
                &mut out,
                "includes",
                Some(&format!("[{}]", self.includes.join(", "))),
            );
        }
        if !self.flags.is_empty() {
            write_category(&mut out, "flags", Some(&format!("[{}]", self.flags.join(", "))));
        }
        write_category(&mut out, "negative", self.negative.as_deref());
        out.push_str(BLOCK_END);
        out
    }
}

fn write_category(out: &mut String, name: &str, value: Option<&str>) {
    let Some(value) = value else { return };
    let mut lines = value.lines();
    out.push_str(name);
    out.push_str(": ");
    out.push_str(lines.next().unwrap_or(""));
    out.push('\n');
    for continuation in lines {
        out.push_str("    ");
        out.push_str(continuation);
        out.push('\n');
    }
}

/// Extract the single delimited block from a test file. Zero begin
/// markers, a begin marker with no matching close, or a second begin
/// marker after the close are all malformed.
fn extract_block(raw: &str) -> Result<&str, HarnessError> {
    let start = raw
        .find(BLOCK_BEGIN)
        .ok_or_else(|| HarnessError::Metadata("no metadata block".to_string()))?;
    let after = &raw[start + BLOCK_BEGIN.len()..];
    let end = after
        .find(BLOCK_END)
        .ok_or_else(|| HarnessError::Metadata("unterminated metadata block".to_string()))?;
    if after[end + BLOCK_END.len()..].contains(BLOCK_BEGIN) {
        return Err(HarnessError::Metadata(
            "more than one metadata block".to_string(),
        ));
    }
    Ok(after[..end].trim())
}

/// Split a raw `flags`/`includes` value into discrete tokens: per line,
/// strip bracket/dash decoration, then split comma-separated lines, then
/// drop empties.
pub fn split_tokens(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for line in content.lines() {
        let cand = line.trim_matches(['[', ']', ' ', '-']);
        if cand.is_empty() {
            continue;
        }
        if cand.contains(", ") {
            for part in cand.split(',') {
                let part = part.trim();
                if !part.is_empty() {
                    tokens.push(part.to_string());
                }
            }
        } else {
            tokens.push(cand.to_string());
        }
    }
    tokens
}

// ============================================================================
// Tests
// ============================================================================
