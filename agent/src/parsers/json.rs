// JSON output parser
use serde_json::Value;

use super::{OutputParser, ParseError};

/// Shape check applied after a successful parse
#[derive(Clone, Debug, Default, PartialEq)]
pub enum JsonExpectation {
    #[default]
    Any,
    /// A top-level array with exactly this many items
    ArrayLen(usize),
    /// A top-level object containing all of these keys
    Keys(Vec<String>),
}

/// Tolerant JSON parser for model replies.
///
/// Models often wrap JSON in a fenced code block or in a sentence of prose.
/// The parser tries, in order: the whole trimmed text, the first fenced
/// block, then the first balanced `{...}` or `[...]` span.
#[derive(Clone, Debug, Default)]
pub struct JsonOutputParser {
    expectation: JsonExpectation,
}

impl JsonOutputParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect_array_len(mut self, len: usize) -> Self {
        self.expectation = JsonExpectation::ArrayLen(len);
        self
    }

    pub fn expect_keys(mut self, keys: &[&str]) -> Self {
        self.expectation = JsonExpectation::Keys(keys.iter().map(|k| k.to_string()).collect());
        self
    }

    /// Check an already parsed value against the expected shape
    pub fn validate(&self, value: &Value) -> Result<(), ParseError> {
        match &self.expectation {
            JsonExpectation::Any => Ok(()),
            JsonExpectation::ArrayLen(len) => match value.as_array() {
                Some(items) if items.len() == *len => Ok(()),
                Some(items) => Err(ParseError::SchemaMismatch(format!(
                    "expected {} items, got {}",
                    len,
                    items.len()
                ))),
                None => Err(ParseError::SchemaMismatch("expected a JSON array".to_string())),
            },
            JsonExpectation::Keys(keys) => {
                let object = value
                    .as_object()
                    .ok_or_else(|| ParseError::SchemaMismatch("expected a JSON object".to_string()))?;
                let missing: Vec<&str> = keys
                    .iter()
                    .filter(|k| !object.contains_key(k.as_str()))
                    .map(String::as_str)
                    .collect();
                if missing.is_empty() {
                    Ok(())
                } else {
                    Err(ParseError::SchemaMismatch(format!("missing keys: {}", missing.join(", "))))
                }
            }
        }
    }
}

impl OutputParser for JsonOutputParser {
    /// First candidate that parses and matches the expected shape wins.
    ///
    /// On failure the first schema mismatch is reported, then the first
    /// syntax error, then `NoJsonFound`.
    fn parse(&self, text: &str) -> Result<Value, ParseError> {
        let mut mismatch = None;
        let mut invalid = None;
        for (candidate, looks_like_json) in candidates(text.trim()) {
            match serde_json::from_str::<Value>(candidate) {
                Ok(value) => match self.validate(&value) {
                    Ok(()) => return Ok(value),
                    Err(e) => {
                        mismatch.get_or_insert(e);
                    }
                },
                Err(e) if looks_like_json => {
                    invalid.get_or_insert(ParseError::InvalidJson(e.to_string()));
                }
                Err(_) => {}
            }
        }
        Err(mismatch.or(invalid).unwrap_or(ParseError::NoJsonFound))
    }

    fn format_instructions(&self) -> Option<String> {
        let shape = match &self.expectation {
            JsonExpectation::Any => "a JSON value".to_string(),
            JsonExpectation::ArrayLen(len) => format!("a JSON array of exactly {} items", len),
            JsonExpectation::Keys(keys) => format!("a JSON object with the keys {}", keys.join(", ")),
        };
        Some(format!("Return only {}, with no text before or after it.", shape))
    }
}

// Places a JSON value may hide in a reply, in order: the whole text, every
// fenced block, every balanced `{...}`/`[...]` span. The flag marks
// candidates whose syntax errors are worth reporting.
fn candidates(text: &str) -> Vec<(&str, bool)> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut found = vec![(text, text.starts_with(['{', '[']))];
    found.extend(fenced_blocks(text).into_iter().map(|block| (block, true)));
    found.extend(balanced_spans(text).into_iter().map(|span| (span, true)));
    found
}

// Bodies of ``` fences. A multi-line fence drops its first line (the
// language tag), an inline fence keeps its whole body.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut cursor = 0;
    while let Some(open) = text[cursor..].find("```") {
        let body_start = cursor + open + 3;
        let Some(close) = text[body_start..].find("```") else {
            break;
        };
        let segment = &text[body_start..body_start + close];
        let body = match segment.find('\n') {
            Some(newline) => &segment[newline + 1..],
            None => segment,
        };
        blocks.push(body.trim());
        cursor = body_start + close + 3;
    }
    blocks
}

// Every balanced span opening at a `{` or `[`, in order of position
fn balanced_spans(text: &str) -> Vec<&str> {
    text.char_indices()
        .filter(|(_, ch)| matches!(ch, '{' | '['))
        .filter_map(|(start, _)| balanced_span_at(text, start))
        .collect()
}

// Balanced span starting at `start`, ignoring brackets inside strings
fn balanced_span_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_bare_json_round_trips() {
        let source = json!({"jsx_code": "<div/>", "component_name": "Box", "imports": ["react"]});
        let parsed = JsonOutputParser::new().parse(&source.to_string()).unwrap();
        assert_eq!(parsed, source);
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n[{\"title\": \"a\"}, {\"title\": \"b\"}]\n```\nEnjoy!";
        let parsed = JsonOutputParser::new().expect_array_len(2).parse(text).unwrap();
        assert_eq!(parsed, json!([{"title": "a"}, {"title": "b"}]));
    }

    #[test]
    fn test_embedded_object_with_brackets_in_strings() {
        let text = "Sure! {\"joke\": \"Why {so} serious? [laughs]\", \"followup\": \"ha\"} Hope you liked it.";
        let parsed = JsonOutputParser::new().expect_keys(&["joke", "followup"]).parse(text).unwrap();
        assert_eq!(parsed["joke"], "Why {so} serious? [laughs]");
    }

    #[test]
    fn test_schema_mismatch() {
        let err = JsonOutputParser::new().expect_array_len(5).parse("[1, 2]").unwrap_err();
        assert_eq!(err, ParseError::SchemaMismatch("expected 5 items, got 2".to_string()));

        let err = JsonOutputParser::new().expect_keys(&["daily", "weekly"]).parse("{\"daily\": []}").unwrap_err();
        assert_eq!(err, ParseError::SchemaMismatch("missing keys: weekly".to_string()));
    }

    #[test]
    fn test_no_json() {
        assert_eq!(JsonOutputParser::new().parse("just prose").unwrap_err(), ParseError::NoJsonFound);
        assert_eq!(JsonOutputParser::new().parse("   ").unwrap_err(), ParseError::NoJsonFound);
        assert!(matches!(
            JsonOutputParser::new().parse("broken {\"a\": }").unwrap_err(),
            ParseError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_bracketed_prose_before_payload() {
        let items: Vec<Value> = (1..=5).map(|i| json!({"title": format!("item {}", i), "score": i * 10})).collect();
        let text = format!("Scores use a [0-100] scale.\n{}", Value::Array(items.clone()));
        let parsed = JsonOutputParser::new().expect_array_len(5).parse(&text).unwrap();
        assert_eq!(parsed, Value::Array(items));
    }

    #[test]
    fn test_inline_fence_before_json_fence() {
        let text = "Wrap code in ```this``` style.\n```json\n{\"joke\": \"knock knock\", \"followup\": \"who?\"}\n```";
        let parsed = JsonOutputParser::new().expect_keys(&["joke", "followup"]).parse(text).unwrap();
        assert_eq!(parsed, json!({"joke": "knock knock", "followup": "who?"}));
    }

    #[test]
    fn test_later_candidate_matching_shape_wins() {
        let text = "First draft: [1, 2]. Final: [1, 2, 3]";
        let parsed = JsonOutputParser::new().expect_array_len(3).parse(text).unwrap();
        assert_eq!(parsed, json!([1, 2, 3]));
    }

    #[test]
    fn test_validate_parsed_value() {
        let parser = JsonOutputParser::new().expect_array_len(2);
        assert!(parser.validate(&json!(["a", "b"])).is_ok());
        assert_eq!(
            parser.validate(&json!("sunny")).unwrap_err(),
            ParseError::SchemaMismatch("expected a JSON array".to_string())
        );
    }

    #[test]
    fn test_format_instructions_describe_shape() {
        let instructions = JsonOutputParser::new().expect_array_len(5).format_instructions().unwrap();
        assert!(instructions.contains("exactly 5 items"));
    }
}
