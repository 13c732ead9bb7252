//! Tolerant extraction of a JSON object from free-form model output.
//!
//! The model is instructed to reply with JSON only, but in practice wraps it
//! in prose or code fences and commits a small set of recurring syntax sins.
//! This module is an explicitly-scoped text-repair pass for exactly those
//! malformations - it is not a general JSON5 parser:
//!
//! 1. trailing commas before a closing bracket or brace
//! 2. bare (unquoted) identifier keys
//! 3. single quotes instead of double quotes
//!
//! Anything beyond that stays unparsable and the caller degrades gracefully.

use serde_json::Value;

/// Parses model output into a JSON value, leniently.
///
/// Tries the raw text as JSON first; on failure extracts a candidate object
/// (fenced code block, else the largest `{...}` span), applies the repair
/// passes, and tries again. Returns `None` when no parse succeeds.
pub fn parse_lenient(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }

    let candidate = extract_candidate(raw)?;
    let repaired = repair(&candidate);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(%err, "repaired candidate still failed to parse");
            None
        }
    }
}

/// Pulls the most plausible JSON object out of surrounding prose.
fn extract_candidate(raw: &str) -> Option<String> {
    // Fenced code block wins, with or without a `json` tag.
    if let Some(open) = raw.find("```") {
        let after = &raw[open + 3..];
        let body_start = after
            .strip_prefix("json")
            .unwrap_or(after);
        if let Some(close) = body_start.find("```") {
            let inner = body_start[..close].trim();
            if !inner.is_empty() {
                return Some(inner.to_string());
            }
        }
    }

    // Otherwise the largest `{...}` span.
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(raw[start..=end].trim().to_string())
}

/// Applies the three repair passes in a fixed order.
fn repair(text: &str) -> String {
    let text = strip_trailing_commas(text);
    let text = quote_bare_keys(&text);
    normalize_single_quotes(&text)
}

/// Removes commas that directly precede a closing `]` or `}`.
///
/// String-aware: commas inside string literals are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some(']') | Some('}')) {
                    continue;
                }
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    out
}

/// Wraps bare identifier keys (`{diagnosis: ...}`) in double quotes.
fn quote_bare_keys(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        if ch == '"' {
            in_string = true;
            out.push(ch);
            i += 1;
            continue;
        }

        out.push(ch);
        i += 1;

        // A key can only start after `{` or `,`.
        if ch != '{' && ch != ',' {
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].is_whitespace() {
            j += 1;
        }
        let ident_start = j;
        while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
            j += 1;
        }
        if j == ident_start {
            continue;
        }
        let mut k = j;
        while k < chars.len() && chars[k].is_whitespace() {
            k += 1;
        }
        if k >= chars.len() || chars[k] != ':' {
            continue;
        }

        // Emit whitespace, quoted identifier, then resume after it.
        for &ws in &chars[i..ident_start] {
            out.push(ws);
        }
        out.push('"');
        for &c in &chars[ident_start..j] {
            out.push(c);
        }
        out.push('"');
        i = j;
    }

    out
}

/// Replaces single quotes with double quotes, wholesale.
///
/// Matches the upstream behavior this pipeline is compatible with; an
/// apostrophe inside a double-quoted string will corrupt the candidate, and
/// such output falls through to the placeholder path.
fn normalize_single_quotes(text: &str) -> String {
    text.replace('\'', "\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_parses_directly() {
        let value = parse_lenient(r#"{"diagnosis": "flu"}"#).unwrap();
        assert_eq!(value, json!({"diagnosis": "flu"}));
    }

    #[test]
    fn json_inside_fenced_block_is_extracted() {
        let raw = "Here you go:\n```json\n{\"diagnosis\": \"flu\"}\n```\nHope that helps!";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"diagnosis": "flu"}));
    }

    #[test]
    fn untagged_fence_is_extracted_too() {
        let raw = "```\n{\"diagnosis\": \"flu\"}\n```";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"diagnosis": "flu"}));
    }

    #[test]
    fn brace_span_is_extracted_from_prose() {
        let raw = "Sure! {\"diagnosis\": \"flu\", \"prescriptions\": []} Let me know.";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["diagnosis"], "flu");
    }

    #[test]
    fn trailing_comma_in_object_is_repaired() {
        let raw = "{\"diagnosis\": \"flu\",}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"diagnosis": "flu"}));
    }

    #[test]
    fn trailing_comma_in_array_is_repaired() {
        let raw = "{\"prescriptions\": [\"a\", \"b\",], \"diagnosis\": \"flu\"}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["prescriptions"], json!(["a", "b"]));
    }

    #[test]
    fn comma_inside_string_survives() {
        let raw = "{\"diagnosis\": \"flu, mild\",}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["diagnosis"], "flu, mild");
    }

    #[test]
    fn bare_keys_are_quoted() {
        let raw = "{diagnosis: \"flu\", follow_up_recommendations: \"rest\"}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["diagnosis"], "flu");
        assert_eq!(value["follow_up_recommendations"], "rest");
    }

    #[test]
    fn nested_bare_keys_are_quoted() {
        let raw = "{\"prescriptions\": [{drug_name: \"Ibuprofen\", dosage: \"400mg\"}], \"diagnosis\": \"x\"}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["prescriptions"][0]["drug_name"], "Ibuprofen");
    }

    #[test]
    fn colon_in_string_value_does_not_trigger_key_quoting() {
        let raw = "{\"note\": \"ratio 1:2\", diagnosis: \"flu\"}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["note"], "ratio 1:2");
        assert_eq!(value["diagnosis"], "flu");
    }

    #[test]
    fn single_quotes_are_normalized() {
        let raw = "{'diagnosis': 'flu'}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["diagnosis"], "flu");
    }

    #[test]
    fn all_three_repairs_compose() {
        let raw = "```json\n{diagnosis: 'flu', prescriptions: [],}\n```";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"diagnosis": "flu", "prescriptions": []}));
    }

    #[test]
    fn prose_without_json_yields_none() {
        assert!(parse_lenient("Sorry, I cannot help.").is_none());
    }

    #[test]
    fn mismatched_braces_yield_none() {
        assert!(parse_lenient("} backwards {").is_none());
    }
}
