//! Critique response parsing
//!
//! Extracts a 1-10 integer score from a free-form critique. Pure domain
//! logic — no I/O, just text pattern matching.

/// Parse a critique score from a model's critique text.
///
/// Supports multiple response formats for robustness:
///
/// 1. **JSON** (preferred): `{"score": 8, "feedback": "..."}`
/// 2. **Fraction**: `8/10` or `Score: 7/10`
/// 3. **Standalone number**: `9` (if in valid range 1-10)
///
/// Returns the parsed score clamped to 1-10, or 5 (neutral) if nothing
/// parseable is found.
///
/// # Examples
///
/// ```
/// use counsel_domain::council::parsing::parse_critique_score;
///
/// assert_eq!(parse_critique_score(r#"{"score": 8, "feedback": "Good"}"#), 8);
/// assert_eq!(parse_critique_score("I rate this 7/10"), 7);
/// assert_eq!(parse_critique_score("Score: 9"), 9);
/// assert_eq!(parse_critique_score("No numbers here"), 5); // fallback
/// ```
pub fn parse_critique_score(response: &str) -> u8 {
    // Try to find JSON in the response
    if let Some(start) = response.find('{')
        && let Some(end) = response[start..].rfind('}')
    {
        let json_str = &response[start..start + end + 1];
        if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json_str)
            && let Some(score) = parsed.get("score").and_then(|v| v.as_f64())
        {
            return (score.round() as i64).clamp(1, 10) as u8;
        }
    }

    // Fallback: look for "N/10" or a standalone number in range
    for word in response.split_whitespace() {
        if let Some(num_str) = word.strip_suffix("/10")
            && let Ok(num) = num_str.parse::<i64>()
        {
            return num.clamp(1, 10) as u8;
        }
        if let Ok(num) = word
            .trim_matches(|c: char| !c.is_ascii_digit())
            .parse::<i64>()
            && (1..=10).contains(&num)
        {
            return num as u8;
        }
    }

    // Middle score when parsing fails
    5
}
