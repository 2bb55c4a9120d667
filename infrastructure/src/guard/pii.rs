//! Regex-based PII guard
//!
//! Replaces caller-supplied identifiers and well-known PII patterns
//! (emails, urls, phone numbers, large dollar amounts, street
//! addresses) with numbered placeholders before any text leaves the
//! system, and reverses the substitutions afterwards.
//!
//! Identifiers are applied longest-first so "Acme Robotics GmbH" wins
//! over "Acme Robotics" when both are listed. Restore walks the mapping
//! list in reverse creation order, which makes nested substitutions
//! unwind correctly.

use counsel_application::ports::pii_guard::{PiiGuard, PiiMapping, Sanitized};
use regex::Regex;

pub struct RegexPiiGuard {
    email: Regex,
    url: Regex,
    phone: Regex,
    amount: Regex,
    address: Regex,
}

impl Default for RegexPiiGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexPiiGuard {
    pub fn new() -> Self {
        Self {
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                .expect("static email pattern"),
            url: Regex::new(r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#)
                .expect("static url pattern"),
            phone: Regex::new(r"\+?\d{1,3}[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}")
                .expect("static phone pattern"),
            // Dollar figures with thousands separators, or 5+ bare digits;
            // small round amounts stay readable in context
            amount: Regex::new(r"\$\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\$\d{5,}(?:\.\d{2})?")
                .expect("static amount pattern"),
            address: Regex::new(
                r"(?i)\d{1,5}\s+[\w\s]+(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|lane|ln|way|court|ct|place|pl)\.?(?:\s*,?\s*(?:suite|ste|apt|unit|#)\s*\d+)?",
            )
            .expect("static address pattern"),
        }
    }

    fn substitute_pattern(
        &self,
        text: &mut String,
        pattern: &Regex,
        placeholder_prefix: &str,
        mappings: &mut Vec<PiiMapping>,
    ) {
        loop {
            let Some(found) = pattern.find(text) else {
                break;
            };
            let original = found.as_str().to_string();
            let placeholder = format!("[{}_{}]", placeholder_prefix, mappings.len() + 1);
            *text = text.replace(&original, &placeholder);
            mappings.push(PiiMapping {
                original,
                placeholder,
            });
        }
    }
}

impl PiiGuard for RegexPiiGuard {
    fn sanitize(&self, text: &str, identifiers: &[String]) -> Sanitized {
        let mut out = text.to_string();
        let mut mappings = Vec::new();

        let mut by_length: Vec<&String> = identifiers.iter().filter(|i| !i.is_empty()).collect();
        by_length.sort_by_key(|i| std::cmp::Reverse(i.len()));

        for identifier in by_length {
            if out.contains(identifier.as_str()) {
                let placeholder = format!("[PARTY_{}]", mappings.len() + 1);
                out = out.replace(identifier.as_str(), &placeholder);
                mappings.push(PiiMapping {
                    original: identifier.clone(),
                    placeholder,
                });
            }
        }

        // Emails before urls so a mailto-ish match cannot split a url;
        // urls before phones so url path digits are not mistaken for one
        self.substitute_pattern(&mut out, &self.email, "EMAIL", &mut mappings);
        self.substitute_pattern(&mut out, &self.url, "URL", &mut mappings);
        self.substitute_pattern(&mut out, &self.phone, "PHONE", &mut mappings);
        self.substitute_pattern(&mut out, &self.amount, "AMOUNT", &mut mappings);
        self.substitute_pattern(&mut out, &self.address, "ADDRESS", &mut mappings);

        Sanitized {
            text: out,
            mappings,
        }
    }

    fn restore(&self, text: &str, mappings: &[PiiMapping]) -> String {
        let mut out = text.to_string();
        for mapping in mappings.iter().rev() {
            out = out.replace(&mapping.placeholder, &mapping.original);
        }
        out
    }
}
