//! `:86:` narrative decoding.
//!
//! The narrative is a single logical line split into sub-fields by `?NN`
//! markers: `?20`..`?29` carry the remittance text (memo), `?31` the
//! counterparty IBAN, `?32`/`?33` the counterparty name.
//!
//! The memo is rebuilt by deleting every `?2<digit>` continuation marker and
//! deciding from the characters on either side whether the deletion needs a
//! space. The rules run as whole-string passes in a fixed order, each pass
//! seeing the output of the previous one. Output must stay byte-identical to
//! existing exports, so the passes must not be folded into one per-marker
//! classifier (the two disagree when markers sit close together).

use regex::{Captures, Regex};
use tracing::trace;

use crate::error::Result;

/// Fields recovered from one `:86:` span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedNarrative {
    pub memo: String,
    pub iban: Option<String>,
    pub name: Option<String>,
    pub sepa_reference: Option<String>,
}

struct RuleSpec {
    name: &'static str,
    left: &'static str,
    right: &'static str,
    insert_space: bool,
}

// Priority order matters: see module docs.
const MARKER_RULES: [RuleSpec; 9] = [
    RuleSpec { name: "letter-letter", left: r"\p{L}", right: r"\p{L}", insert_space: false },
    RuleSpec { name: "digit-digit", left: "[0-9]", right: "[0-9]", insert_space: false },
    RuleSpec { name: "letter-digit", left: r"\p{L}", right: "[0-9]", insert_space: true },
    RuleSpec { name: "digit-letter", left: "[0-9]", right: r"\p{L}", insert_space: true },
    RuleSpec { name: "lower-upper", left: r"\p{Ll}", right: r"\p{Lu}", insert_space: true },
    RuleSpec { name: "space-digit", left: r"\s", right: "[0-9]", insert_space: false },
    RuleSpec { name: "space-letter", left: r"\s", right: r"\p{L}", insert_space: false },
    RuleSpec { name: "letter-space", left: r"\p{L}", right: r"\s", insert_space: false },
    RuleSpec { name: "digit-space", left: "[0-9]", right: r"\s", insert_space: false },
];

struct MarkerRule {
    name: &'static str,
    pattern: Regex,
    separator: &'static str,
}

/// How many markers each pass removed. Rule numbers are 1-based, matching
/// the order of the rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerStats {
    rules: [usize; 9],
    pub fallback: usize,
}

impl MarkerStats {
    pub fn rule(&self, number: usize) -> usize {
        number
            .checked_sub(1)
            .and_then(|i| self.rules.get(i))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.rules.iter().sum::<usize>() + self.fallback
    }
}

pub struct NarrativeDecoder {
    line_breaks: Regex,
    tan: Regex,
    iban: Regex,
    name: Regex,
    sepa_reference: Regex,
    rules: Vec<MarkerRule>,
    any_marker: Regex,
}

impl NarrativeDecoder {
    pub fn new() -> Result<Self> {
        let rules = MARKER_RULES
            .iter()
            .map(|spec| -> Result<MarkerRule> {
                let pattern = Regex::new(&format!(
                    r"(?P<left>{})\?2[0-9](?P<right>{})",
                    spec.left, spec.right
                ))?;
                Ok(MarkerRule {
                    name: spec.name,
                    pattern,
                    separator: if spec.insert_space { " " } else { "" },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            line_breaks: Regex::new(r"[\r\n]+")?,
            tan: Regex::new(r"TAN: [0-9]{6}")?,
            iban: Regex::new(r"\?31([A-Z]{2}[0-9]{2}[A-Z0-9]{1,18})")?,
            name: Regex::new(r"(?s)\?32(.*?)(?:\?33(.*))?$")?,
            sepa_reference: Regex::new(r"\b[A-Z]{2}[0-9]{2}[A-Z0-9]{3}[0-9]{1,30}\b")?,
            rules,
            any_marker: Regex::new(r"\?2[0-9]")?,
        })
    }

    pub fn decode(&self, raw: &str) -> DecodedNarrative {
        let text = self.preprocess(raw);
        let memo = self.reconstruct_memo(&text);
        let sepa_reference = self.extract_sepa_reference(&memo);

        DecodedNarrative {
            iban: self.extract_iban(&text),
            name: self.extract_name(&text),
            sepa_reference,
            memo,
        }
    }

    /// Join the narrative into one line and mask TANs. Runs before anything
    /// else so a TAN split across continuation lines is still caught.
    pub fn preprocess(&self, raw: &str) -> String {
        let joined = self.line_breaks.replace_all(raw, "");
        self.tan.replace_all(&joined, "TAN: xxxxxx").into_owned()
    }

    pub fn extract_iban(&self, text: &str) -> Option<String> {
        self.iban
            .captures(text)
            .map(|caps| caps[1].to_string())
    }

    /// `?32` name, continued by `?33` when present.
    pub fn extract_name(&self, text: &str) -> Option<String> {
        let caps = self.name.captures(text)?;
        let first = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let second = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        let name: String = first.chars().chain(second.chars()).filter(|c| *c != '?').collect();
        if name.is_empty() { None } else { Some(name) }
    }

    /// Memo text between `?20` and the next `?30` with continuation markers
    /// removed. Without a `?20` marker the text is returned as is.
    pub fn reconstruct_memo(&self, text: &str) -> String {
        let Some(start) = text.find("?20") else {
            return text.to_string();
        };
        let rest = &text[start + 3..];
        let span = match rest.find("?30") {
            Some(end) => &rest[..end],
            None => rest,
        };

        let (memo, stats) = self.strip_markers(span);
        trace!(?stats, "removed continuation markers");
        memo
    }

    pub fn strip_markers(&self, span: &str) -> (String, MarkerStats) {
        let mut stats = MarkerStats::default();
        let mut text = span.to_string();

        for (i, rule) in self.rules.iter().enumerate() {
            let mut hits = 0;
            let replaced = rule.pattern.replace_all(&text, |caps: &Captures| {
                hits += 1;
                format!("{}{}{}", &caps["left"], rule.separator, &caps["right"])
            });
            let replaced = replaced.into_owned();
            if hits > 0 {
                trace!(rule = rule.name, hits, "marker pass");
            }
            stats.rules[i] = hits;
            text = replaced;
        }

        stats.fallback = self.any_marker.find_iter(&text).count();
        let text = self.any_marker.replace_all(&text, "").into_owned();

        (text, stats)
    }

    pub fn extract_sepa_reference(&self, memo: &str) -> Option<String> {
        self.sepa_reference
            .find(memo)
            .map(|m| m.as_str().to_string())
    }
}
