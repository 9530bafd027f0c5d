//! Tag segmentation of raw MT940 text.
//!
//! A span is the text strictly between an opening `:61:` or `:86:` tag and the
//! next tag of the shape `:NN:` / `:NNA:` (or the end of the text). Nothing is
//! trimmed or normalized here.

use regex::Regex;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `:61:` statement line
    Detail,
    /// `:86:` information to account owner
    Narrative,
}

impl TagKind {
    fn from_code(code: &str) -> Option<Self> {
        match code {
            "61" => Some(TagKind::Detail),
            "86" => Some(TagKind::Narrative),
            _ => None,
        }
    }
}

/// Text body of one `:61:` or `:86:` segment, borrowed from the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpan<'a> {
    pub kind: TagKind,
    pub body: &'a str,
}

pub struct TagExtractor {
    tag_re: Regex,
}

impl TagExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tag_re: Regex::new(r":[0-9]{2}[A-Z]?:")?,
        })
    }

    /// All `:61:`/`:86:` spans in source order.
    pub fn spans<'a>(&self, text: &'a str) -> Vec<RawSpan<'a>> {
        let tags: Vec<_> = self.tag_re.find_iter(text).collect();
        let mut out = Vec::new();

        for (i, tag) in tags.iter().enumerate() {
            let code = &tag.as_str()[1..tag.as_str().len() - 1];
            let Some(kind) = TagKind::from_code(code) else {
                continue;
            };
            let end = tags.get(i + 1).map(|next| next.start()).unwrap_or(text.len());
            out.push(RawSpan {
                kind,
                body: &text[tag.end()..end],
            });
        }

        out
    }

    /// Spans grouped positionally into (detail, narrative) pairs.
    /// A trailing unpaired span is dropped.
    pub fn pairs<'a>(&self, text: &'a str) -> Vec<(RawSpan<'a>, RawSpan<'a>)> {
        self.spans(text)
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }
}
