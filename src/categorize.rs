// src/categorize.rs
use crate::detect::NotificationLine;

/// Display sections, in the order they appear in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    OpenAI,
    Anthropic,
    Other,
}

impl Bucket {
    pub const DISPLAY_ORDER: [Bucket; 3] = [Bucket::OpenAI, Bucket::Anthropic, Bucket::Other];

    pub fn header(self) -> &'static str {
        match self {
            Bucket::OpenAI => "🟦 **OpenAI Updates**",
            Bucket::Anthropic => "🟧 **Anthropic Updates**",
            Bucket::Other => "⬜ **Other Updates**",
        }
    }

    fn index(self) -> usize {
        match self {
            Bucket::OpenAI => 0,
            Bucket::Anthropic => 1,
            Bucket::Other => 2,
        }
    }
}

/// Keyword heuristic over `line_text + source_label`, lower-cased.
///
/// Precedence: "openai" wins over "anthropic"/"claude"; anything else is
/// `Other`. This is deliberately loose: a label that merely contains
/// "openai" lands in the OpenAI section whoever actually publishes it.
pub fn categorize(line_text: &str, source_label: &str) -> Bucket {
    let hay = format!("{line_text}{source_label}").to_lowercase();
    if hay.contains("openai") {
        Bucket::OpenAI
    } else if hay.contains("anthropic") || hay.contains("claude") {
        Bucket::Anthropic
    } else {
        Bucket::Other
    }
}

/// Line bodies grouped per bucket, discovery order preserved within each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buckets {
    lines: [Vec<String>; 3],
}

impl Buckets {
    pub fn push(&mut self, bucket: Bucket, text: impl Into<String>) {
        self.lines[bucket.index()].push(text.into());
    }

    pub fn get(&self, bucket: Bucket) -> &[String] {
        &self.lines[bucket.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Vec::is_empty)
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a NotificationLine>) -> Self {
        let mut b = Self::default();
        for l in lines {
            b.push(categorize(&l.text, &l.source_label), l.text.clone());
        }
        b
    }
}
