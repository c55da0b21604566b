use std::fmt;

use crate::text::{fingerprint, normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOrigin {
    A,
    B,
}

impl fmt::Display for FileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOrigin::A => write!(f, "A"),
            FileOrigin::B => write!(f, "B"),
        }
    }
}

/// One input line, created at ingest and never mutated afterwards
/// except for the consumed flag, which only the megablock finder sets.
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub text: String,
    pub trimmed: String,
    pub fingerprint: String,
    /// 1-based line number in the source file.
    pub number: usize,
    pub origin: FileOrigin,
    pub consumed: bool,
}

/// Splits raw content into line records. CRLF and lone CR are folded
/// to LF first so fingerprints never see carriage returns.
pub fn split_lines(content: &str, origin: FileOrigin) -> Vec<LineRecord> {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| LineRecord {
            text: line.to_string(),
            trimmed: line.trim().to_string(),
            fingerprint: fingerprint(line),
            number: i + 1,
            origin,
            consumed: false,
        })
        .collect()
}

/// A contiguous run of lines treated as a unit: either one side of a
/// megablock or a gap paragraph. Immutable once created.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    /// Unique across the whole diff run; the counter is shared between
    /// both files and both producers.
    pub id: usize,
    pub original_text: String,
    pub normalized_text: String,
    pub fingerprint: String,
    /// Placeholder vector; a real embedding model would slot in here.
    pub embedding: Vec<f32>,
    pub line_start: usize,
    pub line_end: usize,
    pub origin: FileOrigin,
    /// Source line numbers of the contributing records, in order.
    pub line_numbers: Vec<usize>,
}

impl ContentBlock {
    /// Megablock side: the raw lines joined verbatim.
    pub fn from_run(id: usize, lines: &[&LineRecord]) -> Self {
        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self::build(id, text, lines)
    }

    /// Gap paragraph: joined lines with outer whitespace trimmed.
    pub fn from_paragraph(id: usize, lines: &[&LineRecord]) -> Self {
        let text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();
        Self::build(id, text, lines)
    }

    fn build(id: usize, text: String, lines: &[&LineRecord]) -> Self {
        let normalized = normalize(&text);
        ContentBlock {
            id,
            fingerprint: fingerprint(&text),
            embedding: placeholder_embedding(&normalized),
            normalized_text: normalized,
            line_start: lines.first().map_or(0, |l| l.number),
            line_end: lines.last().map_or(0, |l| l.number),
            origin: lines.first().map_or(FileOrigin::A, |l| l.origin),
            line_numbers: lines.iter().map(|l| l.number).collect(),
            original_text: text,
        }
    }

    /// Line count of the block text, newline count + 1.
    pub fn line_count(&self) -> usize {
        self.original_text.matches('\n').count() + 1
    }

    pub fn covers_line(&self, number: usize) -> bool {
        number >= self.line_start && number <= self.line_end
    }
}

/// Stand-in for an embedding model: a vowel-frequency vector, scaled
/// down so magnitudes stay comparable across block sizes. Only the
/// cosine kernel ever reads it, and nothing in the pipeline calls that.
pub fn placeholder_embedding(text: &str) -> Vec<f32> {
    let mut emb = vec![0.0f32; 5];
    for c in text.chars() {
        match c.to_ascii_lowercase() {
            'a' => emb[0] += 1.0,
            'e' => emb[1] += 1.0,
            'i' => emb[2] += 1.0,
            'o' => emb[3] += 1.0,
            'u' => emb[4] += 1.0,
            _ => {}
        }
    }
    let sum_sq: f32 = emb.iter().map(|v| v * v).sum();
    if sum_sq > 0.0 {
        let scale = 1.0 / (emb.len() as f32 * (sum_sq + 1e-9));
        for v in &mut emb {
            *v *= scale;
        }
    }
    emb
}
