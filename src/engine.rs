use std::cmp::Ordering;
use std::collections::HashSet;
use std::io::{self, Write};

use anyhow::{bail, Result};

use crate::block::{split_lines, ContentBlock, FileOrigin, LineRecord};
use crate::script::{line_script, EditOp};
use crate::similarity::text_similarity;

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.55;
pub const MIN_MEGABLOCK_LENGTH: usize = 3;
pub const MIN_PARAGRAPH_LINES: usize = 3;

#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Minimum similarity at which two gap paragraphs pair up.
    pub similarity_threshold: f32,
    /// Shortest run of identical lines accepted as a megablock.
    pub min_megablock_length: usize,
    /// Shortest paragraph (in lines) eligible for semantic pairing.
    pub min_paragraph_lines: usize,
    /// Route stage-by-stage diagnostics to stderr.
    pub debug: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        DiffConfig {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_megablock_length: MIN_MEGABLOCK_LENGTH,
            min_paragraph_lines: MIN_PARAGRAPH_LINES,
            debug: false,
        }
    }
}

impl DiffConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            bail!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            );
        }
        if self.min_megablock_length == 0 {
            bail!("minimum megablock length must be positive");
        }
        if self.min_paragraph_lines == 0 {
            bail!("minimum paragraph line count must be positive");
        }
        Ok(())
    }
}

/// Report category. The derived order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiffKind {
    Added,
    Deleted,
    Moved,
    Modified,
    Unchanged,
}

impl DiffKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiffKind::Added => "NEW",
            DiffKind::Deleted => "DELETED",
            DiffKind::Moved => "MOVED",
            DiffKind::Modified => "CHANGED",
            DiffKind::Unchanged => "UNCHANGED_IN_PLACE",
        }
    }
}

/// One classified result. Unchanged, Modified and Moved carry both
/// blocks; Deleted carries A only and Added carries B only. The edit
/// script is attached to entries still Modified after positional
/// classification.
#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub kind: DiffKind,
    pub block_a: Option<ContentBlock>,
    pub block_b: Option<ContentBlock>,
    pub similarity: f32,
    pub script: Option<Vec<EditOp>>,
}

impl DiffEntry {
    fn paired(kind: DiffKind, a: ContentBlock, b: ContentBlock, similarity: f32) -> Self {
        DiffEntry {
            kind,
            block_a: Some(a),
            block_b: Some(b),
            similarity,
            script: None,
        }
    }
}

/// Runs the full pipeline. Tracing goes to stderr when the config asks
/// for it; the engine itself never fails.
pub fn perform_diff(content_a: &str, content_b: &str, config: &DiffConfig) -> Vec<DiffEntry> {
    if config.debug {
        perform_diff_traced(content_a, content_b, config, &mut io::stderr().lock())
    } else {
        perform_diff_traced(content_a, content_b, config, &mut io::sink())
    }
}

/// Same pipeline with diagnostics routed to an explicit writer. Trace
/// writes are best-effort; a failing writer never fails the diff.
pub fn perform_diff_traced(
    content_a: &str,
    content_b: &str,
    config: &DiffConfig,
    trace: &mut dyn Write,
) -> Vec<DiffEntry> {
    let mut lines_a = split_lines(content_a, FileOrigin::A);
    let mut lines_b = split_lines(content_b, FileOrigin::B);
    let mut next_id = 0usize;

    // Stage 1: greedy megablock extraction, longest run first.
    let mut paired = find_megablocks(&mut lines_a, &mut lines_b, config, &mut next_id);
    let _ = writeln!(trace, "megablocks found: {}", paired.len());

    // Stage 2: paragraph segmentation of the unconsumed remainder.
    let gaps_a = segment_gaps(&lines_a, &mut next_id);
    let gaps_b = segment_gaps(&lines_b, &mut next_id);
    let _ = writeln!(
        trace,
        "gap blocks: {} in A, {} in B",
        gaps_a.len(),
        gaps_b.len()
    );

    // Stage 3: greedy A-driven semantic pairing of gap paragraphs.
    let (semantic, used_a, used_b) = pair_gap_blocks(&gaps_a, &gaps_b, config, trace);
    let _ = writeln!(trace, "semantic matches between gap blocks: {}", semantic.len());
    paired.extend(semantic);

    // Stage 4: positionally unstable pairs become Moved.
    classify_by_position(&mut paired);

    // Stage 5: edit scripts for pairs still Modified, then the
    // leftovers become Deleted / Added.
    for entry in &mut paired {
        if entry.kind == DiffKind::Modified {
            if let (Some(a), Some(b)) = (&entry.block_a, &entry.block_b) {
                entry.script = Some(line_script(&a.original_text, &b.original_text));
            }
        }
    }

    let mut entries = paired;
    for block in gaps_a {
        if !used_a.contains(&block.id) {
            entries.push(DiffEntry {
                kind: DiffKind::Deleted,
                block_a: Some(block),
                block_b: None,
                similarity: 0.0,
                script: None,
            });
        }
    }
    for block in gaps_b {
        if !used_b.contains(&block.id) {
            entries.push(DiffEntry {
                kind: DiffKind::Added,
                block_a: None,
                block_b: Some(block),
                similarity: 0.0,
                script: None,
            });
        }
    }

    entries.sort_by(compare_entries);
    entries
}

/// Longest contiguous run of fingerprint-equal unconsumed lines.
/// Strict `>` keeps the earliest A index, then the earliest B index,
/// on ties, so repeated runs resolve deterministically. Blank lines
/// extend a run but a run of nothing but blanks is not a match, so
/// whitespace-only input never produces blocks.
fn next_longest_run(
    lines_a: &[LineRecord],
    lines_b: &[LineRecord],
) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    let mut best_len = 0usize;

    for i in 0..lines_a.len() {
        if lines_a[i].consumed {
            continue;
        }
        for j in 0..lines_b.len() {
            if lines_b[j].consumed || lines_a[i].fingerprint != lines_b[j].fingerprint {
                continue;
            }
            let mut len = 0usize;
            let mut has_content = false;
            while i + len < lines_a.len() && j + len < lines_b.len() {
                let (la, lb) = (&lines_a[i + len], &lines_b[j + len]);
                if la.consumed || lb.consumed || la.fingerprint != lb.fingerprint {
                    break;
                }
                if !la.trimmed.is_empty() {
                    has_content = true;
                }
                len += 1;
            }
            if has_content && len > best_len {
                best_len = len;
                best = Some((i, j, len));
            }
        }
    }
    best
}

fn find_megablocks(
    lines_a: &mut [LineRecord],
    lines_b: &mut [LineRecord],
    config: &DiffConfig,
    next_id: &mut usize,
) -> Vec<DiffEntry> {
    let mut entries = Vec::new();

    while let Some((a_start, b_start, len)) = next_longest_run(lines_a, lines_b) {
        if len < config.min_megablock_length {
            break;
        }

        let run_a: Vec<&LineRecord> = lines_a[a_start..a_start + len].iter().collect();
        let block_a = ContentBlock::from_run(*next_id, &run_a);
        *next_id += 1;

        let run_b: Vec<&LineRecord> = lines_b[b_start..b_start + len].iter().collect();
        let block_b = ContentBlock::from_run(*next_id, &run_b);
        *next_id += 1;

        entries.push(DiffEntry::paired(DiffKind::Unchanged, block_a, block_b, 1.0));

        for line in &mut lines_a[a_start..a_start + len] {
            line.consumed = true;
        }
        for line in &mut lines_b[b_start..b_start + len] {
            line.consumed = true;
        }
    }
    entries
}

/// Walks the file in order and groups unconsumed non-blank lines into
/// paragraphs. Both a consumed line and a blank line end the current
/// paragraph, so no paragraph ever crosses a megablock and provenance
/// is exact by construction.
fn segment_gaps(lines: &[LineRecord], next_id: &mut usize) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&LineRecord> = Vec::new();

    for line in lines {
        if line.consumed || line.trimmed.is_empty() {
            if !paragraph.is_empty() {
                blocks.push(ContentBlock::from_paragraph(*next_id, &paragraph));
                *next_id += 1;
                paragraph.clear();
            }
        } else {
            paragraph.push(line);
        }
    }
    if !paragraph.is_empty() {
        blocks.push(ContentBlock::from_paragraph(*next_id, &paragraph));
        *next_id += 1;
    }
    blocks
}

/// Greedy one-pass pairing: each A paragraph (in ascending id order)
/// claims its best-scoring free B paragraph if the score clears the
/// threshold. Strict `>` on the running best keeps the first B in
/// ascending id order on score ties.
fn pair_gap_blocks(
    gaps_a: &[ContentBlock],
    gaps_b: &[ContentBlock],
    config: &DiffConfig,
    trace: &mut dyn Write,
) -> (Vec<DiffEntry>, HashSet<usize>, HashSet<usize>) {
    let mut entries = Vec::new();
    let mut used_a = HashSet::new();
    let mut used_b = HashSet::new();

    for gap_a in gaps_a {
        if gap_a.line_count() < config.min_paragraph_lines {
            continue;
        }

        let mut best: Option<&ContentBlock> = None;
        let mut best_sim = -1.0f32;
        for gap_b in gaps_b {
            if used_b.contains(&gap_b.id) || gap_b.line_count() < config.min_paragraph_lines {
                continue;
            }
            let sim = text_similarity(&gap_a.normalized_text, &gap_b.normalized_text);
            if sim > best_sim {
                best_sim = sim;
                best = Some(gap_b);
            }
        }

        match best {
            Some(gap_b) if best_sim >= config.similarity_threshold => {
                entries.push(DiffEntry::paired(
                    DiffKind::Modified,
                    gap_a.clone(),
                    gap_b.clone(),
                    best_sim,
                ));
                used_a.insert(gap_a.id);
                used_b.insert(gap_b.id);
            }
            Some(gap_b) => {
                let _ = writeln!(
                    trace,
                    "no semantic match for gap A id {} (best {:.4} with B id {}, threshold {:.2})",
                    gap_a.id, best_sim, gap_b.id, config.similarity_threshold
                );
            }
            None => {
                let _ = writeln!(
                    trace,
                    "no semantic match for gap A id {} (no eligible B paragraph)",
                    gap_a.id
                );
            }
        }
    }
    (entries, used_a, used_b)
}

/// Sorts pairs by File-A position and keeps the longest strictly
/// increasing subsequence of File-B start lines in place; everything
/// outside it is reclassified as Moved, similarity kept.
fn classify_by_position(paired: &mut [DiffEntry]) {
    paired.sort_by_key(|e| {
        let a = e.block_a.as_ref().expect("paired entry without an A block");
        (a.line_start, a.id)
    });

    let b_starts: Vec<usize> = paired
        .iter()
        .map(|e| {
            e.block_b
                .as_ref()
                .expect("paired entry without a B block")
                .line_start
        })
        .collect();

    let mut in_place = vec![false; paired.len()];
    for idx in lis_indices(&b_starts) {
        in_place[idx] = true;
    }
    for (entry, keep) in paired.iter_mut().zip(in_place) {
        if !keep {
            entry.kind = DiffKind::Moved;
        }
    }
}

/// Patience-style longest strictly increasing subsequence: tails array
/// plus predecessor links, O(k log k). Returns the indices of one LIS
/// in ascending order.
fn lis_indices(values: &[usize]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut tail_at: Vec<usize> = Vec::new();
    let mut pred: Vec<Option<usize>> = vec![None; values.len()];

    for (i, &value) in values.iter().enumerate() {
        // First tail >= value: replacing it keeps the subsequence
        // strictly increasing.
        let slot = tails.partition_point(|&t| t < value);
        if slot == tails.len() {
            tails.push(value);
            tail_at.push(i);
        } else {
            tails[slot] = value;
            tail_at[slot] = i;
        }
        if slot > 0 {
            pred[i] = Some(tail_at[slot - 1]);
        }
    }

    let mut result = vec![0usize; tails.len()];
    let Some(&last) = tail_at.last() else {
        return Vec::new();
    };
    let mut current = last;
    for slot in (0..result.len()).rev() {
        result[slot] = current;
        if slot > 0 {
            current = pred[current].expect("broken predecessor chain in LIS reconstruction");
        }
    }
    result
}

/// Final report order: category, then File-A position; entries without
/// an A block sort after those with one, by File-B position.
fn compare_entries(x: &DiffEntry, y: &DiffEntry) -> Ordering {
    x.kind.cmp(&y.kind).then_with(|| {
        match (&x.block_a, &y.block_a) {
            (Some(a1), Some(a2)) => (a1.line_start, a1.id).cmp(&(a2.line_start, a2.id)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => match (&x.block_b, &y.block_b) {
                (Some(b1), Some(b2)) => (b1.line_start, b1.id).cmp(&(b2.line_start, b2.id)),
                _ => Ordering::Equal,
            },
        }
    })
}
