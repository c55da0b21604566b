use std::io::{self, Write};

use anyhow::{bail, Context, Result};

use crate::engine::{DiffEntry, DiffKind};
use crate::script::{EditKind, EditOp};

pub const MAX_MOVED_SUMMARIES: usize = 5;
pub const MAX_MODIFIED_SUMMARIES: usize = 3;

/// Extra blank lines tolerated between blocks that still coalesce into
/// one detailed report item.
const COALESCE_MAX_GAP: usize = 1;

const SECTION_ORDER: [DiffKind; 5] = [
    DiffKind::Added,
    DiffKind::Deleted,
    DiffKind::Moved,
    DiffKind::Modified,
    DiffKind::Unchanged,
];

/// Which categories render fully instead of as compact summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetailSelection {
    added: bool,
    deleted: bool,
    modified: bool,
    moved: bool,
    unchanged: bool,
}

impl DetailSelection {
    /// Parses the `--details` value: `all` or a comma-separated list of
    /// new|added, deleted, changed|modified, moved, unchanged.
    pub fn parse(value: &str) -> Result<Self> {
        if value.trim() == "all" {
            return Ok(DetailSelection {
                added: true,
                deleted: true,
                modified: true,
                moved: true,
                unchanged: true,
            });
        }
        let mut selection = DetailSelection::default();
        for token in value.split(',') {
            match token.trim().to_lowercase().as_str() {
                "new" | "added" => selection.added = true,
                "deleted" => selection.deleted = true,
                "changed" | "modified" => selection.modified = true,
                "moved" => selection.moved = true,
                "unchanged" => selection.unchanged = true,
                other => bail!(
                    "unknown --details section '{other}' \
                     (expected new, deleted, changed, moved, unchanged or all)"
                ),
            }
        }
        Ok(selection)
    }

    pub fn shows(&self, kind: DiffKind) -> bool {
        match kind {
            DiffKind::Added => self.added,
            DiffKind::Deleted => self.deleted,
            DiffKind::Modified => self.modified,
            DiffKind::Moved => self.moved,
            DiffKind::Unchanged => self.unchanged,
        }
    }
}

/// Inclusive File-A line range for query mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusRange {
    pub start: usize,
    pub end: usize,
}

impl FocusRange {
    /// Parses `n,m` with positive `n <= m`.
    pub fn parse(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 2 {
            bail!("--focus expects n,m (e.g. --focus 10,20), got: {value}");
        }
        let start: usize = parts[0]
            .trim()
            .parse()
            .with_context(|| format!("invalid --focus start line: {}", parts[0].trim()))?;
        let end: usize = parts[1]
            .trim()
            .parse()
            .with_context(|| format!("invalid --focus end line: {}", parts[1].trim()))?;
        if start == 0 || end < start {
            bail!("--focus expects positive line numbers n,m with n <= m, got: {value}");
        }
        Ok(FocusRange { start, end })
    }

    pub fn contains(&self, line: usize) -> bool {
        line >= self.start && line <= self.end
    }
}

fn section_token(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Added => "new",
        DiffKind::Deleted => "deleted",
        DiffKind::Modified => "changed",
        DiffKind::Moved => "moved",
        DiffKind::Unchanged => "unchanged",
    }
}

/// Replaces newlines with a visible mark and caps the length for
/// one-line quoting.
fn summarize(text: &str, detailed: bool) -> String {
    let flat = text.replace('\n', "\u{21b5} ");
    let max_len = if detailed { 80 } else { 60 };
    let chars: Vec<char> = flat.chars().collect();
    if chars.len() > max_len {
        let mut cut: String = chars[..max_len - 3].iter().collect();
        cut.push_str("...");
        cut
    } else {
        flat
    }
}

fn span_lines(start: usize, end: usize) -> usize {
    end.saturating_sub(start) + 1
}

fn write_script(script: &[EditOp], out: &mut dyn Write) -> io::Result<()> {
    for op in script {
        for line in op.text.trim_end_matches('\n').split('\n') {
            if line.trim().is_empty() && op.kind == EditKind::Equal {
                continue;
            }
            let prefix = match op.kind {
                EditKind::Insert => "+ ",
                EditKind::Delete => "- ",
                EditKind::Equal => "  ",
            };
            writeln!(out, "      {prefix}{line}")?;
        }
    }
    Ok(())
}

/// Renders the grouped block report: one section per non-empty
/// category, compact or detailed per the selection.
pub fn render_report(
    entries: &[DiffEntry],
    details: &DetailSelection,
    out: &mut dyn Write,
) -> io::Result<()> {
    if entries.is_empty() {
        writeln!(out, "Files are semantically identical at the block level.")?;
        return Ok(());
    }

    for kind in SECTION_ORDER {
        let group: Vec<&DiffEntry> = entries.iter().filter(|e| e.kind == kind).collect();
        if group.is_empty() {
            continue;
        }

        let show_details = details.shows(kind);
        let title = if kind == DiffKind::Unchanged && !show_details {
            "UNCHANGED (IN PLACE)"
        } else {
            kind.label()
        };
        writeln!(out, "\n# {title} BLOCKS")?;

        if show_details {
            render_detailed(&group, kind, out)?;
        } else {
            render_compact(&group, kind, out)?;
        }
    }
    Ok(())
}

fn render_compact(group: &[&DiffEntry], kind: DiffKind, out: &mut dyn Write) -> io::Result<()> {
    match kind {
        DiffKind::Added => {
            let total_lines: usize = group
                .iter()
                .filter_map(|e| e.block_b.as_ref())
                .map(|b| span_lines(b.line_start, b.line_end))
                .sum();
            writeln!(
                out,
                "  Total: {} new blocks (approx {} lines in File B).",
                group.len(),
                total_lines
            )?;
        }
        DiffKind::Deleted => {
            let total_lines: usize = group
                .iter()
                .filter_map(|e| e.block_a.as_ref())
                .map(|a| span_lines(a.line_start, a.line_end))
                .sum();
            writeln!(
                out,
                "  Total: {} deleted blocks (approx {} lines from File A).",
                group.len(),
                total_lines
            )?;
        }
        DiffKind::Unchanged => {
            writeln!(
                out,
                "  Total: {} blocks found to be unchanged and in the same relative order.",
                group.len()
            )?;
        }
        DiffKind::Moved => {
            let total_lines: usize = group
                .iter()
                .filter_map(|e| e.block_a.as_ref())
                .map(|a| span_lines(a.line_start, a.line_end))
                .sum();
            writeln!(
                out,
                "  Moved {} blocks (approx {} lines from File A):",
                group.len(),
                total_lines
            )?;
            for entry in group.iter().take(MAX_MOVED_SUMMARIES) {
                let (a, b) = match (&entry.block_a, &entry.block_b) {
                    (Some(a), Some(b)) => (a, b),
                    _ => continue,
                };
                let mut summary = format!(
                    "A_ID:{} (L{}-{}) -> B_ID:{} (L{}-{})",
                    a.id, a.line_start, a.line_end, b.id, b.line_start, b.line_end
                );
                if entry.similarity > 0.0 && entry.similarity < 0.9999 {
                    summary.push_str(&format!(" [Sim: {:.2}]", entry.similarity));
                }
                writeln!(out, "    - {summary}")?;
            }
            if group.len() > MAX_MOVED_SUMMARIES {
                writeln!(
                    out,
                    "    ... and {} more moved blocks.",
                    group.len() - MAX_MOVED_SUMMARIES
                )?;
            }
        }
        DiffKind::Modified => {
            writeln!(out, "  Total: {} blocks changed.", group.len())?;
            for entry in group.iter().take(MAX_MODIFIED_SUMMARIES) {
                let (a, b) = match (&entry.block_a, &entry.block_b) {
                    (Some(a), Some(b)) => (a, b),
                    _ => continue,
                };
                writeln!(
                    out,
                    "    ~ A_ID:{} (L{}-{}) vs B_ID:{} (L{}-{}) (Sim: {:.2})",
                    a.id, a.line_start, a.line_end, b.id, b.line_start, b.line_end, entry.similarity
                )?;
            }
            if group.len() > MAX_MODIFIED_SUMMARIES {
                writeln!(
                    out,
                    "    ... and {} more changed blocks.",
                    group.len() - MAX_MODIFIED_SUMMARIES
                )?;
            }
        }
    }

    let token = section_token(kind);
    if kind == DiffKind::Modified {
        writeln!(out, "  (Use --details including '{token}' to see content.)")?;
    } else {
        writeln!(out, "  (Use --details including '{token}' to list them.)")?;
    }
    Ok(())
}

/// Running state while folding adjacent entries into one report item.
struct Coalesced {
    start_a: usize,
    end_a: usize,
    start_b: usize,
    end_b: usize,
    text_a: String,
    text_b: String,
}

impl Coalesced {
    fn begin(entry: &DiffEntry) -> Self {
        let (start_a, end_a) = entry
            .block_a
            .as_ref()
            .map_or((0, 0), |a| (a.line_start, a.line_end));
        let (start_b, end_b) = entry
            .block_b
            .as_ref()
            .map_or((0, 0), |b| (b.line_start, b.line_end));
        Coalesced {
            start_a,
            end_a,
            start_b,
            end_b,
            text_a: entry
                .block_a
                .as_ref()
                .map_or(String::new(), |a| a.original_text.clone()),
            text_b: entry
                .block_b
                .as_ref()
                .map_or(String::new(), |b| b.original_text.clone()),
        }
    }

    /// Whether `entry` starts close enough to the running range end to
    /// fold into the same item.
    fn accepts(&self, entry: &DiffEntry, kind: DiffKind) -> bool {
        let near_a = entry
            .block_a
            .as_ref()
            .is_some_and(|a| a.line_start <= self.end_a + 1 + COALESCE_MAX_GAP);
        let near_b = entry
            .block_b
            .as_ref()
            .is_some_and(|b| b.line_start <= self.end_b + 1 + COALESCE_MAX_GAP);
        match kind {
            DiffKind::Added => near_b,
            DiffKind::Deleted => near_a,
            DiffKind::Modified | DiffKind::Moved | DiffKind::Unchanged => near_a && near_b,
        }
    }

    fn absorb(&mut self, entry: &DiffEntry) {
        if let Some(a) = &entry.block_a {
            Self::append(&mut self.text_a, &a.original_text, self.end_a, a.line_start);
            self.end_a = self.end_a.max(a.line_end);
        }
        if let Some(b) = &entry.block_b {
            Self::append(&mut self.text_b, &b.original_text, self.end_b, b.line_start);
            self.end_b = self.end_b.max(b.line_end);
        }
    }

    fn append(combined: &mut String, text: &str, current_end: usize, next_start: usize) {
        if !combined.is_empty() {
            if next_start > current_end + 1 {
                for _ in 0..next_start - (current_end + 1) {
                    combined.push('\n');
                }
            } else {
                combined.push_str("\n\n");
            }
        }
        combined.push_str(text);
    }
}

fn render_detailed(group: &[&DiffEntry], kind: DiffKind, out: &mut dyn Write) -> io::Result<()> {
    let mut i = 0;
    while i < group.len() {
        let first = group[i];
        let mut item = Coalesced::begin(first);

        let mut j = i + 1;
        while j < group.len() && item.accepts(group[j], kind) {
            item.absorb(group[j]);
            j += 1;
        }

        match kind {
            DiffKind::Added => {
                writeln!(out, "  + File B Lines ~{}-{}:", item.start_b, item.end_b)?;
                writeln!(out, "    \"{}\"", summarize(&item.text_b, true))?;
            }
            DiffKind::Deleted => {
                writeln!(out, "  - File A Lines ~{}-{}:", item.start_a, item.end_a)?;
                writeln!(out, "    \"{}\"", summarize(&item.text_a, true))?;
            }
            DiffKind::Modified => {
                writeln!(
                    out,
                    "  ~ File A Lines ~{}-{} vs File B Lines ~{}-{}",
                    item.start_a, item.end_a, item.start_b, item.end_b
                )?;
                writeln!(
                    out,
                    "    (Overall Block Similarity: {:.2})",
                    first.similarity
                )?;
                match &first.script {
                    Some(script) if !script.is_empty() && j - i == 1 => {
                        writeln!(out, "    Line-level changes (for first block in sequence):")?;
                        write_script(script, out)?;
                    }
                    _ => {
                        writeln!(out, "    Block A Content: \"{}\"", summarize(&item.text_a, true))?;
                        writeln!(out, "    Block B Content: \"{}\"", summarize(&item.text_b, true))?;
                    }
                }
            }
            DiffKind::Moved => {
                writeln!(
                    out,
                    "  M File A Lines ~{}-{} moved to",
                    item.start_a, item.end_a
                )?;
                writeln!(out, "    Content (from A): \"{}\"", summarize(&item.text_a, true))?;
                writeln!(out, "  M File B Lines ~{}-{}", item.start_b, item.end_b)?;
                if item.text_a != item.text_b && !item.text_b.is_empty() {
                    writeln!(
                        out,
                        "    Content (from B, if different): \"{}\"",
                        summarize(&item.text_b, true)
                    )?;
                }
                if first.similarity > 0.0 && first.similarity < 0.9999 {
                    writeln!(
                        out,
                        "    (Note: Initial pair in sequence may also be modified, Similarity to B: {:.2})",
                        first.similarity
                    )?;
                }
            }
            DiffKind::Unchanged => {
                writeln!(
                    out,
                    "  = File A Lines ~{}-{} matches",
                    item.start_a, item.end_a
                )?;
                writeln!(out, "  = File B Lines ~{}-{}", item.start_b, item.end_b)?;
                writeln!(out, "    \"{}\"", summarize(&item.text_a, true))?;
            }
        }
        i = j;
    }
    Ok(())
}

/// Query mode: walks the focused File-A line range and reports, once
/// per block, the diff entry covering each line.
pub fn render_focus(
    content_a: &str,
    entries: &[DiffEntry],
    focus: FocusRange,
    out: &mut dyn Write,
) -> io::Result<()> {
    writeln!(
        out,
        "\n--- Focus on File A Lines {}-{} ---",
        focus.start, focus.end
    )?;

    let normalized = content_a.replace("\r\n", "\n").replace('\r', "\n");
    let file_lines: Vec<&str> = normalized.split('\n').collect();

    let mut with_a: Vec<&DiffEntry> = entries.iter().filter(|e| e.block_a.is_some()).collect();
    with_a.sort_by_key(|e| e.block_a.as_ref().map(|a| a.line_start));

    let mut last_key = String::new();
    let mut line = focus.start;
    while line <= focus.end {
        if line > file_lines.len() {
            writeln!(out, "\nLine A:{line}: (Beyond end of File A)")?;
            break;
        }

        let covering = with_a
            .iter()
            .find(|e| e.block_a.as_ref().is_some_and(|a| a.covers_line(line)));

        let Some(entry) = covering else {
            writeln!(out, "\nLine A:{}: \"{}\"", line, file_lines[line - 1])?;
            writeln!(out, "  Status: Line not part of any reported diff block.")?;
            line += 1;
            continue;
        };

        let block_a = entry.block_a.as_ref().expect("focus entry without A block");
        let key = format!("{}-A{}", entry.kind.label(), block_a.id);
        if key != last_key {
            writeln!(
                out,
                "\nLines A:{}-{} are part of a {} block (Original A Lines: {}-{}):",
                focus.start.max(block_a.line_start),
                focus.end.min(block_a.line_end),
                entry.kind.label(),
                block_a.line_start,
                block_a.line_end
            )?;

            match entry.kind {
                DiffKind::Deleted => {
                    writeln!(
                        out,
                        "    Content (from A): \"{}\"",
                        summarize(&block_a.original_text, true)
                    )?;
                }
                DiffKind::Unchanged => {
                    if let Some(block_b) = &entry.block_b {
                        writeln!(
                            out,
                            "    Matched with File B Lines: ~{}-{}",
                            block_b.line_start, block_b.line_end
                        )?;
                    }
                    writeln!(
                        out,
                        "    Content: \"{}\"",
                        summarize(&block_a.original_text, true)
                    )?;
                }
                DiffKind::Moved => {
                    if let Some(block_b) = &entry.block_b {
                        writeln!(
                            out,
                            "    Moved to File B Lines: ~{}-{}",
                            block_b.line_start, block_b.line_end
                        )?;
                    }
                    writeln!(
                        out,
                        "    Content (from A): \"{}\"",
                        summarize(&block_a.original_text, true)
                    )?;
                    if entry.similarity > 0.0 && entry.similarity < 0.9999 {
                        writeln!(
                            out,
                            "    (Note: Content also modified, Block Similarity: {:.2})",
                            entry.similarity
                        )?;
                    }
                }
                DiffKind::Modified => {
                    if let Some(block_b) = &entry.block_b {
                        writeln!(
                            out,
                            "    Changed from/to File B Lines: ~{}-{}",
                            block_b.line_start, block_b.line_end
                        )?;
                    }
                    writeln!(
                        out,
                        "    (Overall Block Similarity: {:.2})",
                        entry.similarity
                    )?;
                    if let Some(script) = &entry.script {
                        if !script.is_empty() {
                            writeln!(out, "    Line-level changes within this block:")?;
                            write_script(script, out)?;
                        }
                    }
                }
                DiffKind::Added => {}
            }
            last_key = key;
        }
        line = focus.end.min(block_a.line_end) + 1;
    }
    Ok(())
}
