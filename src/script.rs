use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Equal,
    Delete,
    Insert,
}

/// One operation of a line-level edit script. Presentation only; the
/// classifier never reads these back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    pub kind: EditKind,
    pub text: String,
}

/// Line-level edit script between two block texts, cleaned up for
/// display: adjacent same-kind operations are merged and equal runs
/// that are pure whitespace between two edits are dropped.
pub fn line_script(a: &str, b: &str) -> Vec<EditOp> {
    let diff = TextDiff::from_lines(a, b);
    let mut ops = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => EditKind::Equal,
            ChangeTag::Delete => EditKind::Delete,
            ChangeTag::Insert => EditKind::Insert,
        };
        ops.push(EditOp {
            kind,
            text: change.value().to_string(),
        });
    }
    drop_noise_equals(merge_adjacent(ops))
}

fn merge_adjacent(ops: Vec<EditOp>) -> Vec<EditOp> {
    let mut merged: Vec<EditOp> = Vec::with_capacity(ops.len());
    for op in ops {
        match merged.last_mut() {
            Some(last) if last.kind == op.kind => last.text.push_str(&op.text),
            _ => merged.push(op),
        }
    }
    merged
}

fn drop_noise_equals(ops: Vec<EditOp>) -> Vec<EditOp> {
    let len = ops.len();
    ops.into_iter()
        .enumerate()
        .filter(|(i, op)| {
            let interior = *i > 0 && *i + 1 < len;
            !(interior && op.kind == EditKind::Equal && op.text.trim().is_empty())
        })
        .map(|(_, op)| op)
        .collect()
}
