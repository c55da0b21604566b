//! End-to-end scenarios driving the public diff API.

use semdiff::engine::{perform_diff, DiffConfig, DiffEntry, DiffKind};
use semdiff::similarity::text_similarity;
use semdiff::text::normalize;

fn diff(a: &str, b: &str) -> Vec<DiffEntry> {
    perform_diff(a, b, &DiffConfig::default())
}

fn count(entries: &[DiffEntry], kind: DiffKind) -> usize {
    entries.iter().filter(|e| e.kind == kind).count()
}

#[test]
fn identical_files_yield_only_unchanged_blocks() {
    let content = "alpha\n\nbeta\n\ngamma\n";
    let entries = diff(content, content);
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e.kind == DiffKind::Unchanged));
}

#[test]
fn pure_insertion_keeps_surroundings_unchanged() {
    let a = "one\ntwo\nthree\nfour\nfive\n";
    let b = "one\ntwo\nthree\nNEW\nfour\nfive\n";
    let entries = diff(a, b);

    assert_eq!(count(&entries, DiffKind::Unchanged), 2);
    assert_eq!(count(&entries, DiffKind::Added), 1);
    assert_eq!(count(&entries, DiffKind::Deleted), 0);
    assert_eq!(count(&entries, DiffKind::Modified), 0);
    assert_eq!(count(&entries, DiffKind::Moved), 0);

    let added = entries
        .iter()
        .find(|e| e.kind == DiffKind::Added)
        .and_then(|e| e.block_b.as_ref())
        .unwrap();
    assert_eq!(added.original_text, "NEW");
    assert_eq!((added.line_start, added.line_end), (4, 4));
}

#[test]
fn swapped_paragraphs_classify_as_one_moved_one_unchanged() {
    let a = "H1\nH2\nH3\n\nX1\nX2\nX3\n";
    let b = "X1\nX2\nX3\n\nH1\nH2\nH3\n";
    let entries = diff(a, b);

    assert_eq!(count(&entries, DiffKind::Unchanged), 1);
    assert_eq!(count(&entries, DiffKind::Moved), 1);
    assert_eq!(count(&entries, DiffKind::Added), 0);
    assert_eq!(count(&entries, DiffKind::Deleted), 0);

    let moved = entries.iter().find(|e| e.kind == DiffKind::Moved).unwrap();
    assert!(moved
        .block_a
        .as_ref()
        .unwrap()
        .original_text
        .starts_with("H1"));
}

#[test]
fn light_edits_pair_as_modified_with_a_script() {
    let a = "the quick brown fox jumps high\nover the lazy dog sleeping there\nunder a bright warm summer sun\n";
    let b = "the quick brown fox leaps high\nover the lazy cat sleeping there\nunder a bright cold summer sun\n";
    let entries = diff(a, b);

    assert_eq!(count(&entries, DiffKind::Modified), 1);
    assert_eq!(count(&entries, DiffKind::Added), 0);
    assert_eq!(count(&entries, DiffKind::Deleted), 0);

    let modified = entries
        .iter()
        .find(|e| e.kind == DiffKind::Modified)
        .unwrap();
    assert!(modified.similarity >= 0.55);
    let script = modified.script.as_ref().unwrap();
    assert!(!script.is_empty());
}

#[test]
fn unrelated_paragraphs_split_into_deleted_and_added() {
    let a = "the quick brown fox jumps high\nover the lazy dog sleeping there\nunder a bright warm summer sun\n";
    let b = "completely different subject now\nnothing here resembles the source\nevery single line was rewritten\n";
    let entries = diff(a, b);

    assert_eq!(count(&entries, DiffKind::Modified), 0);
    assert_eq!(count(&entries, DiffKind::Deleted), 1);
    assert_eq!(count(&entries, DiffKind::Added), 1);
}

#[test]
fn similarity_exactly_at_threshold_is_accepted() {
    let a = "alpha beta gamma\ndelta epsilon zeta\neta theta iota";
    let b = "alpha beta gamma\ndelta epsilon zeta\neta theta iotas";
    let sim = text_similarity(&normalize(a), &normalize(b));
    assert!(sim > 0.0 && sim < 1.0);

    let mut config = DiffConfig::default();
    config.similarity_threshold = sim;
    let entries = perform_diff(a, b, &config);
    assert_eq!(count(&entries, DiffKind::Modified), 1);

    // Nudging the threshold above the score flips the outcome.
    config.similarity_threshold = sim + 1e-4;
    let entries = perform_diff(a, b, &config);
    assert_eq!(count(&entries, DiffKind::Modified), 0);
    assert_eq!(count(&entries, DiffKind::Deleted), 1);
    assert_eq!(count(&entries, DiffKind::Added), 1);
}

#[test]
fn equal_scores_resolve_to_the_lower_id_a_block() {
    let paragraph = "shared words in this paragraph\nrepeated across both candidates\nwith the same overall shape";
    let a = format!("{paragraph}\n\n{paragraph}");
    let b = "shared words in that paragraph\nrepeated across both contenders\nwith the same general shape";
    let entries = diff(&a, b);

    assert_eq!(count(&entries, DiffKind::Modified), 1);
    assert_eq!(count(&entries, DiffKind::Deleted), 1);

    let winner = entries
        .iter()
        .find(|e| e.kind == DiffKind::Modified)
        .and_then(|e| e.block_a.as_ref())
        .unwrap();
    let loser = entries
        .iter()
        .find(|e| e.kind == DiffKind::Deleted)
        .and_then(|e| e.block_a.as_ref())
        .unwrap();
    assert!(winner.id < loser.id);
    assert_eq!(winner.line_start, 1);
    assert_eq!(loser.line_start, 5);
}

#[test]
fn empty_sides_degenerate_cleanly() {
    let doc = "first paragraph line one\nfirst paragraph line two\n\nsecond paragraph here\n";

    let entries = diff("", doc);
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e.kind == DiffKind::Added));

    let entries = diff(doc, "");
    assert!(!entries.is_empty());
    assert!(entries.iter().all(|e| e.kind == DiffKind::Deleted));

    assert!(diff("", "").is_empty());
    assert!(diff("  \n\t\n  ", "\n\n").is_empty());
}

#[test]
fn repeated_runs_are_stable_across_invocations() {
    let a = "intro line alpha\nintro line beta\nintro line gamma\n\nbody text one here\nbody text two here\nbody text three here\n\ntail marker x\ntail marker y\ntail marker z\n";
    let b = "body text one here\nbody text two here\nbody text three here\n\nintro line alpha\nintro line beta\nintro line gamma\n\ntail marker x\ntail marker y\ntail marker z\n";

    let first = diff(a, b);
    let second = diff(a, b);
    let summarize = |entries: &[DiffEntry]| {
        entries
            .iter()
            .map(|e| {
                (
                    e.kind,
                    e.block_a.as_ref().map(|blk| (blk.id, blk.line_start)),
                    e.block_b.as_ref().map(|blk| (blk.id, blk.line_start)),
                )
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(summarize(&first), summarize(&second));
    assert_eq!(count(&first, DiffKind::Moved), 1);
}
