use jar_rewriter::patch::{
    parse_patch, parse_rejects, render_reject, HunkFailure, HunkStatus, LineBuffer, Patch,
    PatchEngine, PatchOptions,
};
use proptest::prelude::*;

fn numbered(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("line {i}")).collect()
}

fn text_of(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn section(body: &str) -> Patch {
    let text = format!("--- a/Target.java\n+++ b/Target.java\n{body}");
    parse_patch(&text).unwrap().remove(0)
}

fn engine(max_fuzz: usize) -> PatchEngine {
    PatchEngine::new(PatchOptions {
        max_fuzz,
        ..PatchOptions::default()
    })
}

fn apply(engine: &PatchEngine, patch: &Patch, text: &str) -> (String, Vec<HunkStatus>) {
    let mut buffer = LineBuffer::from_text(text);
    let statuses = engine
        .apply_to_buffer(patch, &mut buffer)
        .into_iter()
        .map(|report| report.status)
        .collect();
    (buffer.to_text(), statuses)
}

/// A hunk replacing line `at` (0-based) of a numbered file with `replacement`.
fn replace_hunk(at: usize, replacement: &[&str]) -> String {
    let mut hunk = format!(
        "@@ -{},1 +{},{} @@\n-line {at}\n",
        at + 1,
        at + 1,
        replacement.len()
    );
    for line in replacement {
        hunk.push('+');
        hunk.push_str(line);
        hunk.push('\n');
    }
    hunk
}

proptest! {
    #[test]
    fn test_context_only_hunk_is_a_no_op(
        (count, start, len) in (1usize..40)
            .prop_flat_map(|count| (Just(count), 0..count))
            .prop_flat_map(|(count, start)| (Just(count), Just(start), 1..=count - start))
    ) {
        let lines = numbered(count);
        let text = text_of(&lines);

        let mut body = format!("@@ -{},{len} +{},{len} @@\n", start + 1, start + 1);
        for line in &lines[start..start + len] {
            body.push(' ');
            body.push_str(line);
            body.push('\n');
        }

        let (patched, statuses) = apply(&engine(0), &section(&body), &text);
        prop_assert_eq!(patched, text);
        prop_assert_eq!(statuses, vec![HunkStatus::Success]);
    }

    #[test]
    fn test_fuzz_applies_exactly_within_the_window(
        count in 2usize..30,
        at in 0usize..30,
        shift in 0usize..8,
        max_fuzz in 0usize..6,
    ) {
        let at = at % count;
        let mut lines = vec![String::new(); shift];
        lines.extend(numbered(count));
        let text = text_of(&lines);

        let patch = section(&replace_hunk(at, &["changed"]));
        let (patched, statuses) = apply(&engine(max_fuzz), &patch, &text);

        if shift > max_fuzz {
            prop_assert_eq!(statuses, vec![HunkStatus::Failed]);
            prop_assert_eq!(patched, text);
        } else {
            let expected = if shift == 0 {
                HunkStatus::Success
            } else {
                HunkStatus::Fuzzed(shift)
            };
            prop_assert_eq!(statuses, vec![expected]);
            lines[shift + at] = "changed".to_string();
            prop_assert_eq!(patched, text_of(&lines));
        }
    }

    #[test]
    fn test_disjoint_hunks_commute(
        first in 0usize..20,
        gap in 1usize..10,
        tail in 0usize..5,
    ) {
        let second = first + gap;
        let text = text_of(&numbered(second + tail + 1));

        // The first hunk grows the file by one line.
        let grow = replace_hunk(first, &["new first", "extra first"]);
        let swap = replace_hunk(second, &["new second"]);
        let combined = section(&format!("{grow}{swap}"));

        let (together, statuses) = apply(&engine(0), &combined, &text);
        prop_assert_eq!(statuses, vec![HunkStatus::Success, HunkStatus::Success]);

        // Applied separately, the second hunk needs one line of fuzz when
        // the first goes in ahead of it.
        let fuzzy = engine(1);
        let (grown, _) = apply(&fuzzy, &section(&grow), &text);
        let (forward, statuses) = apply(&fuzzy, &section(&swap), &grown);
        prop_assert_eq!(statuses, vec![HunkStatus::Fuzzed(1)]);

        let (swapped, _) = apply(&fuzzy, &section(&swap), &text);
        let (backward, statuses) = apply(&fuzzy, &section(&grow), &swapped);
        prop_assert_eq!(statuses, vec![HunkStatus::Success]);

        prop_assert_eq!(&together, &forward);
        prop_assert_eq!(&together, &backward);
    }
}

#[test]
fn test_dependent_hunks_apply_only_in_document_order() {
    let text = "a\nb\nc\nd\ne\n";
    let upper_c = "@@ -2,3 +2,3 @@\n b\n-c\n+C\n d\n";
    let upper_d = "@@ -3,3 +3,3 @@\n C\n-d\n+D\n e\n";

    let (patched, statuses) = apply(&engine(0), &section(&format!("{upper_c}{upper_d}")), text);
    assert_eq!(statuses, vec![HunkStatus::Success, HunkStatus::Success]);
    assert_eq!(patched, "a\nb\nC\nD\ne\n");

    let reversed = section(&format!("{upper_d}{upper_c}"));
    let mut buffer = LineBuffer::from_text(text);
    let reports = engine(0).apply_to_buffer(&reversed, &mut buffer);
    assert_eq!(reports[0].status, HunkStatus::Failed);
    assert!(matches!(
        reports[0].failure,
        Some(HunkFailure::ContextMismatch { expected_line: 3, .. })
    ));
    assert_eq!(reports[1].status, HunkStatus::Success);
    assert_eq!(buffer.to_text(), "a\nb\nC\nd\ne\n");
}

#[test]
fn test_failed_hunks_survive_a_reject_round_trip() {
    let patch = section(
        "\
@@ -1,4 +1,5 @@
 package net.minecraft;

-public class Block {
+public class Block extends Base {
+    // marker
 }
@@ -20,2 +21,1 @@
-    int unused;
 }
",
    );

    let rendered: String = patch.hunks.iter().map(render_reject).collect();
    let parsed = parse_rejects(&rendered).unwrap();

    assert_eq!(parsed, patch.hunks);
    assert_eq!(parsed[1].id, 2);
}
