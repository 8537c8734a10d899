//! Patch application
//!
//! Patches are applied in descending start-offset order, splicing from the
//! end of the file backward so already-processed offsets are never
//! invalidated by earlier (higher-offset) splices.

use crate::planner::Patch;

/// Apply a patch list to the original text.
///
/// Patches sharing a start offset (several zero-width inserts at end of
/// file) are applied in reverse emission order, so the earlier-emitted
/// patch ends up closer to the start.
pub fn apply(original: &str, patches: &[Patch]) -> String {
    let mut sorted: Vec<(usize, &Patch)> = patches.iter().enumerate().collect();
    sorted.sort_by(|a, b| {
        b.1.start_offset
            .cmp(&a.1.start_offset)
            .then(b.0.cmp(&a.0))
    });

    let mut result = original.to_string();
    for (_, patch) in sorted {
        let start = patch.start_offset.min(result.len());
        let end = patch.end_offset.clamp(start, result.len());
        result.replace_range(start..end, &patch.replacement);
    }
    result
}

/// Opt-in overlap diagnostic.
///
/// Walks the descending-sorted list and reports every case where one
/// patch's end runs past the start of the patch before it. Overlaps are
/// logged, never raised: overlapping patches are still applied in
/// descending order and the later-in-file patch's text prevails over the
/// overlap. Callers wanting hard failure use the strict mode in `lib.rs`.
pub fn validate_patches(patches: &[Patch]) -> Vec<String> {
    let mut sorted: Vec<&Patch> = patches.iter().collect();
    sorted.sort_by(|a, b| b.start_offset.cmp(&a.start_offset));

    let mut warnings = Vec::new();
    for pair in sorted.windows(2) {
        let (higher, lower) = (pair[0], pair[1]);
        if lower.end_offset > higher.start_offset {
            let warning = format!(
                "patch {}..{} overlaps patch {}..{}",
                lower.start_offset, lower.end_offset, higher.start_offset, higher.end_offset
            );
            tracing::warn!(target: "quill_rewriter", "{}", warning);
            warnings.push(warning);
        }
    }
    warnings
}
