//! Budget allocation — packing classified files into a fixed token ceiling.
//!
//! Tiers are processed Critical → Structural → Code, lexicographic path
//! order within each tier, so identical inputs always produce identical
//! selections. Files that don't fit degrade instead of disappearing:
//! full content → truncated → path-only. The consumed counter never
//! exceeds the ceiling.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::{classify, PriorityTier};
use crate::scanner::FileRecord;
use crate::token::estimate_tokens;

/// Named allocation policy knobs. Defaults mirror the product's
/// configuration; tests override freely.
#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    /// Total token ceiling for the selection.
    pub ceiling: usize,
    /// Line cap applied when truncating an oversized file.
    pub truncate_max_lines: usize,
    /// Remaining-budget floor below which the Code tier short-circuits
    /// to path-only listing.
    pub code_tier_floor: usize,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            ceiling: 4096,
            truncate_max_lines: 200,
            code_tier_floor: 200,
        }
    }
}

/// Running budget: a fixed ceiling plus a consumed counter.
#[derive(Debug, Clone)]
pub struct Budget {
    ceiling: usize,
    consumed: usize,
}

impl Budget {
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling,
            consumed: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.ceiling - self.consumed
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Charge `tokens` if they fit; returns whether the charge landed.
    pub fn try_charge(&mut self, tokens: usize) -> bool {
        if tokens <= self.remaining() {
            self.consumed += tokens;
            true
        } else {
            false
        }
    }
}

/// A file selected into the context, full or truncated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: String,
    pub content: String,
    pub truncated: bool,
    pub tokens: usize,
}

/// Aggregate stats for a selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionStats {
    pub files_included: usize,
    pub files_path_only: usize,
    pub estimated_tokens: usize,
    pub ceiling: usize,
}

/// The allocator's output: ordered content sections, a path-only list,
/// and aggregate stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub included: Vec<SelectedFile>,
    pub path_only: Vec<String>,
    pub stats: SelectionStats,
}

/// Pack classified files into the ceiling.
///
/// Every non-excluded input file is processed to completion: it ends up
/// either in `included` (full or truncated) or in `path_only`. The only
/// shortcut is the Code-tier floor: once remaining budget drops below
/// it, all remaining Code files are path-listed without per-file checks.
/// Zero input files yields an empty, non-error result.
pub fn allocate(files: Vec<FileRecord>, policy: &AllocationPolicy) -> SelectionResult {
    let mut critical = Vec::new();
    let mut structural = Vec::new();
    let mut code = Vec::new();

    for file in files {
        match classify(&file.path) {
            PriorityTier::Critical => critical.push(file),
            PriorityTier::Structural => structural.push(file),
            PriorityTier::Code => code.push(file),
            // Excluded files are never read; one arriving here is a
            // caller mistake and is dropped.
            PriorityTier::Excluded => {}
        }
    }

    for tier in [&mut critical, &mut structural, &mut code] {
        tier.sort_by(|a, b| a.path.cmp(&b.path));
    }

    let mut budget = Budget::new(policy.ceiling);
    let mut included: Vec<SelectedFile> = Vec::new();
    let mut path_only: Vec<String> = Vec::new();

    // Critical and Structural: always attempt full, then truncation,
    // before falling back to path-only.
    for file in critical.into_iter().chain(structural) {
        place_with_truncation(file, policy, &mut budget, &mut included, &mut path_only);
    }

    // Code: proportional placement with a floor short-circuit.
    let mut code_iter = code.into_iter();
    for file in code_iter.by_ref() {
        if budget.remaining() < policy.code_tier_floor {
            debug!(
                remaining = budget.remaining(),
                floor = policy.code_tier_floor,
                "Code-tier floor reached, path-listing the rest"
            );
            path_only.push(file.path);
            break;
        }
        let tokens = file.estimated_tokens;
        if tokens < budget.remaining() * 3 / 10 && budget.try_charge(tokens) {
            included.push(SelectedFile {
                path: file.path,
                content: file.content,
                truncated: false,
                tokens,
            });
        } else if tokens < budget.remaining() {
            place_truncated_or_path_only(file, policy, &mut budget, &mut included, &mut path_only);
        } else {
            path_only.push(file.path);
        }
    }
    // Short-circuit remainder: no further per-file checks.
    path_only.extend(code_iter.map(|f| f.path));

    let stats = SelectionStats {
        files_included: included.len(),
        files_path_only: path_only.len(),
        estimated_tokens: budget.consumed(),
        ceiling: policy.ceiling,
    };

    SelectionResult {
        included,
        path_only,
        stats,
    }
}

/// Critical/Structural placement: full → truncated → path-only.
fn place_with_truncation(
    file: FileRecord,
    policy: &AllocationPolicy,
    budget: &mut Budget,
    included: &mut Vec<SelectedFile>,
    path_only: &mut Vec<String>,
) {
    let tokens = file.estimated_tokens;
    if budget.try_charge(tokens) {
        included.push(SelectedFile {
            path: file.path,
            content: file.content,
            truncated: false,
            tokens,
        });
        return;
    }
    place_truncated_or_path_only(file, policy, budget, included, path_only);
}

/// Truncate to the line cap; keep the file if the truncation fits,
/// otherwise record the path only.
fn place_truncated_or_path_only(
    file: FileRecord,
    policy: &AllocationPolicy,
    budget: &mut Budget,
    included: &mut Vec<SelectedFile>,
    path_only: &mut Vec<String>,
) {
    match truncate_lines(&file.content, policy.truncate_max_lines) {
        Some(truncated) => {
            let tokens = estimate_tokens(&truncated);
            if budget.try_charge(tokens) {
                included.push(SelectedFile {
                    path: file.path,
                    content: truncated,
                    truncated: true,
                    tokens,
                });
            } else {
                path_only.push(file.path);
            }
        }
        // Already within the line cap: truncation can't shrink it.
        None => path_only.push(file.path),
    }
}

/// Cut `content` to its first `max_lines` lines with a trailing omission
/// marker. Returns `None` when the content is already within the cap.
fn truncate_lines(content: &str, max_lines: usize) -> Option<String> {
    let total = content.lines().count();
    if total <= max_lines {
        return None;
    }
    let mut kept: String = content
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n");
    kept.push_str(&format!("\n… {} lines omitted", total - max_lines));
    Some(kept)
}
