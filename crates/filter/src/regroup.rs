//! Fuzzy handle regrouping and per-group catalog formatting.
//!
//! Vendor feeds list the same product under slightly different titles
//! (typos, size suffixes). Titles are clustered by similarity, each cluster
//! gets one handle derived from its first-seen title, and every group is then
//! laid out the way the catalog import expects: one primary row carrying the
//! descriptive metadata, followed by image-only rows.

use std::collections::HashMap;

use fuzzywuzzy::fuzz;

use crate::diff::KeyPolicy;
use crate::model::Table;

// ---------------------------------------------------------------------------
// Similarity
// ---------------------------------------------------------------------------

fn comparable(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Title similarity on a 0–100 scale, ignoring case and surrounding spaces.
pub fn similarity(a: &str, b: &str) -> u8 {
    fuzz::ratio(&comparable(a), &comparable(b))
}

/// Smallest integer score satisfying `score / 100 >= threshold`.
fn min_score(threshold: f64) -> u8 {
    ((threshold * 100.0) - 1e-9).ceil().clamp(0.0, 100.0) as u8
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

/// Disjoint-set forest whose roots are always the lowest index in their set.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self { parent: (0..len).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

/// Upper bound of `fuzz::ratio` for strings of these lengths: at most the
/// shorter string can match, so the score never exceeds `200 * short / total`.
fn may_reach(a: usize, b: usize, min: u8) -> bool {
    let total = a + b;
    if total == 0 {
        return true;
    }
    let bound = (200.0 * a.min(b) as f64 / total as f64).round();
    bound >= f64::from(min)
}

/// For each title (in first-seen order), the index of its cluster
/// representative. Any pair scoring at or above `threshold` (0.0–1.0) joins
/// the same cluster; the representative is the cluster's first-seen title.
///
/// Every pair is scored, so cost is quadratic in the number of distinct
/// titles; pairs whose lengths alone rule out a match are skipped unscored.
pub fn cluster_titles(titles: &[String], threshold: f64) -> Vec<usize> {
    let comparable: Vec<String> = titles.iter().map(|t| comparable(t)).collect();
    let lengths: Vec<usize> = comparable.iter().map(|t| t.chars().count()).collect();
    let min = min_score(threshold);
    let mut set = DisjointSet::new(titles.len());

    for i in 0..titles.len() {
        for j in (i + 1)..titles.len() {
            if set.find(i) == set.find(j) {
                continue;
            }
            if !may_reach(lengths[i], lengths[j], min) {
                continue;
            }
            if fuzz::ratio(&comparable[i], &comparable[j]) >= min {
                set.union(i, j);
            }
        }
    }

    (0..titles.len()).map(|i| set.find(i)).collect()
}

/// Catalog handle for a title: lower-case, spaces and slashes to hyphens,
/// ampersands spelled out.
pub fn derive_handle(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace('/', "-")
        .replace('&', "and")
}

// ---------------------------------------------------------------------------
// Regroup
// ---------------------------------------------------------------------------

fn cell_at(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Overwrite the grouping column with cluster handles. Returns the number of
/// clusters.
///
/// Untitled rows (image-only rows) take the title of the first titled row
/// sharing their original grouping key; rows with nothing to inherit keep
/// their grouping key as is. The grouping column is appended if absent.
pub fn regroup_handles(
    table: &mut Table,
    title: &str,
    group: &str,
    threshold: f64,
    policy: KeyPolicy,
) -> usize {
    let Some(title_idx) = table.column_index(title) else {
        return 0;
    };
    let original_group_idx = table.column_index(group);

    let mut group_titles: HashMap<String, String> = HashMap::new();
    if let Some(gi) = original_group_idx {
        for row in &table.rows {
            let (g, t) = (cell_at(row, gi), cell_at(row, title_idx));
            if !g.is_empty() && !t.trim().is_empty() {
                group_titles.entry(policy.key(g).into_owned()).or_insert_with(|| t.to_string());
            }
        }
    }

    let effective: Vec<Option<String>> = table
        .rows
        .iter()
        .map(|row| {
            let t = cell_at(row, title_idx);
            if !t.trim().is_empty() {
                return Some(t.to_string());
            }
            let g = cell_at(row, original_group_idx?);
            if g.is_empty() {
                return None;
            }
            group_titles.get(&*policy.key(g)).cloned()
        })
        .collect();

    let mut titles: Vec<String> = Vec::new();
    let mut title_index: HashMap<String, usize> = HashMap::new();
    for t in effective.iter().flatten() {
        if !title_index.contains_key(t) {
            title_index.insert(t.clone(), titles.len());
            titles.push(t.clone());
        }
    }

    let reps = cluster_titles(&titles, threshold);
    let handles: Vec<String> = reps.iter().map(|&r| derive_handle(&titles[r])).collect();
    let mut clusters = reps.clone();
    clusters.sort_unstable();
    clusters.dedup();

    log::debug!("regroup: {} distinct titles in {} clusters", titles.len(), clusters.len());

    let group_idx = table.ensure_column(group);
    for (row, t) in effective.iter().enumerate() {
        if let Some(t) = t {
            table.set_cell(row, group_idx, handles[title_index[t]].clone());
        }
    }

    clusters.len()
}

// ---------------------------------------------------------------------------
// Per-group formatting
// ---------------------------------------------------------------------------

/// Lay each group out as one primary row plus image rows.
///
/// Within every group (rows sharing a grouping key, original order), only the
/// first row keeps the `metadata` columns; later rows have them blanked. The
/// image-position column gets 1-based positions per group. Rows with an empty
/// grouping key are their own group. Missing metadata columns are ignored;
/// the grouping and image-position columns are appended if absent.
pub fn format_groups(
    table: &mut Table,
    group: &str,
    image_position: &str,
    metadata: &[String],
    policy: KeyPolicy,
) {
    let group_idx = table.ensure_column(group);
    let position_idx = table.ensure_column(image_position);
    let metadata_idx: Vec<usize> = metadata
        .iter()
        .filter_map(|m| table.column_index(m))
        .filter(|&i| i != group_idx && i != position_idx)
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in 0..table.len() {
        let key = table.cell(row, group_idx);
        let position = if key.is_empty() {
            1
        } else {
            let count = counts.entry(policy.key(key).into_owned()).or_insert(0);
            *count += 1;
            *count
        };

        if position > 1 {
            for &i in &metadata_idx {
                table.set_cell(row, i, "");
            }
        }
        table.set_cell(row, position_idx, position.to_string());
    }
}
