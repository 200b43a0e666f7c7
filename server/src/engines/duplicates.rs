//! Duplicate engine (spec §4.5): tokenize → normalize → shingle → MinHash →
//! LSH-band → verify → union-find group → per-file hotspot roll-up.
//!
//! Grounded in the teacher's `DuplicateDetectionEngine`, with one deliberate
//! departure: the teacher does naive O(n²) pairwise comparison and notes "would
//! use LSH in production" — step 6 here actually bands the signatures, which
//! is what makes this scale past a handful of files.

use crate::cancel::CancellationToken;
use crate::config::DuplicateConfig;
use crate::error::Result;
use crate::model::{CloneEdge, CloneGroup, CloneType, CodeFragment, DuplicationHotspot};
use crate::parser::{AutoParser, ParserFacade};
use crate::stats::clamp01;
use crate::tokenize::{self, IdentifierTable};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneSummary {
    pub total_files: usize,
    pub total_fragments: usize,
    pub duplicate_lines: usize,
    pub total_lines: usize,
    pub duplication_ratio: f64,
    pub clone_groups: usize,
    pub average_similarity: f64,
    pub largest_group_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneReport {
    pub clones: Vec<CloneEdge>,
    pub groups: Vec<CloneGroup>,
    pub hotspots: Vec<DuplicationHotspot>,
    pub summary: CloneSummary,
}

struct Fragment {
    record: CodeFragment,
    path: String,
}

pub fn analyze(
    paths: &[PathBuf],
    config: &DuplicateConfig,
    cancel: &CancellationToken,
) -> Result<CloneReport> {
    let identifiers = IdentifierTable::new();
    let next_id = AtomicUsize::new(0);

    // Parallel map over files (spec's worker-pool file-processing facade):
    // each worker owns its own parser handle and tokenizes independently;
    // the identifier table is the one piece of shared state, and it is
    // safe for concurrent access (DashMap-backed, atomic counter).
    let per_file: Vec<(usize, Vec<Fragment>)> = paths
        .par_iter()
        .map(|path| {
            if cancel.is_cancelled() {
                return (0, Vec::new());
            }
            if config.max_file_size > 0 {
                if let Ok(meta) = std::fs::metadata(path) {
                    if meta.len() > config.max_file_size {
                        return (0, Vec::new());
                    }
                }
            }

            let parser = AutoParser;
            let parsed = match parser.parse(path) {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unparseable file");
                    return (0, Vec::new());
                }
            };
            let line_count = parsed.source.lines().count();
            let path_str = path.display().to_string();

            let mut file_fragments = Vec::new();
            for function in &parsed.functions {
                if let Some(fragment) = build_fragment(
                    &next_id,
                    &path_str,
                    function.start_line,
                    function.end_line,
                    &function.body,
                    &identifiers,
                    config,
                ) {
                    file_fragments.push(fragment);
                }
            }

            if file_fragments.is_empty() {
                if let Some(fragment) = build_fragment(
                    &next_id,
                    &path_str,
                    1,
                    line_count.max(1),
                    &parsed.source,
                    &identifiers,
                    config,
                ) {
                    file_fragments.push(fragment);
                }
            }

            (line_count, file_fragments)
        })
        .collect();

    cancel.check()?;

    let mut fragments: Vec<Fragment> = Vec::new();
    let mut total_lines = 0usize;
    for (lines, frags) in per_file {
        total_lines += lines;
        fragments.extend(frags);
    }

    let clones = find_clone_pairs(&fragments, config);
    let groups = group_clones(&fragments, &clones, config.min_group_size);
    let summary = compute_summary(paths.len(), &fragments, &groups, total_lines);
    let hotspots = compute_hotspots(&fragments, &clones);

    Ok(CloneReport {
        clones,
        groups,
        hotspots,
        summary,
    })
}

fn build_fragment(
    next_id: &AtomicUsize,
    path: &str,
    start_line: usize,
    end_line: usize,
    body: &str,
    identifiers: &IdentifierTable,
    config: &DuplicateConfig,
) -> Option<Fragment> {
    let raw_tokens = tokenize::tokenize(body, config.ignore_comments);
    if raw_tokens.len() < config.min_tokens {
        return None;
    }
    let normalized = tokenize::normalize(
        &raw_tokens,
        identifiers,
        config.normalize_identifiers,
        config.normalize_literals,
    );
    let shingles = tokenize::shingle(&normalized, config.shingle_size);
    let signature = tokenize::minhash_signature(&shingles, config.num_hash_functions);

    let id = next_id.fetch_add(1, Ordering::Relaxed);

    Some(Fragment {
        path: path.to_string(),
        record: CodeFragment {
            id,
            path: path.to_string(),
            start_line,
            end_line,
            token_count: normalized.len(),
            signature,
        },
    })
}

/// LSH banding: groups fragments whose signature agrees on an entire band
/// into the same bucket, then verifies only within-bucket candidates.
fn find_clone_pairs(fragments: &[Fragment], config: &DuplicateConfig) -> Vec<CloneEdge> {
    let mut buckets: HashMap<(usize, u64), Vec<usize>> = HashMap::new();

    for (idx, fragment) in fragments.iter().enumerate() {
        let sig = &fragment.record.signature.0;
        for band in 0..config.num_bands {
            let start = band * config.rows_per_band;
            let end = (start + config.rows_per_band).min(sig.len());
            if start >= end {
                continue;
            }
            let bucket_hash = hash_band(&sig[start..end]);
            buckets.entry((band, bucket_hash)).or_default().push(idx);
        }
    }

    let mut candidate_pairs: HashSet<(usize, usize)> = HashSet::new();
    for members in buckets.values() {
        if members.len() < 2 {
            continue;
        }
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (a, b) = (members[i].min(members[j]), members[i].max(members[j]));
                candidate_pairs.insert((a, b));
            }
        }
    }

    let mut clones = Vec::new();
    for (a, b) in candidate_pairs {
        let sim = fragments[a]
            .record
            .signature
            .jaccard(&fragments[b].record.signature);
        if sim >= config.similarity_threshold {
            clones.push(CloneEdge {
                fragment_a: fragments[a].record.id,
                fragment_b: fragments[b].record.id,
                similarity: sim,
                clone_type: CloneType::classify(sim),
            });
        }
    }

    clones.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
    clones
}

fn hash_band(rows: &[u64]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    for v in rows {
        hasher.update(&v.to_le_bytes());
    }
    u64::from_le_bytes(hasher.finalize().as_bytes()[0..8].try_into().unwrap())
}

/// Union-find over the clone graph (vertices = fragment ids, edges =
/// surviving pairs); groups below `min_group_size` are dropped.
fn group_clones(fragments: &[Fragment], clones: &[CloneEdge], min_group_size: usize) -> Vec<CloneGroup> {
    let mut parent: HashMap<usize, usize> = fragments.iter().map(|f| (f.record.id, f.record.id)).collect();

    fn find(parent: &mut HashMap<usize, usize>, x: usize) -> usize {
        let p = parent[&x];
        if p != x {
            let root = find(parent, p);
            parent.insert(x, root);
            root
        } else {
            x
        }
    }

    for clone in clones {
        let ra = find(&mut parent, clone.fragment_a);
        let rb = find(&mut parent, clone.fragment_b);
        if ra != rb {
            parent.insert(ra, rb);
        }
    }

    let mut members: HashMap<usize, Vec<usize>> = HashMap::new();
    for id in parent.keys().copied().collect::<Vec<_>>() {
        let root = find(&mut parent, id);
        members.entry(root).or_default().push(id);
    }

    let mut pair_similarity: HashMap<(usize, usize), f64> = HashMap::new();
    for c in clones {
        pair_similarity.insert((c.fragment_a, c.fragment_b), c.similarity);
    }

    let mut groups: Vec<CloneGroup> = members
        .into_values()
        .filter(|ids| ids.len() >= min_group_size)
        .enumerate()
        .map(|(group_idx, mut ids)| {
            ids.sort_unstable();
            let mut sims = Vec::new();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    if let Some(&s) = pair_similarity.get(&(ids[i], ids[j])) {
                        sims.push(s);
                    }
                }
            }
            let average_similarity = if sims.is_empty() {
                0.0
            } else {
                sims.iter().sum::<f64>() / sims.len() as f64
            };
            CloneGroup {
                id: group_idx,
                fragment_ids: ids,
                average_similarity,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        b.average_similarity
            .partial_cmp(&a.average_similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    groups
}

fn compute_summary(
    total_files: usize,
    fragments: &[Fragment],
    groups: &[CloneGroup],
    total_lines: usize,
) -> CloneSummary {
    let grouped_ids: HashSet<usize> = groups.iter().flat_map(|g| g.fragment_ids.iter().copied()).collect();
    let duplicate_lines: usize = fragments
        .iter()
        .filter(|f| grouped_ids.contains(&f.record.id))
        .map(|f| f.record.end_line.saturating_sub(f.record.start_line) + 1)
        .sum();

    let duplication_ratio = if total_lines == 0 {
        0.0
    } else {
        clamp01(duplicate_lines as f64 / total_lines as f64)
    };

    let average_similarity = if groups.is_empty() {
        0.0
    } else {
        groups.iter().map(|g| g.average_similarity).sum::<f64>() / groups.len() as f64
    };

    CloneSummary {
        total_files,
        total_fragments: fragments.len(),
        duplicate_lines,
        total_lines,
        duplication_ratio,
        clone_groups: groups.len(),
        average_similarity,
        largest_group_size: groups.iter().map(|g| g.fragment_ids.len()).max().unwrap_or(0),
    }
}

/// Per-file severity = Σ(pair similarity) across clones where the file
/// participates (spec §4.5 step 9).
fn compute_hotspots(fragments: &[Fragment], clones: &[CloneEdge]) -> Vec<DuplicationHotspot> {
    let path_of: HashMap<usize, &str> = fragments.iter().map(|f| (f.record.id, f.path.as_str())).collect();
    let mut severity: HashMap<String, (f64, usize)> = HashMap::new();

    for clone in clones {
        for id in [clone.fragment_a, clone.fragment_b] {
            if let Some(&path) = path_of.get(&id) {
                let entry = severity.entry(path.to_string()).or_insert((0.0, 0));
                entry.0 += clone.similarity;
                entry.1 += 1;
            }
        }
    }

    let mut hotspots: Vec<DuplicationHotspot> = severity
        .into_iter()
        .map(|(path, (severity, clone_count))| DuplicationHotspot {
            path,
            severity,
            clone_count,
        })
        .collect();

    hotspots.sort_by(|a, b| b.severity.partial_cmp(&a.severity).unwrap_or(std::cmp::Ordering::Equal));
    hotspots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    fn long_function(name: &str) -> String {
        let mut body = format!("fn {name}() {{\n");
        for i in 0..60 {
            body.push_str(&format!("    let value_{i} = {i} + 1;\n"));
        }
        body.push_str("}\n");
        body
    }

    #[test]
    fn identical_functions_form_a_type1_clone() {
        let dir = tempfile::tempdir().unwrap();
        let body = long_function("alpha");
        let a = write_file(&dir, "a.rs", &body);
        let b = write_file(&dir, "b.rs", &body.replace("alpha", "beta"));

        let config = DuplicateConfig::default();
        let report = analyze(&[a, b], &config, &CancellationToken::new()).unwrap();

        assert!(!report.clones.is_empty());
        assert_eq!(report.clones[0].clone_type, CloneType::Type1);
        assert_eq!(report.groups.len(), 1);
    }

    #[test]
    fn distinct_functions_produce_no_clones() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(&dir, "a.rs", &long_function("alpha"));
        let mut other = String::from("fn gamma(x: i32) -> i32 {\n");
        for i in 0..60 {
            other.push_str(&format!("    if x > {i} {{ return {i}; }}\n"));
        }
        other.push_str("    x\n}\n");
        let b = write_file(&dir, "b.rs", &other);

        let config = DuplicateConfig::default();
        let report = analyze(&[a, b], &config, &CancellationToken::new()).unwrap();
        assert!(report.clones.is_empty());
    }

    #[test]
    fn short_fragments_below_min_tokens_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(&dir, "a.rs", "fn tiny() { 1 }\n");
        let config = DuplicateConfig::default();
        let report = analyze(&[a], &config, &CancellationToken::new()).unwrap();
        assert_eq!(report.summary.total_fragments, 0);
    }
}
