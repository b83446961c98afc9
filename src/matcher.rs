//! The stateful multi-stage resolver: filename equality, path-similarity
//! ranking, optional content-hash fallback, and the bookkeeping that keeps
//! the destination index, orphan sets, and counters consistent across all
//! three stages.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use log::warn;

use crate::dest_index::DestinationIndex;
use crate::hash::{hash_file, HashIndex};
use crate::relpath::RelativePath;

/// A resolved `(source, destination)` pair. `hash_match` is set when the
/// pair was decided by content comparison rather than path reasoning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub source: RelativePath,
    pub dest: RelativePath,
    pub hash_match: bool,
}

/// A source that started with multiple candidates and ended with exactly
/// one: reported as a `Copy`, but flagged "potentially incorrect".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneLeftRecord {
    pub source: RelativePath,
    pub dest: RelativePath,
}

/// A source whose basename still has two or more unconsumed candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguousRecord {
    pub source: RelativePath,
    pub candidates: Vec<RelativePath>,
}

/// The six counters the matcher maintains; every emission updates exactly
/// one of these (hash matches additionally bump `matched_by_hash`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchCounters {
    pub matched: usize,
    pub matched_by_hash: usize,
    pub source_not_in_dest: usize,
    pub source_multi_in_dest: usize,
    pub source_one_left: usize,
    pub dest_not_in_source: usize,
}

/// Everything the matcher produced from one run, in the emission order the
/// plan store writes: matches, one-left, ambiguous, source orphans, dest
/// orphans.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub matches: Vec<MatchRecord>,
    pub one_left: Vec<OneLeftRecord>,
    pub ambiguous: Vec<AmbiguousRecord>,
    pub source_orphans: Vec<RelativePath>,
    pub dest_orphans: Vec<RelativePath>,
    pub counters: MatchCounters,
}

/// Path-similarity rank between a source and a candidate: components are
/// compared back-to-front (filename first) over the shorter of the two
/// component lists; a matching component scores -1, a mismatching one +1.
/// Lower is more similar.
fn similarity_rank(source: &RelativePath, candidate: &RelativePath) -> i32 {
    let a: Vec<&str> = source.components().into_iter().rev().collect();
    let b: Vec<&str> = candidate.components().into_iter().rev().collect();
    let n = a.len().min(b.len());
    let mut rank = 0;
    for i in 0..n {
        if a[i].eq_ignore_ascii_case(b[i]) {
            rank -= 1;
        } else {
            rank += 1;
        }
    }
    rank
}

/// Sort `candidates` by ascending similarity rank against `source`, ties
/// preserving original order. A no-op below two entries.
fn rank_candidates(source: &RelativePath, candidates: &[RelativePath]) -> Vec<RelativePath> {
    if candidates.len() < 2 {
        return candidates.to_vec();
    }
    let mut ranked: Vec<(i32, RelativePath)> =
        candidates.iter().map(|c| (similarity_rank(source, c), c.clone())).collect();
    ranked.sort_by_key(|(rank, _)| *rank);
    ranked.into_iter().map(|(_, c)| c).collect()
}

fn file_len(path: &Path) -> Option<u64> {
    match fs::metadata(path) {
        Ok(meta) => Some(meta.len()),
        Err(e) => {
            warn!("can't stat {}: {e}", path.display());
            None
        },
    }
}

pub struct Matcher<'a> {
    source_root: &'a Path,
    dest_root: &'a Path,
    hash_enabled: bool,
}

impl<'a> Matcher<'a> {
    pub fn new(source_root: &'a Path, dest_root: &'a Path, hash_enabled: bool) -> Self {
        Self { source_root, dest_root, hash_enabled }
    }

    /// Drain `sources` against `dest_index`, producing a complete
    /// [`MatchOutcome`]. Consumes both inputs: per the ownership model, a
    /// matcher run exclusively owns the source queue and destination index
    /// for its duration.
    pub fn run(
        &self,
        mut sources: VecDeque<RelativePath>,
        mut dest_index: DestinationIndex,
    ) -> MatchOutcome {
        let mut matches = Vec::new();
        let mut ambiguous_sources: Vec<RelativePath> = Vec::new();
        let mut source_orphans: Vec<RelativePath> = Vec::new();
        let mut counters = MatchCounters::default();

        while let Some(source) = sources.pop_front() {
            let basename = source.basename().to_string();
            let available = dest_index.available_candidates(&basename);
            match available.len() {
                0 => {
                    source_orphans.push(source);
                },
                1 => {
                    let dest = available.into_iter().next().expect("len checked above");
                    dest_index.remove_path(&basename, &dest);
                    matches.push(MatchRecord { source, dest, hash_match: false });
                    counters.matched += 1;
                },
                _ => {
                    if let Some(exact) = available.iter().find(|d| **d == source) {
                        let exact = exact.clone();
                        dest_index.remove_path(&basename, &exact);
                        matches.push(MatchRecord { source, dest: exact, hash_match: false });
                        counters.matched += 1;
                        continue;
                    }

                    let resolved = if self.hash_enabled {
                        let ranked = rank_candidates(&source, &available);
                        self.try_hash_pass(&source, &ranked, &mut dest_index, &basename)
                    } else {
                        None
                    };

                    match resolved {
                        Some(found) => {
                            matches.push(found);
                            counters.matched += 1;
                            counters.matched_by_hash += 1;
                        },
                        None => ambiguous_sources.push(source),
                    }
                },
            }
        }

        // Single-pass partition of the ambiguous list: each source's basename
        // entry is looked up once more, now that every other source has been
        // drained, to see what it settled to. A reserved candidate never
        // shows up in `available_candidates`, so a basename pinned entirely
        // to a carried-forward match correctly falls through to orphan here.
        let mut one_left = Vec::new();
        let mut ambiguous = Vec::new();
        for source in ambiguous_sources {
            let basename = source.basename().to_string();
            let available = dest_index.available_candidates(&basename);
            match available.len() {
                0 => source_orphans.push(source),
                1 => {
                    let dest = available.into_iter().next().expect("len checked above");
                    dest_index.remove_path(&basename, &dest);
                    one_left.push(OneLeftRecord { source, dest });
                    counters.source_one_left += 1;
                },
                _ => {
                    ambiguous.push(AmbiguousRecord { source, candidates: available });
                    counters.source_multi_in_dest += 1;
                },
            }
        }

        let (source_orphans, cross_matches) = if self.hash_enabled {
            self.cross_orphan_sweep(source_orphans, &mut dest_index)
        } else {
            (source_orphans, Vec::new())
        };
        counters.matched += cross_matches.len();
        counters.matched_by_hash += cross_matches.len();
        matches.extend(cross_matches);

        counters.source_not_in_dest = source_orphans.len();
        counters.dest_not_in_source = dest_index.unreserved_count();
        let dest_orphans = dest_index.into_remaining_sorted();

        MatchOutcome { matches, one_left, ambiguous, source_orphans, dest_orphans, counters }
    }

    /// Walk `ranked` candidates, comparing byte length then content hash.
    /// Stops and returns the first hash match, removing it from the index.
    /// A candidate (or the source itself) that can't be read degrades that
    /// candidate only — it is skipped, not treated as a mismatch failure.
    fn try_hash_pass(
        &self,
        source: &RelativePath,
        ranked: &[RelativePath],
        dest_index: &mut DestinationIndex,
        basename: &str,
    ) -> Option<MatchRecord> {
        let source_path = source.to_host_path(self.source_root);
        let source_len = file_len(&source_path)?;
        let mut source_hash: Option<u32> = None;

        for candidate in ranked {
            let candidate_path = candidate.to_host_path(self.dest_root);
            let Some(candidate_len) = file_len(&candidate_path) else { continue };
            if candidate_len != source_len {
                continue;
            }

            let source_hash = match source_hash {
                Some(h) => h,
                None => match hash_file(&source_path) {
                    Ok(h) => {
                        source_hash.replace(h);
                        h
                    },
                    Err(e) => {
                        warn!("can't hash {}: {e}", source_path.display());
                        return None;
                    },
                },
            };

            let candidate_hash = match hash_file(&candidate_path) {
                Ok(h) => h,
                Err(e) => {
                    warn!("can't hash {}: {e}", candidate_path.display());
                    continue;
                },
            };

            if source_hash == candidate_hash {
                dest_index.remove_path(basename, candidate);
                return Some(MatchRecord {
                    source: source.clone(),
                    dest: candidate.clone(),
                    hash_match: true,
                });
            }
        }

        None
    }

    /// Content-match every remaining source orphan against every remaining
    /// destination candidate. Returns the source orphans that are still
    /// unmatched (equal to the hash index's unmatched records) and the
    /// matches produced by the sweep.
    fn cross_orphan_sweep(
        &self,
        source_orphans: Vec<RelativePath>,
        dest_index: &mut DestinationIndex,
    ) -> (Vec<RelativePath>, Vec<MatchRecord>) {
        if source_orphans.is_empty() || dest_index.unreserved_count() == 0 {
            return (source_orphans, Vec::new());
        }

        let mut hash_index = HashIndex::new();
        for path in &source_orphans {
            let full = path.to_host_path(self.source_root);
            match (file_len(&full), hash_file(&full)) {
                (Some(len), Ok(hash)) => hash_index.insert(hash, path.clone(), len),
                _ => warn!("can't fingerprint source orphan {}", full.display()),
            }
        }

        let mut matches = Vec::new();
        for (basename, dest_path) in dest_index.iter_candidates() {
            let full = dest_path.to_host_path(self.dest_root);
            let (Some(len), Ok(hash)) = (file_len(&full), hash_file(&full)) else {
                continue;
            };
            if let Some(record) = hash_index.find_unmatched_mut(hash, len) {
                record.matched = true;
                let matched_source = record.path.clone();
                matches.push(MatchRecord {
                    source: matched_source,
                    dest: dest_path.clone(),
                    hash_match: true,
                });
            } else {
                continue;
            }
            dest_index.remove_path(&basename, &dest_path);
        }

        (hash_index.unmatched_paths(), matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn rp(s: &str) -> RelativePath {
        RelativePath::new(s)
    }

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn scenario_a_rename_detected_by_hash() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "old/README.md", b"hi\n");
        write(dst.path(), "new/README.md", b"hi\n");

        let mut sources = VecDeque::new();
        sources.push_back(rp("old/README.md"));
        let mut index = DestinationIndex::new();
        index.insert(rp("new/README.md"));

        let matcher = Matcher::new(src.path(), dst.path(), true);
        let outcome = matcher.run(sources, index);

        assert_eq!(outcome.matches.len(), 1);
        assert!(outcome.matches[0].hash_match);
        assert_eq!(outcome.counters.matched, 1);
        assert_eq!(outcome.counters.matched_by_hash, 1);
    }

    #[test]
    fn scenario_b_ambiguous_without_hash() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "src/ui/Button.cs", b"class Button {}");
        write(dst.path(), "app/ui/Button.cs", b"class Button2 {}");
        write(dst.path(), "tests/Button.cs", b"class ButtonTest {}");

        let mut sources = VecDeque::new();
        sources.push_back(rp("src/ui/Button.cs"));
        let mut index = DestinationIndex::new();
        index.insert(rp("app/ui/Button.cs"));
        index.insert(rp("tests/Button.cs"));

        let matcher = Matcher::new(src.path(), dst.path(), false);
        let outcome = matcher.run(sources, index);

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.ambiguous.len(), 1);
        assert_eq!(outcome.ambiguous[0].candidates.len(), 2);
        assert_eq!(outcome.counters.source_multi_in_dest, 1);
    }

    #[test]
    fn scenario_c_orphan_symmetry() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "a.txt", b"source content");
        write(dst.path(), "b.txt", b"dest content");

        let mut sources = VecDeque::new();
        sources.push_back(rp("a.txt"));
        let mut index = DestinationIndex::new();
        index.insert(rp("b.txt"));

        let matcher = Matcher::new(src.path(), dst.path(), true);
        let outcome = matcher.run(sources, index);

        assert_eq!(outcome.counters.matched, 0);
        assert_eq!(outcome.source_orphans, vec![rp("a.txt")]);
        assert_eq!(outcome.dest_orphans, vec![rp("b.txt")]);
    }

    #[test]
    fn scenario_d_exact_path_wins_over_similarity() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "lib/util.c", b"int x;");
        write(dst.path(), "lib/util.c", b"int y;");
        write(dst.path(), "old/lib/util.c", b"int x;");

        let mut sources = VecDeque::new();
        sources.push_back(rp("lib/util.c"));
        let mut index = DestinationIndex::new();
        index.insert(rp("lib/util.c"));
        index.insert(rp("old/lib/util.c"));

        let matcher = Matcher::new(src.path(), dst.path(), true);
        let outcome = matcher.run(sources, index);

        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].dest, rp("lib/util.c"));
        assert!(!outcome.matches[0].hash_match);
    }

    #[test]
    fn one_left_emerges_when_a_sibling_source_consumes_the_other_candidate() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "a/Config.cs", b"config a");
        write(src.path(), "b/Config.cs", b"config b");
        write(dst.path(), "x/Config.cs", b"config a");
        write(dst.path(), "y/Config.cs", b"config b");

        let mut sources = VecDeque::new();
        sources.push_back(rp("a/Config.cs"));
        sources.push_back(rp("b/Config.cs"));
        let mut index = DestinationIndex::new();
        index.insert(rp("x/Config.cs"));
        index.insert(rp("y/Config.cs"));

        let matcher = Matcher::new(src.path(), dst.path(), true);
        let outcome = matcher.run(sources, index);

        assert_eq!(outcome.matches.len(), 2);
        assert!(outcome.one_left.is_empty());
        assert!(outcome.ambiguous.is_empty());
    }

    #[test]
    fn reserved_destination_is_never_assigned_to_a_fresh_source() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "c/x.txt", b"new source");
        write(dst.path(), "b/x.txt", b"already claimed");

        let mut sources = VecDeque::new();
        sources.push_back(rp("c/x.txt"));
        let mut index = DestinationIndex::new();
        index.insert_reserved(rp("b/x.txt"));

        let matcher = Matcher::new(src.path(), dst.path(), true);
        let outcome = matcher.run(sources, index);

        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.source_orphans, vec![rp("c/x.txt")]);
        assert_eq!(outcome.counters.dest_not_in_source, 0);
        assert!(outcome.dest_orphans.is_empty());
    }

    #[test]
    fn similarity_prefers_matching_parent_directory() {
        let closer = similarity_rank(&rp("src/ui/Button.cs"), &rp("app/ui/Button.cs"));
        let farther = similarity_rank(&rp("src/ui/Button.cs"), &rp("tests/Button.cs"));
        assert!(closer < farther);
    }

    #[test]
    fn empty_source_queue_yields_only_dest_orphans() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        let mut index = DestinationIndex::new();
        index.insert(rp("only.txt"));

        let matcher = Matcher::new(src.path(), dst.path(), false);
        let outcome = matcher.run(VecDeque::new(), index);

        assert!(outcome.matches.is_empty());
        assert!(outcome.source_orphans.is_empty());
        assert_eq!(outcome.dest_orphans, vec![rp("only.txt")]);
        assert_eq!(outcome.counters.dest_not_in_source, 1);
    }

    #[test]
    fn count_invariant_holds_after_a_mixed_run() {
        let src = tempdir().unwrap();
        let dst = tempdir().unwrap();
        write(src.path(), "old/README.md", b"hi\n");
        write(src.path(), "orphan.txt", b"nobody wants me");
        write(dst.path(), "new/README.md", b"hi\n");
        write(dst.path(), "stray.txt", b"not claimed");

        let mut sources = VecDeque::new();
        sources.push_back(rp("old/README.md"));
        sources.push_back(rp("orphan.txt"));
        let mut index = DestinationIndex::new();
        index.insert(rp("new/README.md"));
        index.insert(rp("stray.txt"));
        let initial_count = index.count();

        let matcher = Matcher::new(src.path(), dst.path(), true);
        let outcome = matcher.run(sources, index);

        let consumed = outcome.matches.len() + outcome.one_left.len();
        assert_eq!(outcome.dest_orphans.len(), initial_count - consumed);
        assert_eq!(outcome.counters.dest_not_in_source, outcome.dest_orphans.len());
    }
}
