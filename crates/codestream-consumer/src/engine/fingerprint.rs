//! Line normalization, chunk fingerprinting and clone expansion

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Chunk, CloneGroup, CloneTarget, FileRecord, SourceFile, SourceLine};

/// Strip comments and whitespace, keeping each surviving line's original number
///
/// Handles `//` line comments and `/* ... */` block comments spanning lines.
/// Comment markers inside string literals are not special-cased.
pub fn normalize_lines(contents: &str) -> Vec<SourceLine> {
    let mut in_block = false;
    let mut lines = Vec::new();

    for (idx, raw) in contents.lines().enumerate() {
        let mut kept = String::new();
        let mut rest = raw;

        loop {
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        in_block = false;
                        rest = &rest[end + 2..];
                    }
                    None => break,
                }
            } else {
                let line_comment = rest.find("//");
                let block_comment = rest.find("/*");
                match (line_comment, block_comment) {
                    (Some(l), Some(b)) if l < b => {
                        kept.push_str(&rest[..l]);
                        break;
                    }
                    (Some(l), None) => {
                        kept.push_str(&rest[..l]);
                        break;
                    }
                    (_, Some(b)) => {
                        kept.push_str(&rest[..b]);
                        kept.push(' ');
                        in_block = true;
                        rest = &rest[b + 2..];
                    }
                    (None, None) => {
                        kept.push_str(rest);
                        break;
                    }
                }
            }
        }

        let text = kept.split_whitespace().collect::<Vec<_>>().join(" ");
        if !text.is_empty() {
            lines.push(SourceLine {
                number: idx + 1,
                text,
            });
        }
    }

    lines
}

fn fingerprint(lines: &[SourceLine]) -> String {
    let mut hasher = Sha256::new();
    for line in lines {
        hasher.update(line.text.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

/// Fingerprint every window of `chunk_size` consecutive normalized lines
///
/// Fewer lines than `chunk_size` yields a single short chunk.
pub fn chunk_lines(lines: &[SourceLine], chunk_size: usize) -> Vec<Chunk> {
    if lines.is_empty() {
        return Vec::new();
    }

    let size = chunk_size.clamp(1, lines.len());
    lines
        .windows(size)
        .map(|window| Chunk {
            start_line: window[0].number,
            end_line: window[window.len() - 1].number,
            fingerprint: fingerprint(window),
        })
        .collect()
}

/// Occurrences of one fingerprint in a file beyond which the rest are ignored
///
/// Repeated boilerplate (runs of `}`, identical statements) would otherwise
/// make every source window a candidate against every target window.
const MAX_CANDIDATES: usize = 64;

/// Find spans of `source` that recur in any of `others`
///
/// Against each file the source is tiled greedily: at each source window the
/// longest run of consecutive matching windows wins, and scanning resumes
/// after it. Only maximal spans are reported and spans against one file never
/// overlap. Spans with the same source range are merged into one group, with
/// targets in the order of `others`.
pub fn detect_clones(
    source: &SourceFile,
    others: &[Arc<FileRecord>],
    min_clone_lines: usize,
) -> Vec<CloneGroup> {
    let mut groups: Vec<CloneGroup> = Vec::new();
    let mut by_span: HashMap<(usize, usize), usize> = HashMap::new();

    for other in others {
        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (j, chunk) in other.chunks.iter().enumerate() {
            let slots = index.entry(chunk.fingerprint.as_str()).or_default();
            if slots.len() < MAX_CANDIDATES {
                slots.push(j);
            }
        }

        let mut i = 0;
        while i < source.chunks.len() {
            let Some(candidates) = index.get(source.chunks[i].fingerprint.as_str()) else {
                i += 1;
                continue;
            };

            let (j, len) = candidates
                .iter()
                .map(|&j| (j, run_length(&source.chunks[i..], &other.chunks[j..])))
                .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best });

            let start = source.chunks[i].start_line;
            let end = source.chunks[i + len - 1].end_line;
            i += len;
            if end + 1 - start < min_clone_lines {
                continue;
            }

            let target = CloneTarget {
                name: other.name.clone(),
                start_line: other.chunks[j].start_line,
            };
            match by_span.get(&(start, end)) {
                Some(&g) => {
                    if !groups[g].targets.contains(&target) {
                        groups[g].targets.push(target);
                    }
                }
                None => {
                    by_span.insert((start, end), groups.len());
                    groups.push(CloneGroup {
                        source_name: source.name.clone(),
                        source_start_line: start,
                        source_end_line: end,
                        original_code: source.span_text(start, end),
                        targets: vec![target],
                    });
                }
            }
        }
    }

    groups.sort_by_key(|g| (g.source_start_line, g.source_end_line));
    groups
}

fn run_length(source: &[Chunk], target: &[Chunk]) -> usize {
    source
        .iter()
        .zip(target)
        .take_while(|(a, b)| a.fingerprint == b.fingerprint)
        .count()
}
