// src/aggregate.rs

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;

use crate::blast::HitTable;
use crate::classify::MIN_CONTIG_SIZE;
use crate::fasta::ContigIndex;
use crate::types::{AlignmentHit, ContigAggregate, SubjectCounting};

/// Length-weighted average identity over a hit group, as a fraction.
/// Zero when there is no aligned length to weight by.
pub fn weighted_identity(hits: &[AlignmentHit]) -> f64 {
    let mut weighted = 0.0;
    let mut total_len = 0u64;
    for hit in hits {
        weighted += hit.identity * hit.length as f64;
        total_len += hit.length;
    }

    if total_len > 0 && weighted > 0.0 {
        weighted / total_len as f64 / 100.0
    } else {
        0.0
    }
}

/// Total length of the union of query intervals, counting each merged
/// `end - start` span once.
///
/// Intervals must already be normalized (`start <= end`); input order is
/// free. Sort by start, then sweep left to right: an interval starting at or
/// before the current merged end extends it, anything past it closes the
/// span and opens a new one.
pub fn merged_length(intervals: &mut Vec<(u64, u64)>) -> u64 {
    if intervals.is_empty() {
        return 0;
    }
    intervals.sort_unstable_by_key(|iv| iv.0);

    let (mut start, mut end) = intervals[0];
    let mut merged = 0;
    for &(s, e) in intervals.iter().skip(1) {
        if s > end {
            merged += end - start;
            start = s;
            end = e;
        } else if e > end {
            end = e;
        }
    }
    merged + (end - start)
}

fn count_subjects(hits: &[AlignmentHit], counting: SubjectCounting) -> u32 {
    match counting {
        SubjectCounting::Transitions => {
            let mut n = 0u32;
            let mut prev: Option<&str> = None;
            for hit in hits {
                if prev != Some(hit.subject_id.as_str()) {
                    n += 1;
                    prev = Some(hit.subject_id.as_str());
                }
            }
            n
        }
        SubjectCounting::Unique => {
            let subjects: AHashSet<&str> =
                hits.iter().map(|h| h.subject_id.as_str()).collect();
            subjects.len() as u32
        }
    }
}

impl ContigAggregate {
    /// Fold one contig's significant hits into a genome-wide identity score.
    ///
    /// Built as a fresh value per contig group; `size` is the contig length
    /// in bases. The score is deliberately the product of identity and
    /// coverage breadth, not an average: a short perfect-identity fragment
    /// covering 1% of the contig must not outscore broad moderate coverage.
    pub fn from_hits(
        contig_id: &str,
        hits: &[AlignmentHit],
        size: u64,
        counting: SubjectCounting,
    ) -> Self {
        let avg_identity = weighted_identity(hits);

        let mut intervals: Vec<(u64, u64)> = hits.iter().map(|h| (h.start, h.end)).collect();
        let merged_coverage = merged_length(&mut intervals) as f64 / size as f64;

        Self {
            contig_id: contig_id.to_string(),
            avg_identity,
            merged_coverage,
            genome_identity: avg_identity * merged_coverage,
            subject_hits: count_subjects(hits, counting),
        }
    }
}

/// Aggregate every usable hit group in parallel, collected keyed by contig
/// id. Report ordering is restored later by joining on the FASTA index,
/// never on completion order.
///
/// Groups whose id is missing from the index are logged and skipped, and
/// contigs under the processing cutoff are not aggregated at all (their
/// rows never carry numbers).
pub fn aggregate_hits(
    index: &ContigIndex,
    table: &HitTable,
    counting: SubjectCounting,
) -> AHashMap<String, ContigAggregate> {
    table
        .groups
        .par_iter()
        .filter_map(|(id, hits)| {
            if hits.is_empty() {
                return None;
            }
            let size = match index.size_of(id) {
                Some(s) => s,
                None => {
                    log::warn!("hits for {id}, which is not in the FASTA input; skipped");
                    return None;
                }
            };
            if size < MIN_CONTIG_SIZE {
                return None;
            }
            Some((id.clone(), ContigAggregate::from_hits(id, hits, size, counting)))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
