// src/classify.rs

use crate::types::{Classification, ContigAggregate};

/// Contigs shorter than this are reported but never scored.
pub const MIN_CONTIG_SIZE: u64 = 500;

/// Genome-wide identity (percent) above which a contig is called phage.
/// Empirically chosen constant; fixed configuration, never derived from the
/// data being classified.
pub const ANI_THRESHOLD: f64 = 1.7;

/// Express a fraction as a percentage rounded to 3 decimals.
pub fn to_percent(fraction: f64) -> f64 {
    (fraction * 100.0 * 1000.0).round() / 1000.0
}

/// Decide the call for one contig. Pure: the contig's length and its own
/// aggregate are all the evidence there is.
///
/// Rounding happens before the threshold comparison, so the decision always
/// agrees with the percentage printed in the report.
pub fn classify_contig(size: u64, aggregate: Option<&ContigAggregate>) -> Classification {
    if size < MIN_CONTIG_SIZE {
        return Classification::NotProcessed;
    }
    match aggregate {
        None => Classification::Negative,
        Some(agg) => {
            if to_percent(agg.genome_identity) > ANI_THRESHOLD {
                Classification::Phage
            } else {
                Classification::Negative
            }
        }
    }
}
