// src/report.rs

use std::fmt::Write as FmtWrite;

use ahash::{AHashMap, AHashSet};

use crate::classify::{classify_contig, to_percent};
use crate::fasta::ContigIndex;
use crate::types::{Classification, ContigAggregate, ReportRow};

/// Fixed report header.
pub const REPORT_HEADER: &str =
    "#contigID\tclassification\tANI [%]\tmerged coverage [%]\tnumber of hits\tsize[bp]";

/// Join per-contig results back onto the full identifier list: exactly one
/// row per FASTA id, in FASTA order, including contigs no alignment record
/// ever mentioned.
///
/// Contigs whose record group was unparseable are reported like unprocessed
/// contigs rather than silently dropped or scored from partial data.
pub fn build_report(
    index: &ContigIndex,
    invalid: &AHashSet<String>,
    aggregates: &AHashMap<String, ContigAggregate>,
) -> Vec<ReportRow> {
    index
        .ids
        .iter()
        .map(|id| {
            let size = index.size_of(id).unwrap_or(0);

            if invalid.contains(id) {
                return ReportRow {
                    contig_id: id.clone(),
                    classification: Classification::NotProcessed,
                    ani_pct: 0.0,
                    coverage_pct: 0.0,
                    num_hits: 0,
                    size,
                };
            }

            let agg = aggregates.get(id);
            let classification = classify_contig(size, agg);
            let (ani_pct, coverage_pct, num_hits) = match agg {
                Some(a) => (
                    to_percent(a.genome_identity),
                    to_percent(a.merged_coverage),
                    a.subject_hits,
                ),
                None => (0.0, 0.0, 0),
            };

            ReportRow {
                contig_id: id.clone(),
                classification,
                ani_pct,
                coverage_pct,
                num_hits,
                size,
            }
        })
        .collect()
}

/// Render rows as the tab-separated report, header first. Identical input
/// always renders identical text.
pub fn render_report(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    out.push_str(REPORT_HEADER);
    out.push('\n');

    for row in rows {
        match row.classification {
            Classification::NotProcessed => {
                writeln!(
                    out,
                    "{}\tnot processed\tnot processed\tnot processed\tnot processed\t{}",
                    row.contig_id, row.size
                )
                .unwrap();
            }
            _ if row.num_hits == 0 => {
                writeln!(out, "{}\t{}\t0\t0\t0\t{}", row.contig_id, row.classification, row.size)
                    .unwrap();
            }
            _ => {
                writeln!(
                    out,
                    "{}\t{}\t{:.3}\t{:.3}\t{}\t{}",
                    row.contig_id,
                    row.classification,
                    row.ani_pct,
                    row.coverage_pct,
                    row.num_hits,
                    row.size
                )
                .unwrap();
            }
        }
    }
    out
}
