// src/lib.rs
pub mod types;
pub mod error;
pub mod fasta;
pub mod blast;
pub mod aggregate;
pub mod classify;
pub mod report;

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::aggregate::aggregate_hits;
use crate::blast::{read_hits, run_blastn, HitTable};
use crate::error::Result;
use crate::fasta::{contig_index_from_reader, read_contig_index, ContigIndex};
use crate::report::{build_report, render_report};
use crate::types::{Classification, ReportRow, SubjectCounting};

/// Classification output for one run. Only structured rows are stored;
/// report text is generated on demand.
#[derive(Debug)]
pub struct ClassificationResults {
    /// One row per input contig, in FASTA order.
    pub report_rows: Vec<ReportRow>,

    pub phage: usize,
    pub negative: usize,
    pub not_processed: usize,
}

impl ClassificationResults {
    fn from_rows(report_rows: Vec<ReportRow>) -> Self {
        let mut phage = 0;
        let mut negative = 0;
        let mut not_processed = 0;
        for row in &report_rows {
            match row.classification {
                Classification::Phage => phage += 1,
                Classification::Negative => negative += 1,
                Classification::NotProcessed => not_processed += 1,
            }
        }
        Self {
            report_rows,
            phage,
            negative,
            not_processed,
        }
    }

    /// Generate the tab-separated report text on demand.
    pub fn get_report(&self) -> String {
        render_report(&self.report_rows)
    }
}

/// Classify every contig in `fasta_path` against a phage BLAST database.
///
/// Orchestration only: index the FASTA, run blastn into `out_dir/blast.out`
/// (the raw alignment stays on disk next to the report), parse the tabular
/// output and hand everything to the in-memory pipeline.
pub fn classify_contigs(
    fasta_path: &Path,
    db: &str,
    blast_bin: Option<&Path>,
    out_dir: &Path,
    counting: SubjectCounting,
) -> Result<ClassificationResults> {
    let index = read_contig_index(fasta_path)?;

    fs::create_dir_all(out_dir)?;
    let blast_out = out_dir.join("blast.out");
    run_blastn(blast_bin, fasta_path, db, &blast_out)?;

    let table = read_hits(BufReader::new(File::open(&blast_out)?))?;
    Ok(classify_table(&index, &table, counting))
}

/// The same pipeline with both collaborators replaced by plain readers: a
/// FASTA stream and a 12-field tabular alignment stream. This is the whole
/// core; no file or subprocess assumptions live below this point.
pub fn classify_streams<F: BufRead, H: BufRead>(
    fasta: F,
    hits: H,
    counting: SubjectCounting,
) -> Result<ClassificationResults> {
    let index = contig_index_from_reader(fasta)?;
    let table = read_hits(hits)?;
    Ok(classify_table(&index, &table, counting))
}

fn classify_table(
    index: &ContigIndex,
    table: &HitTable,
    counting: SubjectCounting,
) -> ClassificationResults {
    let aggregates = aggregate_hits(index, table, counting);
    let rows = build_report(index, &table.invalid, &aggregates);
    let results = ClassificationResults::from_rows(rows);

    log::info!(
        "classified {} contigs: {} phage, {} negative, {} not processed",
        results.report_rows.len(),
        results.phage,
        results.negative,
        results.not_processed,
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    fn fasta() -> String {
        let mut s = String::new();
        s.push_str(">ctg1 assembled from sample 3\n");
        s.push_str(&"ACGT".repeat(250)); // 1000 bp
        s.push('\n');
        s.push_str(">ctg2\n");
        s.push_str(&"ACGT".repeat(150)); // 600 bp
        s.push('\n');
        s.push_str(">ctg3\n");
        s.push_str(&"ACGT".repeat(25)); // 100 bp, under the cutoff
        s.push('\n');
        s
    }

    fn record(query: &str, subject: &str, identity: f64, length: u64, start: u64, end: u64, evalue: f64) -> String {
        format!("{query}\t{subject}\t{identity}\t{length}\t0\t0\t{start}\t{end}\t1\t{length}\t{evalue}\t500.0")
    }

    #[test]
    fn end_to_end_single_strong_hit() {
        let hits = format!(
            "# BLASTN 2.12.0+\n# Fields: query id, subject id, ...\n{}\n",
            record("ctg1", "s1", 95.0, 800, 1, 801, 0.001)
        );

        let results =
            classify_streams(Cursor::new(fasta()), Cursor::new(hits), SubjectCounting::default())
                .unwrap();

        assert_eq!(results.phage, 1);
        assert_eq!(results.negative, 1);
        assert_eq!(results.not_processed, 1);

        let text = results.get_report();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "ctg1\tphage\t76.000\t80.000\t1\t1000");
        assert_eq!(lines[2], "ctg2\tnegative\t0\t0\t0\t600");
        assert_eq!(
            lines[3],
            "ctg3\tnot processed\tnot processed\tnot processed\tnot processed\t100"
        );
    }

    #[test]
    fn report_order_is_fasta_order_not_stream_order() {
        // aligner reports ctg2 first and interleaves ctg1's group
        let hits = format!(
            "{}\n{}\n{}\n",
            record("ctg2", "sA", 90.0, 300, 1, 301, 1e-8),
            record("ctg1", "sB", 90.0, 300, 1, 301, 1e-8),
            record("ctg2", "sA", 90.0, 200, 350, 550, 1e-8),
        );

        let results =
            classify_streams(Cursor::new(fasta()), Cursor::new(hits), SubjectCounting::default())
                .unwrap();

        let ids: Vec<&str> = results
            .report_rows
            .iter()
            .map(|r| r.contig_id.as_str())
            .collect();
        assert_eq!(ids, vec!["ctg1", "ctg2", "ctg3"]);
    }

    #[test]
    fn insignificant_hits_leave_a_contig_negative() {
        let hits = record("ctg1", "s1", 99.0, 900, 1, 901, 0.2);

        let results =
            classify_streams(Cursor::new(fasta()), Cursor::new(hits), SubjectCounting::default())
                .unwrap();

        assert_eq!(results.report_rows[0].classification, Classification::Negative);
        assert_eq!(results.report_rows[0].num_hits, 0);
    }

    #[test]
    fn short_contigs_skip_processing_even_with_hits() {
        let hits = record("ctg3", "s1", 99.0, 90, 1, 91, 1e-20);

        let results =
            classify_streams(Cursor::new(fasta()), Cursor::new(hits), SubjectCounting::default())
                .unwrap();

        assert_eq!(
            results.report_rows[2].classification,
            Classification::NotProcessed
        );
    }

    #[test]
    fn hit_counting_mode_is_honored_end_to_end() {
        // s1 hits interleaved around an s2 hit
        let hits = format!(
            "{}\n{}\n{}\n",
            record("ctg1", "s1", 90.0, 100, 1, 101, 1e-8),
            record("ctg1", "s2", 90.0, 100, 200, 301, 1e-8),
            record("ctg1", "s1", 90.0, 100, 400, 501, 1e-8),
        );

        let transitions = classify_streams(
            Cursor::new(fasta()),
            Cursor::new(hits.clone()),
            SubjectCounting::Transitions,
        )
        .unwrap();
        let unique = classify_streams(
            Cursor::new(fasta()),
            Cursor::new(hits),
            SubjectCounting::Unique,
        )
        .unwrap();

        assert_eq!(transitions.report_rows[0].num_hits, 3);
        assert_eq!(unique.report_rows[0].num_hits, 2);
    }

    #[test]
    fn empty_fasta_refuses_to_classify() {
        let err = classify_streams(
            Cursor::new(""),
            Cursor::new(""),
            SubjectCounting::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn hits_for_unknown_contigs_are_ignored() {
        let hits = record("ctg99", "s1", 95.0, 800, 1, 801, 0.001);

        let results =
            classify_streams(Cursor::new(fasta()), Cursor::new(hits), SubjectCounting::default())
                .unwrap();

        assert_eq!(results.report_rows.len(), 3);
        assert!(results.report_rows.iter().all(|r| r.num_hits == 0));
    }
}
