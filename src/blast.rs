// src/blast.rs

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process::Command;

use ahash::{AHashMap, AHashSet};

use crate::error::{Error, Result};
use crate::types::AlignmentHit;

/// Hits with an e-value above this are discarded before aggregation.
pub const SIGNIFICANCE_CUTOFF: f64 = 0.05;

/// Field count of one tabular (outfmt 6/7) alignment record.
const TABULAR_FIELDS: usize = 12;

/// Parsed alignment records grouped by query contig id.
///
/// Grouping is explicit: records for the same contig do not have to be
/// adjacent in the stream. Contigs whose group contained a malformed record
/// are listed in `invalid` and their hits are dropped wholesale, leaving
/// every other group untouched.
#[derive(Debug, Default)]
pub struct HitTable {
    pub groups: AHashMap<String, Vec<AlignmentHit>>,
    pub invalid: AHashSet<String>,
}

impl HitTable {
    pub fn total_hits(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// Parse one tabular record:
///
/// ```text
/// qseqid sseqid pident length mismatch gapopen qstart qend sstart send evalue bitscore
/// ```
///
/// Only the query id, subject id, identity, alignment length, query
/// coordinates and e-value are kept.
pub fn parse_hit(line: &str, line_no: usize) -> Result<(String, AlignmentHit)> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < TABULAR_FIELDS {
        return Err(Error::Parse {
            line: line_no,
            reason: format!("expected {TABULAR_FIELDS} fields, found {}", fields.len()),
        });
    }

    let float = |idx: usize, what: &str| -> Result<f64> {
        fields[idx].trim().parse().map_err(|_| Error::Parse {
            line: line_no,
            reason: format!("non-numeric {what}: {:?}", fields[idx]),
        })
    };
    let int = |idx: usize, what: &str| -> Result<u64> {
        fields[idx].trim().parse().map_err(|_| Error::Parse {
            line: line_no,
            reason: format!("non-numeric {what}: {:?}", fields[idx]),
        })
    };

    let query_id = fields[0].to_string();
    let hit = AlignmentHit::new(
        fields[1].to_string(),
        float(2, "identity")?,
        int(3, "alignment length")?,
        int(6, "query start")?,
        int(7, "query end")?,
        float(10, "e-value")?,
    );
    Ok((query_id, hit))
}

/// Read a tabular alignment stream: `#` comment lines and blank lines are
/// skipped, hits above the significance cutoff are dropped, the rest are
/// grouped by query id.
///
/// A malformed record is logged and poisons its own contig group only; the
/// contig falls through to "not processed" in the report.
pub fn read_hits<R: BufRead>(reader: R) -> Result<HitTable> {
    let mut table = HitTable::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_hit(line, idx + 1) {
            Ok((query_id, hit)) => {
                if hit.evalue <= SIGNIFICANCE_CUTOFF {
                    table.groups.entry(query_id).or_default().push(hit);
                }
            }
            Err(err) => {
                log::warn!("{err}");
                if let Some(query_id) = line.split('\t').next() {
                    table.invalid.insert(query_id.to_string());
                }
            }
        }
    }

    for id in &table.invalid {
        table.groups.remove(id);
    }

    log::info!(
        "parsed {} significant hits across {} contigs",
        table.total_hits(),
        table.groups.len()
    );
    Ok(table)
}

/// Run the external `blastn` against the reference database, writing
/// tabular output (outfmt 7, `#`-commented) to `out`.
///
/// This is the only place the aligner's invocation is known; everything
/// downstream consumes the tabular stream alone, so any aligner producing
/// 12-field records can stand in.
pub fn run_blastn(blast_bin: Option<&Path>, query: &Path, db: &str, out: &Path) -> Result<()> {
    let program = match blast_bin {
        Some(dir) => dir.join("blastn"),
        None => PathBuf::from("blastn"),
    };
    let threads = rayon::current_num_threads().to_string();

    log::info!("running {} with {threads} threads", program.display());

    let output = Command::new(&program)
        .arg("-query")
        .arg(query)
        .args(["-task", "blastn"])
        .args(["-evalue", &SIGNIFICANCE_CUTOFF.to_string()])
        .args(["-outfmt", "7"])
        .args(["-num_threads", &threads])
        .args(["-db", db])
        .arg("-out")
        .arg(out)
        .output()
        .map_err(|e| Error::Blast(format!("could not launch {}: {e}", program.display())))?;

    if !output.status.success() {
        return Err(Error::Blast(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(())
}
