//src/fasta.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use flate2::read::MultiGzDecoder;

use crate::error::{Error, Result};

/// Contig identifiers in first-seen order plus an id -> length table.
/// Built once per run, read-only afterwards.
#[derive(Debug, Default)]
pub struct ContigIndex {
    pub ids: Vec<String>,
    pub sizes: AHashMap<String, u64>,
}

impl ContigIndex {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Length in bases of a contig seen in the input.
    pub fn size_of(&self, id: &str) -> Option<u64> {
        self.sizes.get(id).copied()
    }
}

/// Index a FASTA file. If the file ends with ".gz" it is decompressed on
/// the fly.
pub fn read_contig_index(path: &Path) -> Result<ContigIndex> {
    let f = File::open(path)?;

    let is_gz = path.extension().map(|ext| ext == "gz").unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };

    contig_index_from_reader(reader)
}

/// Build the index from any line source. The identifier is the header token
/// up to the first whitespace with the `>` marker stripped; the length is
/// the summed length of the residue lines that follow. A header with no
/// residue lines indexes at length 0.
pub fn contig_index_from_reader<R: BufRead>(reader: R) -> Result<ContigIndex> {
    let mut index = ContigIndex::default();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            let id = header.split_whitespace().next().unwrap_or("").to_string();
            index.sizes.insert(id.clone(), 0);
            index.ids.push(id);
        } else if let Some(current) = index.ids.last() {
            if let Some(size) = index.sizes.get_mut(current) {
                *size += line.len() as u64;
            }
        }
        // residue lines before the first header have nothing to attach to
    }

    if index.is_empty() {
        return Err(Error::Format(
            "problem with FASTA file format?".into(),
        ));
    }

    log::info!("indexed {} contigs", index.len());
    Ok(index)
}
