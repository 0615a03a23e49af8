use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use metaphinder_rs::classify_contigs;
use metaphinder_rs::error::Error;
use metaphinder_rs::types::SubjectCounting;

#[derive(Parser)]
#[command(name = "metaphinder-rs")]
#[command(version)]
#[command(about = "Classify metagenomic contigs as phage or not")]
struct Args {
    /// Input FASTA file (plain or .gz)
    #[arg(short = 'i', long, value_name = "FILE")]
    infile: PathBuf,

    /// Path to output file(s)
    #[arg(short = 'o', long, value_name = "DIR", default_value = ".")]
    outpath: PathBuf,

    /// MetaPhinder BLAST database
    #[arg(short = 'd', long, value_name = "DB")]
    database: String,

    /// Path to the BLAST installation; blastn is taken from PATH when omitted
    #[arg(short = 'b', long, value_name = "BLAST")]
    blast: Option<PathBuf>,

    /// Count each database subject once per contig instead of counting
    /// subject changes along the hit list
    #[arg(long)]
    unique_hits: bool,
}

fn spinner(color: &str, msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .expect("Invalid spinner template"),
    );
    spinner.set_message(msg.to_string());
    spinner
}

fn run(args: &Args) -> Result<(), Error> {
    let counting = if args.unique_hits {
        SubjectCounting::Unique
    } else {
        SubjectCounting::Transitions
    };

    // 1. Index, align and classify
    let spin = spinner("green", "Classifying contigs...");
    let results = classify_contigs(
        &args.infile,
        &args.database,
        args.blast.as_deref(),
        &args.outpath,
        counting,
    )?;
    spin.finish_with_message(format!(
        "Classified {} contig(s): {} phage, {} negative, {} not processed.",
        results.report_rows.len(),
        results.phage,
        results.negative,
        results.not_processed
    ));

    // 2. Write the report next to the raw blast output
    let spin = spinner("yellow", "Writing output files...");
    let out_file = args.outpath.join("output.txt");
    fs::write(&out_file, results.get_report())?;
    spin.finish_with_message(format!("Wrote {}.", out_file.display()));

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => {
            let spin = spinner("cyan", "All done!");
            spin.finish_with_message("All done!");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            match err {
                // nothing to classify gets its own exit status for wrappers
                Error::Format(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
