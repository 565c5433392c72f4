use clap::{Arg, ArgAction, Command, arg};

pub const COVERAGE_CMD: &str = "coverage";

pub fn create_coverage_cli() -> Command {
    Command::new(COVERAGE_CMD)
        .about("Accumulate strand-specific coverage from mapped reads and estimate background thresholds.")
        .arg(
            arg!(--mappings <MAPPINGS>)
                .required(true)
                .help("BED6 file of mapped reads (.gz accepted, '-' for stdin)"),
        )
        .arg(
            Arg::new("chrom-sizes")
                .long("chrom-sizes")
                .required(true)
                .help("Path to chrom.sizes file"),
        )
        .arg(
            arg!(--features <FEATURES>)
                .required(false)
                .help("Feature table (chrom, start, end, strand, id, type); enables operon adjacency"),
        )
        .arg(
            arg!(--exclude <EXCLUDE>)
                .required(false)
                .help("BED file of regions (e.g. rRNA, tRNA) left out of the unique read count"),
        )
        .arg(
            arg!(--fraction <FRACTION>)
                .required(false)
                .default_value("1.0")
                .help("Accepted false positives per 1000 positions"),
        )
        .arg(
            arg!(--seed <SEED>)
                .required(false)
                .default_value("42")
                .help("Random seed for the simulated threshold"),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .action(ArgAction::SetTrue)
                .help("Also estimate the threshold by simulation"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .help("Output JSON path (default: stdout)"),
        )
}
