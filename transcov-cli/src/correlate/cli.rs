use clap::{Arg, Command, arg};

pub const CORRELATE_CMD: &str = "correlate";

pub fn create_correlate_cli() -> Command {
    Command::new(CORRELATE_CMD)
        .about("Find windows where two tracks' strand-specific coverage is strongly correlated.")
        .arg(
            Arg::new("track-a")
                .long("track-a")
                .required(true)
                .help("BED6 mappings of the first track"),
        )
        .arg(
            Arg::new("track-b")
                .long("track-b")
                .required(true)
                .help("BED6 mappings of the second track"),
        )
        .arg(
            Arg::new("chrom-sizes")
                .long("chrom-sizes")
                .required(true)
                .help("Path to chrom.sizes file"),
        )
        .arg(
            arg!(--config <CONFIG>)
                .required(false)
                .help("TOML file with analysis parameters; flags below override it"),
        )
        .arg(
            arg!(--method <METHOD>)
                .required(false)
                .value_parser(["pearson", "spearman"])
                .help("Correlation method"),
        )
        .arg(
            arg!(--window <WINDOW>)
                .required(false)
                .help("Window length in bases"),
        )
        .arg(
            Arg::new("min-correlation")
                .long("min-correlation")
                .required(false)
                .help("Minimum absolute correlation, in percent"),
        )
        .arg(
            Arg::new("min-peak")
                .long("min-peak")
                .required(false)
                .help("Minimum peak coverage both tracks must reach in a window"),
        )
        .arg(
            Arg::new("min-interval-size")
                .long("min-interval-size")
                .required(false)
                .help("Chromosomes shorter than this are skipped"),
        )
        .arg(
            arg!(--output <OUTPUT>)
                .required(false)
                .help("Output JSON path (default: stdout)"),
        )
}
