//! A binary to call reference-guided consensus sequences from a hit stream.
//!
//! ```shell
//! cargo run --release --bin=refcons --features=binaries -- \
//!     --reference reference.fa.gz \
//!     --hits hits.txt \
//!     --output out/
//! ```
//!
//! Reads are treated as single reads unless `--max-pair-sep` is given, in
//! which case read ids ending in the mate suffixes are resolved as pairs.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use flate2::read::GzDecoder;
use noodles::fasta;
use refcons::config;
use refcons::config::Config;
use refcons::config::Pairing;
use refcons::engine::Engine;
use refcons::engine::Output;
use refcons::reference::ReferenceSet;
use refcons::resolve::pair::Stats;
use refcons::write;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;
use tracing_log::AsTrace as _;
use tracing_subscriber::EnvFilter;

////////////////////////////////////////////////////////////////////////////////////////
// Input
////////////////////////////////////////////////////////////////////////////////////////

/// Reads every reference sequence from a (possibly gzipped) FASTA file.
fn read_references(path: &Path) -> Result<ReferenceSet> {
    let file = File::open(path)?;

    let inner: Box<dyn BufRead> = match path.extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    };

    let mut references = ReferenceSet::default();

    for result in fasta::io::Reader::new(inner).records() {
        let record = result?;
        let name = String::from_utf8_lossy(record.name()).to_string();
        references.add(name, record.sequence().as_ref())?;
    }

    Ok(references)
}

////////////////////////////////////////////////////////////////////////////////////////
// Output
////////////////////////////////////////////////////////////////////////////////////////

/// Creates a buffered file within the output directory.
fn create(directory: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = directory.join(name);
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes every output of a run into a directory.
fn write_outputs(directory: &Path, references: &ReferenceSet, output: &Output) -> Result<()> {
    let mut consensus = create(directory, "consensus.fa")?;
    let mut masked = create(directory, "consensus_masked.fa")?;
    let mut having = create(directory, "reference_having_consensus.fa")?;
    let mut report = create(directory, "report.txt")?;
    let mut gff = create(directory, "report.gff")?;
    let mut maf = create(directory, "alignment.maf")?;

    write::report_header(&mut report)?;
    write::maf_header(&mut maf)?;

    for called in output.consensuses() {
        let Some(reference) = references.get(called.name()) else {
            bail!("no reference sequence named {}", called.name());
        };

        write::fasta(&mut consensus, called.name(), called.sequence())?;
        write::fasta(&mut masked, called.name(), called.masked())?;
        write::fasta(
            &mut having,
            called.name(),
            &called.reference_having_consensus(reference),
        )?;
        write::report_rows(&mut report, called.changes())?;
        write::gff_rows(&mut gff, called.changes())?;
        write::maf_block(&mut maf, called.name(), called.alignment())?;

        let stem = write::filesystem_friendly_name(called.name());

        let mut evidence = create(directory, &format!("{stem}-evidence.txt"))?;
        write::evidence(&mut evidence, called, reference)?;
        evidence.flush()?;

        if let Some(pileup) = output.pileup(called.name()) {
            let mut depth = create(directory, &format!("{stem}-unambiguous-depth.userplot"))?;
            write::depth(&mut depth, pileup)?;
            depth.flush()?;

            let mut depth = create(directory, &format!("{stem}-ambiguous-depth.userplot"))?;
            write::ambiguous_depth(&mut depth, pileup)?;
            depth.flush()?;
        }
    }

    for mut writer in [consensus, masked, having, report, gff, maf] {
        writer.flush()?;
    }

    if let Some(pairs) = output.pair_report() {
        let mut stats = create(directory, "pair_stats.txt")?;
        write::pair_stats(&mut stats, &pairs.stats)?;
        stats.flush()?;

        let mut weird = create(directory, "weird_pairs.txt")?;
        write::weird_pairs(&mut weird, &pairs.weird_pairs)?;
        weird.flush()?;

        println!("{}", stats_table(&pairs.stats));
    }

    Ok(())
}

/// Renders the pair statistics as a table.
fn stats_table(stats: &Stats) -> String {
    let median = stats
        .median_separation()
        .map(|median| median.to_string())
        .unwrap_or(String::from("<None>"));

    let mut builder = Builder::default();
    builder.push_record(["Pairs", "Count"]);
    builder.push_record(["Both mates hit", &stats.both_hit().to_string()]);
    builder.push_record(["Validly placed", &stats.valid().to_string()]);
    builder.push_record(["Unambiguous", &stats.unambiguous().to_string()]);
    builder.push_record([
        &format!("Median separation (limit {})", stats.max_pair_sep()),
        &median,
    ]);
    builder.push_record(["Orphaned reads", &stats.orphans().to_string()]);
    builder.push_record(["Unpaired reads", &stats.unpaired().to_string()]);

    builder.build().with(Style::rounded()).to_string()
}

////////////////////////////////////////////////////////////////////////////////////////
// Main
////////////////////////////////////////////////////////////////////////////////////////

/// Calls consensus sequences for a set of references from a hit stream.
#[derive(Parser)]
struct Args {
    /// The reference sequences (FASTA, optionally gzipped).
    #[arg(long)]
    reference: PathBuf,

    /// The hit stream (ten tab-delimited fields per line).
    #[arg(long)]
    hits: PathBuf,

    /// The directory to write outputs into.
    #[arg(long)]
    output: PathBuf,

    /// The minimum supporting count for any call.
    #[arg(long, default_value_t = config::DEFAULT_MIN_DEPTH)]
    depth: u32,

    /// The minimum fraction of position evidence for a base call.
    #[arg(long, default_value_t = config::DEFAULT_MIN_PURITY)]
    purity: f64,

    /// The number of alignment columns ignored at each end of a hit.
    #[arg(long, default_value_t = config::DEFAULT_TRIM)]
    trim: usize,

    /// The runner-up score ratio still treated as a tie.
    #[arg(long, default_value_t = config::DEFAULT_INFIDELITY)]
    infidelity: f64,

    /// Whether base calls may use IUPAC ambiguity codes (`0` or `1`).
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    ambiguity_codes: u8,

    /// The largest allowed separation between mates. Enables pairing.
    #[arg(long)]
    max_pair_sep: Option<i64>,

    /// The suffix of the first mate's read id.
    #[arg(long)]
    suffix1: Option<String>,

    /// The suffix of the second mate's read id.
    #[arg(long)]
    suffix2: Option<String>,

    /// Whether mates align in the same orientation (`0` or `1`).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    same_dir: Option<u8>,

    /// Use the SOLiD mate-pair conventions (`_R3`/`_F3`, same orientation).
    #[arg(long, default_value_t = false)]
    solid: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

impl Args {
    /// Gets the mate pairing described by the arguments, if pairing is
    /// enabled.
    fn pairing(&self) -> Option<Pairing> {
        let max_pair_sep = self.max_pair_sep?;

        let preset = match self.solid {
            true => Pairing::solid(max_pair_sep),
            false => Pairing::illumina(max_pair_sep),
        };

        Some(Pairing::new(
            self.suffix1.as_deref().unwrap_or(preset.suffix1()),
            self.suffix2.as_deref().unwrap_or(preset.suffix2()),
            self.same_dir
                .map(|same| same == 1)
                .unwrap_or(preset.same_direction()),
            max_pair_sep,
        ))
    }

    /// Builds the run configuration.
    fn config(&self) -> Result<Config> {
        let mut builder = config::Builder::default()
            .min_depth(self.depth)
            .min_purity(self.purity)
            .trim(self.trim)
            .infidelity(self.infidelity)
            .ambiguity_codes(self.ambiguity_codes == 1);

        if let Some(pairing) = self.pairing() {
            builder = builder.pairing(pairing);
        }

        builder.try_build().context("building configuration")
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.config()?;

    let references = read_references(&args.reference)
        .with_context(|| format!("reading references from {}", args.reference.display()))?;
    info!("loaded {} reference sequences", references.len());

    let hits = File::open(&args.hits)
        .map(BufReader::new)
        .with_context(|| format!("opening hits at {}", args.hits.display()))?;

    let output = Engine::new(&config, &references)
        .run(hits)
        .with_context(|| format!("processing hits from {}", args.hits.display()))?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    write_outputs(&args.output, &references, &output)?;
    info!("wrote outputs to {}", args.output.display());

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    match std::env::var("RUST_LOG") {
        Ok(_) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .init(),
        Err(_) => tracing_subscriber::fmt()
            .with_max_level(args.verbose.log_level_filter().as_trace())
            .init(),
    };

    run(&args)
}
