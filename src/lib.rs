use anyhow::{bail, Context, Result};
use calm_io::*;
use clap::{arg, crate_version, value_parser, Arg, ArgMatches, Command};
use netmodel::{compare, ComparisonReport, InteractionGraph};
use std::path::PathBuf;
use std::str::FromStr;

/// Create the CLI in clap.
pub fn cli() -> Command {
    Command::new("netmodels")
        .bin_name("netmodels")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .version(crate_version!())
        .about("Measure an interaction graph and compare it to random graph models.")
        .arg(
            arg!(-v --verbose "Print debug logging to stderr.")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            arg!(-t --threads [THREADS] "Number of worker threads, 0 uses every core.")
                .value_parser(value_parser!(usize))
                .default_value("0")
                .global(true),
        )
        .subcommand(
            Command::new("compare")
                .about("Compare the graph with Erdős-Rényi, Barabási-Albert, Watts-Strogatz and regular models.")
                .arg_required_else_help(true)
                .arg(input_arg())
                .arg(delimiter_arg())
                .arg(
                    arg!(-s --seed [SEED] "Seed for the model graphs. Random if not given.")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(-f --format [FORMAT] "The output format.")
                        .default_value("text")
                        .value_parser(["text", "tsv", "json"]),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Node, edge and component counts of the graph.")
                .arg_required_else_help(true)
                .arg(input_arg())
                .arg(delimiter_arg())
                .arg(
                    arg!(--prefix [PREFIX] "Identifiers starting with this belong to the first namespace.")
                        .default_value("DB"),
                ),
        )
        .subcommand(
            Command::new("degrees")
                .about("The degree of every node, highest first.")
                .arg_required_else_help(true)
                .arg(input_arg())
                .arg(delimiter_arg()),
        )
}

fn input_arg() -> Arg {
    arg!(<INPUT_DSV> "An input DSV with a header row and two columns of identifiers.")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

fn delimiter_arg() -> Arg {
    arg!([DELIMITER] "Specify the delimiter of the DSV; we assume tabs.").required(false)
}

/// Set up `env_logger` on stderr. `RUST_LOG` still overrides the level.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // a second call (e.g. from tests) keeps the first logger.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}

/// How a comparison report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Tsv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "tsv" => Ok(OutputFormat::Tsv),
            "json" => Ok(OutputFormat::Json),
            other => bail!("Unknown output format: {}", other),
        }
    }
}

/// Everything a run needs, pulled out of the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input: PathBuf,
    pub delimiter: u8,
    /// `None` draws a fresh seed.
    pub seed: Option<u64>,
    pub format: OutputFormat,
    /// Namespace prefix for the stats summary.
    pub prefix: String,
}

impl Config {
    /// Read a subcommand's matches. Options a subcommand doesn't
    /// have take their defaults.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let input = matches
            .get_one::<PathBuf>("INPUT_DSV")
            .cloned()
            .context("An input edge list is required.")?;
        let delimiter = match matches.get_one::<String>("DELIMITER") {
            Some(d) => parse_delimiter(d),
            None => b'\t',
        };
        let seed = matches.try_get_one::<u64>("seed").ok().flatten().copied();
        let format = match matches.try_get_one::<String>("format").ok().flatten() {
            Some(f) => f.parse()?,
            None => OutputFormat::default(),
        };
        let prefix = matches
            .try_get_one::<String>("prefix")
            .ok()
            .flatten()
            .cloned()
            .unwrap_or_else(|| "DB".to_string());

        Ok(Config {
            input,
            delimiter,
            seed,
            format,
            prefix,
        })
    }

    /// Load the input into a graph.
    pub fn load_graph(&self) -> Result<InteractionGraph> {
        InteractionGraph::from_dsv(&self.input, self.delimiter)
            .with_context(|| format!("Could not build a graph from {}", self.input.display()))
    }
}

/// Tabs are awkward to type, so `\t` and `tab` are accepted too.
fn parse_delimiter(d: &str) -> u8 {
    match d {
        "\\t" | "tab" => b'\t',
        _ => d.bytes().next().unwrap_or(b'\t'),
    }
}

/// Process all of the matches from the CLI.
pub fn process_matches(matches: &ArgMatches) -> Result<()> {
    let threads = matches.get_one::<usize>("threads").copied().unwrap_or(0);
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Could not set up the thread pool.")?;
    }

    match matches.subcommand() {
        Some(("compare", sub_matches)) => run_compare(&Config::from_matches(sub_matches)?),
        Some(("stats", sub_matches)) => run_stats(&Config::from_matches(sub_matches)?),
        Some(("degrees", sub_matches)) => run_degrees(&Config::from_matches(sub_matches)?),
        _ => unreachable!("clap requires a subcommand."),
    }
}

/// Build the graph, run the comparison and print the report.
pub fn run_compare(config: &Config) -> Result<()> {
    let graph = config.load_graph()?;
    let seed = config.seed.unwrap_or_else(rand::random);
    log::info!("Model seed is {} (pass --seed {} to reproduce)", seed, seed);

    let report = compare(&graph, seed)?;
    stdout!("{}", render_report(&report, config.format)?)?;
    Ok(())
}

/// Render a report in the chosen format.
pub fn render_report(report: &ComparisonReport, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Text => {
            let mut text = report.to_string();
            if let Some(family) = report.closest_model() {
                text += &format!("\nClosest model (clustering, path length): {}\n", family);
            }
            text
        }
        OutputFormat::Tsv => report.to_tsv(),
        OutputFormat::Json => report.to_json()? + "\n",
    };
    Ok(rendered)
}

/// Print basic counts for the graph.
pub fn run_stats(config: &Config) -> Result<()> {
    let graph = config.load_graph()?;
    let stats = graph.stats(&config.prefix);

    stdoutln!(
        "#_nodes\t#_edges\t#_{}_nodes\t#_other_nodes\t#_components\t#_lcc_nodes\t#_lcc_edges",
        config.prefix
    )?;
    stdoutln!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        stats.nodes,
        stats.edges,
        stats.prefixed_nodes,
        stats.other_nodes,
        stats.components,
        stats.lcc_nodes,
        stats.lcc_edges
    )?;
    Ok(())
}

/// Print the degree of every node.
pub fn run_degrees(config: &Config) -> Result<()> {
    let graph = config.load_graph()?;

    stdoutln!("node\tdegree")?;
    for (node, degree) in graph.degree_distribution() {
        stdoutln!("{}\t{}", node, degree)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SIX_BY_SEVEN: &str = "Drug\tGene\n\
        DB1\tP1\nDB1\tP2\nDB2\tP1\nDB2\tP2\nDB2\tP3\nDB3\tP3\nDB3\tP1\nDB4\t\n";

    fn write_input(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    fn config_for(args: &[&str]) -> Config {
        let matches = cli().try_get_matches_from(args).unwrap();
        let (_, sub_matches) = matches.subcommand().unwrap();
        Config::from_matches(sub_matches).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_config_defaults() {
        let config = config_for(&["netmodels", "compare", "in.tsv"]);
        assert_eq!(
            config,
            Config {
                input: PathBuf::from("in.tsv"),
                delimiter: b'\t',
                seed: None,
                format: OutputFormat::Text,
                prefix: "DB".to_string(),
            }
        );
    }

    #[test]
    fn test_config_options() {
        let config = config_for(&[
            "netmodels", "compare", "in.csv", ",", "--seed", "7", "--format", "json",
        ]);
        assert_eq!(config.delimiter, b',');
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.format, OutputFormat::Json);

        let config = config_for(&["netmodels", "stats", "in.tsv", "\\t", "--prefix", "CHEM"]);
        assert_eq!(config.delimiter, b'\t');
        assert_eq!(config.prefix, "CHEM");
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let config = config_for(&["netmodels", "compare", "/definitely/not/here.tsv"]);
        assert!(run_compare(&config).is_err());
    }

    #[test]
    fn test_end_to_end_text_report() {
        let file = write_input(SIX_BY_SEVEN);
        let mut config = config_for(&["netmodels", "compare", "x", "--seed", "5"]);
        config.input = file.path().to_path_buf();

        let graph = config.load_graph().unwrap();
        assert_eq!((graph.node_count(), graph.edge_count()), (6, 7));

        let report = compare(&graph, 5).unwrap();
        let text = render_report(&report, OutputFormat::Text).unwrap();
        for label in [
            "Original",
            "Erdős-Rényi",
            "Barabási-Albert",
            "Watts-Strogatz",
            "Regular",
        ] {
            assert!(
                text.contains(&format!("{} Network Statistics:", label)),
                "{label} block missing"
            );
        }
        assert!(text.contains("Closest model"));
    }

    #[test]
    fn test_end_to_end_json_report() {
        let file = write_input(SIX_BY_SEVEN);
        let config = Config {
            input: file.path().to_path_buf(),
            delimiter: b'\t',
            seed: Some(5),
            format: OutputFormat::Json,
            prefix: "DB".to_string(),
        };
        let report = compare(&config.load_graph().unwrap(), 5).unwrap();
        let json = render_report(&report, config.format).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 5);
        assert_eq!(value["Original"]["node_count"], 6);
        assert_eq!(value["Original"]["edge_count"], 7);
    }

    #[test]
    fn test_header_only_input_is_an_empty_graph() {
        let file = write_input("Drug\tGene\n");
        let config = Config {
            input: file.path().to_path_buf(),
            delimiter: b'\t',
            seed: Some(1),
            format: OutputFormat::Text,
            prefix: "DB".to_string(),
        };
        let err = config.load_graph().unwrap_err();
        assert!(format!("{:#}", err).contains("no usable edges"));
    }
}
