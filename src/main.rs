use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use huffman_toy::{Alphabet, CodeTable, CodeTree, Session, SessionConfig, Symbol};

/// Compress and decompress files with a static Huffman code.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Symbol alphabet: bytes or text (overrides config file)
    #[arg(long, global = true)]
    alphabet: Option<Alphabet>,

    /// Log filter (overrides RUST_LOG and the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress INPUT into OUTPUT and save the code tree
    Compress {
        input: PathBuf,
        output: PathBuf,
        /// Where to save the tree (default: OUTPUT.tree.json)
        #[arg(long)]
        tree: Option<PathBuf>,
    },
    /// Decompress INPUT into OUTPUT with a saved code tree
    Decompress {
        input: PathBuf,
        output: PathBuf,
        /// Tree saved by `compress` (default: INPUT.tree.json)
        #[arg(long)]
        tree: Option<PathBuf>,
    },
    /// Print the frequency and code word of every symbol in INPUT
    Codes { input: PathBuf },
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(alphabet) = cli.alphabet {
        config.alphabet = alphabet;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(config: &SessionConfig, explicit: bool) -> Result<()> {
    let filter = if explicit {
        EnvFilter::try_new(&config.log_level)?
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

fn tree_file(explicit: &Option<PathBuf>, config: &SessionConfig, beside: &Path) -> PathBuf {
    explicit
        .clone()
        .or_else(|| config.tree_path.clone())
        .unwrap_or_else(|| {
            let mut name = beside.as_os_str().to_owned();
            name.push(".tree.json");
            PathBuf::from(name)
        })
}

fn summary(symbols: u64, encoded_bits: u64, raw_bytes: u64) -> String {
    format!(
        "{symbols} symbols, {encoded_bits} bits encoded, {} bits raw ({raw_bytes} bytes)",
        raw_bytes * 8
    )
}

fn run<S: Symbol>(command: &Command, config: &SessionConfig) -> Result<()> {
    let session = Session::from(config);
    match command {
        Command::Compress {
            input,
            output,
            tree,
        } => {
            let tree_path = tree_file(tree, config, output);
            match session.compress_path::<S>(input, output)? {
                Some(code_tree) => {
                    code_tree.save(&tree_path)?;
                    info!(tree = %tree_path.display(), "saved code tree");
                }
                None => info!(input = %input.display(), "input is empty, no tree saved"),
            }
        }
        Command::Decompress {
            input,
            output,
            tree,
        } => {
            let tree_path = tree_file(tree, config, input);
            let code_tree = if tree_path.exists() {
                Some(CodeTree::<S>::load(&tree_path)?)
            } else {
                None
            };
            session.decompress_path(input, output, code_tree.as_ref())?;
        }
        Command::Codes { input } => {
            let frequencies = session.count_frequencies::<S>(input)?;
            let tree = CodeTree::build(&frequencies)?;
            let codes = CodeTable::from_tree(&tree);
            for (symbol, code) in codes.iter() {
                println!("{:?}\t{}\t{}", symbol, frequencies.get(&symbol), code);
            }
            if let Some(bits) = codes.encoded_bits(&frequencies) {
                let raw_bytes = std::fs::metadata(input)
                    .with_context(|| format!("Failed to stat input: {}", input.display()))?
                    .len();
                println!("{}", summary(frequencies.total(), bits, raw_bytes));
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config, cli.log_level.is_some())?;

    match config.alphabet {
        Alphabet::Bytes => run::<u8>(&cli.command, &config),
        Alphabet::Text => run::<char>(&cli.command, &config),
    }
}
