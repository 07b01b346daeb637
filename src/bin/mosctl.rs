use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flexzset::format::fmt_scalar;
use flexzset::{Aggregate, Config, OrderedSet, PoolKind, Scalar, SizeLimit};
use std::{fs, path::Path, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Inspect and combine ordered sets built from text files")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Build a set from `score member` lines and print its stats.
    Load {
        file: PathBuf,
        #[command(flatten)]
        opts: SetOpts,
        /// Also dump every run and entry.
        #[arg(long)]
        repr: bool,
    },
    /// Print the union of the given sets.
    Union {
        #[command(flatten)]
        combine: Combine,
    },
    /// Print the intersection of the given sets.
    Inter {
        #[command(flatten)]
        combine: Combine,
    },
    /// Print the first set minus the others.
    Diff {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[command(flatten)]
        opts: SetOpts,
    },
}

#[derive(Args)]
struct SetOpts {
    /// Small tier byte limit (0, 64, 128, ... 65536).
    #[arg(long, default_value_t = 2048)]
    limit: u32,
    #[arg(long, value_enum, default_value = "none")]
    pool: Pool,
    /// Runs kept uncompressed at each end of a full set; 0 disables compression.
    #[arg(long, default_value_t = 0)]
    depth: u8,
}

#[derive(Args)]
struct Combine {
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Comma separated weight per input; missing weights are 1.
    #[arg(long, value_delimiter = ',')]
    weights: Vec<f64>,
    #[arg(long, default_value = "sum")]
    aggregate: Aggregate,
    #[command(flatten)]
    opts: SetOpts,
}

#[derive(ValueEnum, Clone, Copy)]
enum Pool {
    None,
    Hash,
    Tree,
}

impl SetOpts {
    fn config(&self) -> Result<Config> {
        let pool = match self.pool {
            Pool::None => PoolKind::None,
            Pool::Hash => PoolKind::Hash,
            Pool::Tree => PoolKind::Tree,
        };
        Ok(Config::default()
            .size_limit(SizeLimit::from_bytes(self.limit)?)
            .compression_depth(self.depth)
            .pool(pool))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Load { file, opts, repr } => {
            let set = load(&file, &opts)?;
            let stats = set.stats();
            println!("tier         {}", stats.tier.name());
            println!("count        {}", stats.count);
            println!("bytes        {}", stats.bytes);
            println!("runs         {} ({} compressed)", stats.runs, stats.compressed_runs);
            if let Some(n) = stats.pool_strings {
                println!("pool strings {n}");
            }
            if repr {
                print!("{}", set.repr());
            }
        }
        Cmd::Union { combine } => {
            let sets = load_all(&combine.files, &combine.opts)?;
            let refs: Vec<_> = sets.iter().collect();
            print_set(&flexzset::union(&refs, weights(&combine.weights), combine.aggregate));
        }
        Cmd::Inter { combine } => {
            let sets = load_all(&combine.files, &combine.opts)?;
            let refs: Vec<_> = sets.iter().collect();
            print_set(&flexzset::intersect(&refs, weights(&combine.weights), combine.aggregate));
        }
        Cmd::Diff { files, opts } => {
            let sets = load_all(&files, &opts)?;
            let refs: Vec<_> = sets.iter().collect();
            print_set(&flexzset::difference(&refs));
        }
    }
    Ok(())
}

fn weights(w: &[f64]) -> Option<&[f64]> {
    (!w.is_empty()).then_some(w)
}

fn load_all(files: &[PathBuf], opts: &SetOpts) -> Result<Vec<OrderedSet>> {
    files.iter().map(|f| load(f, opts)).collect()
}

fn load(path: &Path, opts: &SetOpts) -> Result<OrderedSet> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut set = OrderedSet::with_config(opts.config()?)?;
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (score, member) = line
            .split_once(char::is_whitespace)
            .with_context(|| format!("{}:{}: expected `score member`", path.display(), lineno + 1))?;
        let score = parse_score(score)
            .with_context(|| format!("{}:{}: bad score `{score}`", path.display(), lineno + 1))?;
        set.add(&score, member.trim_start());
    }
    Ok(set)
}

fn parse_score(s: &str) -> Result<Scalar> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Scalar::I64(v));
    }
    if let Ok(v) = s.parse::<u64>() {
        return Ok(Scalar::U64(v));
    }
    Ok(Scalar::F64(s.parse::<f64>()?))
}

fn print_set(set: &OrderedSet) {
    for e in set {
        println!("{} {}", fmt_scalar(e.member.as_ref()), fmt_scalar(e.score.as_ref()));
    }
}
