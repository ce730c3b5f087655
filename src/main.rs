use anyhow::Result;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use loglens::cli::output::{self, SectionReport};
use loglens::cli::{self, Cli, Commands};
use loglens::config::Config;
use loglens::engine;
use loglens::index::LineIndex;
use loglens::sections::MarkerSet;

use clap::Parser;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file, config } => {
            let cfg = load_config(config.as_deref(), &file)?;
            let index = index_with_progress(&file, cfg.index_chunk_bytes)?;
            println!(
                "{}: {} lines, {} bytes",
                file.display(),
                index.line_count(),
                index.total_bytes()
            );
        }
        Commands::Lines {
            file,
            range,
            config,
            numbers,
        } => {
            let cfg = load_config(config.as_deref(), &file)?;
            let index = index_with_progress(&file, cfg.index_chunk_bytes)?;
            let (start, end) = match range {
                Some(spec) => cli::parse_range(&spec, index.line_count())?,
                None => (0, index.line_count()),
            };

            let width = index.line_count().to_string().len();
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for i in start..end {
                if numbers {
                    write!(out, "{:>width$}  ", i + 1)?;
                }
                out.write_all(index.line(i)?)?;
                out.write_all(b"\n")?;
            }
        }
        Commands::Sections {
            file,
            config,
            format,
            line,
        } => {
            let cfg = load_config(config.as_deref(), &file)?;
            if cfg.markers.is_empty() {
                anyhow::bail!(
                    "no markers configured; add [[markers]] to .loglensrc.toml (see `loglens init`)"
                );
            }
            let markers = MarkerSet::compile(&cfg.markers)?;
            let index = index_with_progress(&file, cfg.index_chunk_bytes)?;
            let sections = engine::classify(&index, markers, cfg.classify_chunk_lines)?;

            match line {
                Some(line) => {
                    if line == 0 || line > index.line_count() {
                        anyhow::bail!("line {line} out of range (1..={})", index.line_count());
                    }
                    match sections.resolve(line - 1)? {
                        Some(span) => println!(
                            "line {line}: {} (L{}-L{})",
                            span.name,
                            span.start + 1,
                            span.end
                        ),
                        None => println!("line {line}: top level"),
                    }
                }
                None => {
                    let report = SectionReport {
                        file,
                        line_count: index.line_count(),
                        spans: sections.spans(),
                    };
                    output::render(&report, format.unwrap_or(cfg.format));
                }
            }
        }
        Commands::Init => {
            let path = std::env::current_dir()?.join(".loglensrc.toml");
            if path.exists() {
                eprintln!(".loglensrc.toml already exists");
                std::process::exit(1);
            }
            std::fs::write(&path, Config::default_toml())?;
            println!("Created .loglensrc.toml");
        }
    }

    Ok(())
}

/// Every command resolves its config the same way: an explicit `--config`
/// path, else `.loglensrc.toml` next to the target file.
fn load_config(explicit: Option<&Path>, file: &Path) -> Result<Config> {
    let root = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Config::load(explicit, &root)
}

/// Indexes with a percentage meter on stderr between ticks, but only when
/// stderr is a terminal; piped runs stay silent.
fn index_with_progress(file: &Path, chunk_bytes: usize) -> Result<LineIndex> {
    let show = std::io::stderr().is_terminal();
    let mut ticked = false;
    let index = engine::index_file(file, chunk_bytes, |scanned, total| {
        if show && total > 0 {
            eprint!("\rLoading: {:3}%", scanned * 100 / total);
            ticked = true;
        }
    })?;
    if ticked {
        eprint!("\r{:14}\r", "");
    }
    Ok(index)
}
