//! Build helpers: man pages and shell completions for `submix`.
//!
//! Run with `cargo xtask <command>`.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "xtask", about = "submix development tasks")]
struct Xtask {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Generate man pages (one per subcommand)
    Man {
        /// Output directory
        #[arg(long, default_value = "target/man")]
        out_dir: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Output directory
        #[arg(long, default_value = "target/completions")]
        out_dir: PathBuf,
        /// Only this shell (default: all)
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },
}

fn main() -> std::io::Result<()> {
    match Xtask::parse().command {
        Task::Man { out_dir } => man(&out_dir),
        Task::Completions { out_dir, shell } => completions(&out_dir, shell),
    }
}

fn man(out_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let cmd = submix::command();
    clap_mangen::generate_to(cmd, out_dir)?;
    println!("man pages written to {}", out_dir.display());
    Ok(())
}

fn completions(out_dir: &Path, only: Option<Shell>) -> std::io::Result<()> {
    fs::create_dir_all(out_dir)?;
    let shells = only.map_or_else(|| Shell::value_variants().to_vec(), |s| vec![s]);
    for shell in shells {
        let mut cmd = submix::command();
        let path = clap_complete::generate_to(shell, &mut cmd, "submix", out_dir)?;
        println!("{shell} completions written to {}", path.display());
    }
    Ok(())
}
