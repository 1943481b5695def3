use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::{Shell, generate_to};
use clap_mangen::Man;

const SHELLS: [Shell; 4] = [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::Elvish];

/// Writes `completions/` for every supported shell and `man/` with one page
/// for the binary plus one per visible subcommand (`redump-capture.1`, ...).
/// Returns every file written.
pub fn write_docs(mut cmd: Command, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let completions_dir = out_dir.join("completions");
    let man_dir = out_dir.join("man");
    for dir in [&completions_dir, &man_dir] {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let bin_name = cmd.get_name().to_string();
    let mut written = Vec::new();
    for shell in SHELLS {
        let path = generate_to(shell, &mut cmd, &bin_name, &completions_dir)
            .with_context(|| format!("failed generating {shell} completion"))?;
        written.push(path);
    }

    cmd.build();
    written.push(write_man_page(&man_dir, &bin_name, cmd.clone())?);
    for sub in cmd.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let page = format!("{bin_name}-{}", sub.get_name());
        written.push(write_man_page(&man_dir, &page, sub.clone())?);
    }
    Ok(written)
}

fn write_man_page(man_dir: &Path, page: &str, cmd: Command) -> Result<PathBuf> {
    let mut rendered = Vec::new();
    Man::new(cmd)
        .title(page.to_uppercase())
        .render(&mut rendered)
        .with_context(|| format!("failed rendering man page {page}"))?;
    let path = man_dir.join(format!("{page}.1"));
    fs::write(&path, rendered).with_context(|| format!("failed writing {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "docs_tests.rs"]
mod tests;
