use crate::{
    config::{user_config_path, Config},
    diagnostics::{Diagnostics, LogLevel},
    engine::Engine,
    merge::MergeOptions,
    order::SortDirection,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Sorts the launcher's mod order, optionally swapping in a saved enabled-list,
/// and writes the GUI order and load order back in agreement with each other.
#[derive(Debug, Parser)]
#[command(name = "modledger", version, about)]
pub struct Cli {
    /// Enabled-list to import after sorting
    #[arg(short = 'i', long = "import", value_name = "PATH")]
    pub import: Option<PathBuf>,

    /// Write the current enabled mods to an enabled-list before importing
    #[arg(short = 'o', long = "export", value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Let import and export touch mods on the ignore list
    #[arg(long)]
    pub include_ignored: bool,

    /// Import even when the list names mods missing from the GUI order
    #[arg(long)]
    pub force: bool,

    /// Enable a mod by UUID or registry id (repeatable)
    #[arg(long, value_name = "MOD")]
    pub enable: Vec<String>,

    /// Disable a mod by UUID or registry id (repeatable)
    #[arg(long, value_name = "MOD")]
    pub disable: Vec<String>,

    /// Sort A to Z instead of Z to A
    #[arg(long, conflicts_with = "no_sort")]
    pub ascending: bool,

    /// Keep the GUI order as it is
    #[arg(long)]
    pub no_sort: bool,

    /// Directory holding the launcher documents
    #[arg(short = 'd', long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Skip the .bak copies of the order documents
    #[arg(long)]
    pub no_backup: bool,

    /// Print the resolved configuration and exit
    #[arg(long)]
    pub print_config: bool,

    /// Save the resolved configuration as the per-user config and exit
    #[arg(long)]
    pub write_config: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn sort_direction(&self) -> Option<SortDirection> {
        if self.no_sort {
            None
        } else if self.ascending {
            Some(SortDirection::Ascending)
        } else {
            Some(SortDirection::Descending)
        }
    }

    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            include_ignored: self.include_ignored,
            force_load: self.force,
        }
    }

    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(dir) = &self.dir {
            config.game_dir = dir.clone();
        }
        if self.no_backup {
            config.backup = false;
        }
        Ok(config)
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.resolve_config()?;

    if cli.print_config {
        let raw = serde_json::to_string_pretty(&config).context("serialize config")?;
        println!("{raw}");
        return Ok(());
    }
    if cli.write_config {
        let path = user_config_path()?;
        config.save(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut engine = Engine::load(config.document_paths());

    for reference in &cli.enable {
        engine.enable_mod(reference);
    }
    for reference in &cli.disable {
        engine.disable_mod(reference);
    }

    let mut order = engine.presentation_order().to_vec();
    if let Some(direction) = cli.sort_direction() {
        engine.sort(&mut order, direction);
    }

    if let Some(path) = &cli.export {
        let presentation = engine.presentation_order().to_vec();
        if let Some(count) = engine.export_enabled_list(path, &presentation, cli.include_ignored) {
            println!("Exported {count} mod(s) to {}", path.display());
        }
    }

    if let Some(path) = &cli.import {
        order = engine.import_enabled_list(path, &order, cli.merge_options());
    }

    println!("\nMod Order:");
    println!("---");
    for line in engine.checklist(&order) {
        println!("{line}");
    }

    let report = engine.save(&order);
    if let Some(summary) = summarize(engine.diagnostics()) {
        println!("\n{summary}");
    }
    if !report.gui_order_written || !report.enabled_order_written {
        bail!("order documents were not fully written");
    }
    Ok(())
}

fn summarize(diagnostics: &Diagnostics) -> Option<String> {
    let warnings = diagnostics.count(LogLevel::Warn);
    let errors = diagnostics.count(LogLevel::Error);
    if warnings == 0 && errors == 0 {
        return None;
    }
    Some(format!("{warnings} warning(s), {errors} error(s)"))
}
