use std::path::Path;

use clap::{
    ArgAction,
    Args,
};
use console::style;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct UtilsArgs {
    #[arg(
        long,
        default_value_t = false,
        help_heading = "UTILS",
        help = "Display progress bar."
    )]
    pub progress: bool,

    #[arg(
        long,
        default_value_t = 0,
        help_heading = "UTILS",
        help = "Number of threads to use (0 for all available)."
    )]
    pub threads: usize,

    #[arg(
        short = 'v',
        long,
        action = ArgAction::Count,
        help_heading = "UTILS",
        help = "Log the intermediate results of every step (-v), or also \
                per-window and per-merge detail (-vv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,
}

impl UtilsArgs {
    /// Configures logging and the size of the library thread pool. Must run
    /// before any analysis touches the pool.
    pub fn setup(&self) -> anyhow::Result<()> {
        let level = match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        };
        pretty_env_logger::formatted_builder()
            .parse_filters(&std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()))
            .try_init()?;

        if std::env::var_os("DNB_NUM_THREADS").is_none() {
            std::env::set_var("DNB_NUM_THREADS", self.threads.to_string());
        }
        Ok(())
    }
}

pub(crate) fn init_pbar(total: usize) -> anyhow::Result<ProgressBar> {
    let progress_bar = ProgressBar::new(total as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}, ETA: {eta}] [{bar:40.cyan/blue}] \
                 {pos:>5.green}/{len:5} {msg}",
            )?
            .progress_chars("#>-"),
    );
    progress_bar.set_message("Processing...");
    Ok(progress_bar)
}

pub(crate) fn ensure_input_file(path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("Path {} is not a file.", style(path.display()).red());
    }
    Ok(())
}
