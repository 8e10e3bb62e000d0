use std::fs::File;
use std::path::PathBuf;

use clap::Args;
use console::style;
use dnbtools::io::matrix_summary;
use dnbtools::prelude::*;
use log::*;

use crate::utils::{
    ensure_input_file,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct TimeseriesArgs {
    #[arg(
        value_parser,
        required = true,
        help = "Time-series .csv file: a header row, then one row per step. The first \
                column is the row index, the second the time and every further \
                column a variable."
    )]
    filename: String,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Folder that contains the input file."
    )]
    input_path: PathBuf,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Folder for the EWS_<filename> and DNB_<filename> outputs."
    )]
    output_dir: PathBuf,

    #[arg(
        short,
        long,
        default_value_t = 100,
        help_heading = "EWS ARGS",
        help = "Number of steps in the covariance window."
    )]
    window_size: usize,

    #[arg(
        long,
        default_value_t = Padding::Online,
        help_heading = "EWS ARGS",
        help = "Alignment of the signal: valid (no padding), same (centered) or online \
                (causal)."
    )]
    padding: Padding,

    #[arg(
        long,
        default_value_t = Normalization::Straight,
        help_heading = "EWS ARGS",
        help = "Preprocessing of the variables: straight, std, minmax or pca (10 \
                principal components)."
    )]
    normalization: Normalization,

    #[arg(
        short,
        long,
        default_value_t = CpdStrategy::default(),
        help_heading = "CHANGE POINT ARGS",
        help = "Change-point strategy: peak, otsu, linear or ar[:order]."
    )]
    strategy: CpdStrategy,

    #[arg(
        long,
        default_value_t = 1000,
        help_heading = "CHANGE POINT ARGS",
        help = "Number of steps before the signal maximum searched for the change point."
    )]
    scope_range: usize,
}

impl TimeseriesArgs {
    pub fn run(
        &self,
        _utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let input = self.input_path.join(&self.filename);
        ensure_input_file(&input)?;
        let series = read_series(&input)?;
        info!("Time series ({} steps):\n{}", series.nrows(), matrix_summary(&series, 10));

        let ews_config = EwsConfig::default()
            .with_window_size(self.window_size)
            .with_padding(self.padding)
            .with_normalization(self.normalization);
        let cpd_config = CpdConfig::default()
            .with_strategy(self.strategy)
            .with_scope_range(self.scope_range);
        let analysis = analyse(series.view(), &ews_config, &cpd_config)?;
        eprintln!(
            "Candidate of bifurcation at step {}, control at step {}",
            style(analysis.change_point).red(),
            style(analysis.control_point).blue()
        );

        let ews_path = self.output_dir.join(format!("EWS_{}", self.filename));
        let ews = analysis.ews.to_vec();
        write_ews(&ews, File::create(&ews_path)?)?;

        let dataset = analysis.windowed_dataset(&series, self.window_size)?;
        let dnb_path = self.output_dir.join(format!("DNB_{}", self.filename));
        write_matrix(&dataset, File::create(&dnb_path)?)?;
        eprintln!(
            "Wrote {} and {}",
            style(ews_path.display()).blue(),
            style(dnb_path.display()).blue()
        );
        Ok(())
    }
}
