use std::fs::File;
use std::path::PathBuf;

use clap::Args;
use console::style;
use dnbtools::prelude::*;
use indicatif::ProgressBar;
use log::*;

use crate::utils::{
    ensure_input_file,
    init_pbar,
    UtilsArgs,
};

#[derive(Args, Debug, Clone)]
pub(crate) struct TabularArgs {
    #[arg(
        short,
        long,
        default_value = "input",
        help = "Folder that contains the input .csv files."
    )]
    input_path: PathBuf,

    #[arg(
        short,
        long,
        default_value = "sample_data",
        help = "Prefix of the input .csv files. Files are named <prefix>_<key>.csv; \
                integer keys are processed in numerical order."
    )]
    prefix: String,

    #[arg(
        short = 'c',
        long,
        help = "JSON file with run parameters. Its keys override the command line."
    )]
    config_file: Option<PathBuf>,

    #[arg(
        short,
        long = "output-filename",
        default_value = "output.csv",
        help = "Table of the DNB variables of every input file."
    )]
    output: PathBuf,

    #[arg(
        long,
        default_value = "ctrl",
        help_heading = "GROUP ARGS",
        help = "Columns containing this are the control group."
    )]
    key_control: String,

    #[arg(
        long,
        default_value = "expr",
        help_heading = "GROUP ARGS",
        help = "Columns containing this are the experimental group."
    )]
    key_experimental: String,

    #[arg(
        long,
        default_value_t = false,
        help_heading = "GROUP ARGS",
        help = "Ignore columns that belong to neither group."
    )]
    ignore_extra_columns: bool,

    #[arg(
        long,
        default_value_t = DeviationMetric::Mad,
        help_heading = "SELECTION ARGS",
        help = "Deviation of a variable within a group: mad or std."
    )]
    deviation_metric: DeviationMetric,

    #[arg(
        long,
        default_value_t = 2.0,
        help_heading = "SELECTION ARGS",
        help = "Variables whose experimental deviation exceeds this multiple of the \
                control deviation become DNB candidates."
    )]
    thres_gene_filtering: f64,

    #[arg(
        long,
        default_value_t = LinkageMetric::Spearman,
        help_heading = "SELECTION ARGS",
        help = "Correlation used for clustering: spearman or pearson."
    )]
    linkage_metric: LinkageMetric,

    #[arg(
        long,
        default_value_t = LinkageMethod::Average,
        help_heading = "SELECTION ARGS",
        help = "Agglomeration rule: single, complete, average, weighted, centroid, \
                median or ward."
    )]
    linkage_method: LinkageMethod,

    #[arg(
        long,
        default_value_t = 0.75,
        help_heading = "SELECTION ARGS",
        help = "Correlation level at which the dendrogram is cut."
    )]
    linkage_threshold: f64,

    #[arg(
        long,
        default_value_t = 0.5,
        help_heading = "SELECTION ARGS",
        help = "Clusters larger than this fraction of the largest cluster are kept."
    )]
    thres_cluster_selection: f64,

    #[arg(
        long = "no-output-metrics",
        default_value_t = false,
        help = "Write only the labels of the DNB variables."
    )]
    no_output_metrics: bool,
}

impl TabularArgs {
    fn run_config(&self) -> anyhow::Result<TabularRunConfig> {
        let dnb = DnbConfig::default()
            .with_deviation_metric(self.deviation_metric)
            .with_thres_gene_filtering(self.thres_gene_filtering)
            .with_linkage_metric(self.linkage_metric)
            .with_linkage_method(self.linkage_method)
            .with_linkage_threshold(self.linkage_threshold)
            .with_thres_cluster_selection(self.thres_cluster_selection)
            .with_output_metrics(!self.no_output_metrics);
        let base = TabularRunConfig::default()
            .with_input_path(self.input_path.clone())
            .with_prefix(self.prefix.clone())
            .with_key_control(self.key_control.clone())
            .with_key_experimental(self.key_experimental.clone())
            .with_ignore_extra_columns(self.ignore_extra_columns)
            .with_output_filename(self.output.clone())
            .with_dnb(dnb);

        match &self.config_file {
            Some(path) => {
                ensure_input_file(path)?;
                info!("Reading parameters from {}", path.display());
                Ok(TabularRunConfig::merge_json(&base, File::open(path)?)?)
            },
            None => Ok(base),
        }
    }

    pub fn run(
        &self,
        utils: &UtilsArgs,
    ) -> anyhow::Result<()> {
        let config = self.run_config()?;
        eprintln!(
            "Loading input from {}",
            style(config.input_path.join(format!("{}*.csv", config.prefix)).display()).blue()
        );

        let files = discover_files(&config.input_path, &config.prefix)?;
        let datasets = check_inputs(
            &files,
            &config.key_control,
            &config.key_experimental,
            config.ignore_extra_columns,
        )?;

        let progress_bar = if utils.progress {
            init_pbar(datasets.len())?
        }
        else {
            ProgressBar::hidden()
        };
        let result = aggregate_runs(
            &config.dnb,
            datasets.iter().map(|(key, split)| (key, split)),
            |key| {
                progress_bar.set_message(format!("time point {}", style(key).green()));
                progress_bar.inc(1);
            },
        )?;
        progress_bar.finish();

        write_aggregated(&result, File::create(&config.output_filename)?)?;
        eprintln!(
            "{} DNB rows from {} files written to {}",
            style(result.len()).green(),
            datasets.len(),
            style(config.output_filename.display()).blue()
        );
        Ok(())
    }
}
