use std::io::Read;
use std::path::PathBuf;

use log::*;
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::{
    Map,
    Value,
};

use crate::data_structs::{
    DeviationMetric,
    LinkageMethod,
    LinkageMetric,
};
use crate::error::{
    DnbError,
    Result,
};
use crate::{
    config_bail,
    with_field_fn,
};

/// Parameters of the two-step DNB selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DnbConfig {
    pub deviation_metric:        DeviationMetric,
    /// Candidates satisfy `dev_expr > thres_gene_filtering * dev_ctrl`.
    pub thres_gene_filtering:    f64,
    pub linkage_metric:          LinkageMetric,
    pub linkage_method:          LinkageMethod,
    /// Correlation level of the dendrogram cut (cut distance is
    /// `1 - linkage_threshold`).
    pub linkage_threshold:       f64,
    /// Clusters larger than `thres_cluster_selection * max_size` are kept.
    pub thres_cluster_selection: f64,
    pub output_metrics:          bool,
}

impl Default for DnbConfig {
    fn default() -> Self {
        Self {
            deviation_metric:        DeviationMetric::Mad,
            thres_gene_filtering:    2.0,
            linkage_metric:          LinkageMetric::Spearman,
            linkage_method:          LinkageMethod::Average,
            linkage_threshold:       0.75,
            thres_cluster_selection: 0.5,
            output_metrics:          false,
        }
    }
}

impl DnbConfig {
    with_field_fn!(deviation_metric, DeviationMetric);

    with_field_fn!(thres_gene_filtering, f64);

    with_field_fn!(linkage_metric, LinkageMetric);

    with_field_fn!(linkage_method, LinkageMethod);

    with_field_fn!(linkage_threshold, f64);

    with_field_fn!(thres_cluster_selection, f64);

    with_field_fn!(output_metrics, bool);
}

/// Keys of configuration files written for plotting front-ends.
const PLOT_KEYS: [&str; 3] = ["plot_correlation", "plot_heatmap", "plot_file_prefix"];

/// Run-level settings of a tabular analysis: where the files are, how the
/// columns are split and where the table goes, plus the selection
/// parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularRunConfig {
    pub input_path:           PathBuf,
    pub prefix:               String,
    pub key_control:          String,
    pub key_experimental:     String,
    pub ignore_extra_columns: bool,
    pub output_filename:      PathBuf,
    #[serde(flatten)]
    pub dnb:                  DnbConfig,
}

impl Default for TabularRunConfig {
    fn default() -> Self {
        Self {
            input_path:           PathBuf::from("input"),
            prefix:               "sample_data".to_string(),
            key_control:          "ctrl".to_string(),
            key_experimental:     "expr".to_string(),
            ignore_extra_columns: false,
            output_filename:      PathBuf::from("output.csv"),
            dnb:                  DnbConfig::default(),
        }
    }
}

impl TabularRunConfig {
    with_field_fn!(input_path, PathBuf);

    with_field_fn!(prefix, String);

    with_field_fn!(key_control, String);

    with_field_fn!(key_experimental, String);

    with_field_fn!(ignore_extra_columns, bool);

    with_field_fn!(output_filename, PathBuf);

    with_field_fn!(dnb, DnbConfig);

    /// Overrides `base` with the keys of a JSON object read from `reader`.
    ///
    /// Every key is optional; a key that is not a field of the run
    /// configuration is rejected. Plot settings are accepted and ignored.
    pub fn merge_json<R: Read>(
        base: &Self,
        reader: R,
    ) -> Result<Self> {
        let overrides: Map<String, Value> = serde_json::from_reader(reader)
            .map_err(|e| DnbError::configuration(format!("cannot parse configuration file: {e}")))?;

        let mut merged = match serde_json::to_value(base) {
            Ok(Value::Object(map)) => map,
            Ok(_) => config_bail!("run configuration is not a JSON object"),
            Err(e) => config_bail!("cannot serialize run configuration: {e}"),
        };
        for (key, value) in overrides {
            if PLOT_KEYS.contains(&key.as_str()) {
                warn!("Plotting is not supported, ignoring \"{key}\"");
                continue;
            }
            if !merged.contains_key(&key) {
                return Err(DnbError::configuration(format!(
                    "invalid key \"{key}\" is in configuration file"
                )));
            }
            merged.insert(key, value);
        }

        serde_json::from_value(Value::Object(merged))
            .map_err(|e| DnbError::configuration(format!("invalid configuration value: {e}")))
    }
}
