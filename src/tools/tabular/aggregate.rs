use log::*;

use super::config::DnbConfig;
use crate::data_structs::{
    AggregatedResult,
    GroupSplit,
    TimeKey,
};
use crate::error::Result;

/// Runs the two-step selection over keyed datasets with one shared
/// configuration.
///
/// Rows keep the run order of `datasets`. The first failing run aborts the
/// aggregation. `on_run` is called after every completed run with its key,
/// which the CLI uses to drive a progress bar.
pub fn aggregate_runs<'a, I, F>(
    config: &DnbConfig,
    datasets: I,
    mut on_run: F,
) -> Result<AggregatedResult>
where
    I: IntoIterator<Item = (&'a TimeKey, &'a GroupSplit)>,
    F: FnMut(&TimeKey), {
    let mut aggregated = AggregatedResult::new(config.output_metrics);
    for (key, split) in datasets {
        info!("Processing time point {key}");
        let report = config.run(split)?;
        aggregated.push_run(key.clone(), report.into_result());
        on_run(key);
    }

    match serde_json::to_string_pretty(config) {
        Ok(params) => info!("Parameters:\n{params}"),
        Err(e) => warn!("Could not format parameters: {e}"),
    }
    Ok(aggregated)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use ndarray::Array2;

    use super::*;
    use crate::data_structs::ObservationMatrix;

    fn dataset(
        n_ctrl: usize,
        shift: f64,
    ) -> GroupSplit {
        let cols = (0..n_ctrl)
            .map(|i| format!("ctrl{i}"))
            .chain((0..5).map(|i| format!("expr{i}")))
            .collect_vec();
        let n = cols.len();
        ObservationMatrix::try_new(
            vec!["a".into(), "b".into(), "c".into()],
            cols,
            Array2::from_shape_fn((3, n), |(i, j)| {
                if j < n_ctrl {
                    1.0
                }
                else {
                    shift + ((j * j) as f64) * (i + 1) as f64
                }
            }),
        )
        .unwrap()
        .split_groups("ctrl", "expr", false)
        .unwrap()
    }

    #[test]
    fn rows_are_tagged_and_ordered_by_run() {
        let data = vec![
            (TimeKey::Int(10), dataset(4, 0.0)),
            (TimeKey::Int(2), dataset(5, 3.0)),
        ];
        let mut seen = Vec::new();
        let aggregated = aggregate_runs(
            &DnbConfig::default(),
            data.iter().map(|(k, s)| (k, s)),
            |key| seen.push(key.clone()),
        )
        .unwrap();
        assert_eq!(seen, vec![TimeKey::Int(10), TimeKey::Int(2)]);
        assert_eq!(aggregated.len(), 6);
        assert_eq!(aggregated.rows()[0].0, TimeKey::Int(10));
        assert_eq!(aggregated.rows()[5].0, TimeKey::Int(2));
        assert_eq!(aggregated.run(&TimeKey::Int(2)).len(), 3);
    }

    #[test]
    fn failing_run_aborts() {
        let data = vec![
            (TimeKey::Int(1), dataset(4, 0.0)),
            (TimeKey::Int(2), dataset(3, 0.0)),
        ];
        let err = aggregate_runs(&DnbConfig::default(), data.iter().map(|(k, s)| (k, s)), |_| {})
            .unwrap_err();
        assert!(err.is_insufficient_data());
    }
}
