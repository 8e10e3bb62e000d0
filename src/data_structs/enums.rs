use std::fmt::Display;
use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::DnbError;

/// Implements `Serialize`/`Deserialize` through `Display`/`FromStr`, so that
/// configuration files carry the same names as the command line.
macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(
                &self,
                serializer: S,
            ) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer, {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>, {
                let s = String::deserialize(deserializer)?;
                <$ty>::from_str(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Per-variable dispersion metric.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, Default)]
pub enum DeviationMetric {
    /// Median absolute deviation around the row median.
    #[default]
    Mad,
    /// Population standard deviation.
    Std,
}

impl Display for DeviationMetric {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            DeviationMetric::Mad => write!(f, "mad"),
            DeviationMetric::Std => write!(f, "std"),
        }
    }
}

impl FromStr for DeviationMetric {
    type Err = DnbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mad" => Ok(DeviationMetric::Mad),
            "std" => Ok(DeviationMetric::Std),
            other => {
                Err(DnbError::configuration(format!(
                    "\"{other}\" for deviation_metric is not supported. Please use \
                     \"mad\" or \"std\"."
                )))
            },
        }
    }
}

/// Correlation used as the clustering similarity.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, Default)]
pub enum LinkageMetric {
    /// Pearson correlation of within-row ranks.
    #[default]
    Spearman,
    /// Pearson correlation of raw values.
    Pearson,
}

impl Display for LinkageMetric {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            LinkageMetric::Spearman => write!(f, "spearman"),
            LinkageMetric::Pearson => write!(f, "pearson"),
        }
    }
}

impl FromStr for LinkageMetric {
    type Err = DnbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spearman" => Ok(LinkageMetric::Spearman),
            "pearson" => Ok(LinkageMetric::Pearson),
            other => {
                Err(DnbError::configuration(format!(
                    "\"{other}\" for linkage_metric is not supported. Please use \
                     \"spearman\" or \"pearson\"."
                )))
            },
        }
    }
}

/// Agglomeration rule of the hierarchical clustering.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, Default)]
pub enum LinkageMethod {
    Single,
    Complete,
    #[default]
    Average,
    Weighted,
    Centroid,
    Median,
    Ward,
}

impl LinkageMethod {
    pub const ALL: [LinkageMethod; 7] = [
        LinkageMethod::Single,
        LinkageMethod::Complete,
        LinkageMethod::Average,
        LinkageMethod::Weighted,
        LinkageMethod::Centroid,
        LinkageMethod::Median,
        LinkageMethod::Ward,
    ];

    /// Whether merge heights can decrease along the tree.
    pub fn allows_inversions(&self) -> bool {
        matches!(self, LinkageMethod::Centroid | LinkageMethod::Median)
    }
}

impl Display for LinkageMethod {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let name = match self {
            LinkageMethod::Single => "single",
            LinkageMethod::Complete => "complete",
            LinkageMethod::Average => "average",
            LinkageMethod::Weighted => "weighted",
            LinkageMethod::Centroid => "centroid",
            LinkageMethod::Median => "median",
            LinkageMethod::Ward => "ward",
        };
        write!(f, "{name}")
    }
}

impl FromStr for LinkageMethod {
    type Err = DnbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.to_string() == lower)
            .ok_or_else(|| {
                DnbError::configuration(format!(
                    "\"{s}\" for linkage_method is not supported. Please use one of \
                     single, complete, average, weighted, centroid, median, ward."
                ))
            })
    }
}

/// Per-variable preprocessing of a time series before the EWS.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, Default)]
pub enum Normalization {
    /// Values used as they are.
    #[default]
    Straight,
    /// Each variable divided by its standard deviation.
    Std,
    /// Each variable divided by its range.
    MinMax,
    /// Projection onto the leading principal components.
    Pca,
}

impl Display for Normalization {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Normalization::Straight => write!(f, "straight"),
            Normalization::Std => write!(f, "std"),
            Normalization::MinMax => write!(f, "minmax"),
            Normalization::Pca => write!(f, "pca"),
        }
    }
}

impl FromStr for Normalization {
    type Err = DnbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "straight" => Ok(Normalization::Straight),
            "std" => Ok(Normalization::Std),
            "minmax" => Ok(Normalization::MinMax),
            "pca" => Ok(Normalization::Pca),
            other => {
                Err(DnbError::configuration(format!(
                    "\"{other}\" for normalization is not supported. Please use \
                     'straight', 'pca', 'minmax', or 'std'."
                )))
            },
        }
    }
}

/// Alignment of the windowed statistic relative to the input steps.
#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug, Default)]
pub enum Padding {
    /// One value per full window, no padding.
    Valid,
    /// Centered, both edges repeat the nearest computed value.
    Same,
    /// Causal: `out[t]` summarises the window ending at `t`.
    #[default]
    Online,
}

impl Display for Padding {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Padding::Valid => write!(f, "valid"),
            Padding::Same => write!(f, "same"),
            Padding::Online => write!(f, "online"),
        }
    }
}

impl FromStr for Padding {
    type Err = DnbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(Padding::Valid),
            "same" => Ok(Padding::Same),
            "online" => Ok(Padding::Online),
            other => {
                Err(DnbError::configuration(format!(
                    "\"{other}\" for padding is not supported. Please use 'same', \
                     'online', or 'valid'."
                )))
            },
        }
    }
}

/// Change-point estimation strategy.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CpdStrategy {
    Peak,
    Otsu,
    LinearSegmentation,
    AutoregressiveSegmentation { order: usize },
}

impl Default for CpdStrategy {
    fn default() -> Self {
        CpdStrategy::AutoregressiveSegmentation { order: 1 }
    }
}

impl Display for CpdStrategy {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            CpdStrategy::Peak => write!(f, "peak"),
            CpdStrategy::Otsu => write!(f, "otsu"),
            CpdStrategy::LinearSegmentation => write!(f, "linear"),
            CpdStrategy::AutoregressiveSegmentation { order } => write!(f, "ar:{order}"),
        }
    }
}

impl FromStr for CpdStrategy {
    type Err = DnbError;

    /// Accepts `peak`, `otsu` (or `ohtsu`), `linear`, `ar` and `ar:<order>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let (name, param) = match lower.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (lower.as_str(), None),
        };
        match (name, param) {
            ("peak", None) => Ok(CpdStrategy::Peak),
            ("otsu" | "ohtsu", None) => Ok(CpdStrategy::Otsu),
            ("linear", None) => Ok(CpdStrategy::LinearSegmentation),
            ("ar", None) => Ok(CpdStrategy::AutoregressiveSegmentation { order: 1 }),
            ("ar", Some(order)) => {
                let order = order.parse::<usize>().map_err(|_| {
                    DnbError::configuration(format!("invalid AR order \"{order}\""))
                })?;
                if order == 0 {
                    return Err(DnbError::configuration("AR order must be >= 1"));
                }
                Ok(CpdStrategy::AutoregressiveSegmentation { order })
            },
            _ => {
                Err(DnbError::configuration(format!(
                    "\"{s}\" for change point strategy is not supported. Please use \
                     'peak', 'linear', 'ar[:order]' or 'otsu'."
                )))
            },
        }
    }
}

serde_via_str!(DeviationMetric);
serde_via_str!(LinkageMetric);
serde_via_str!(LinkageMethod);
serde_via_str!(Normalization);
serde_via_str!(Padding);
serde_via_str!(CpdStrategy);

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("mad", DeviationMetric::Mad)]
    #[case("MAD", DeviationMetric::Mad)]
    #[case("std", DeviationMetric::Std)]
    fn deviation_from_str(
        #[case] input: &str,
        #[case] expected: DeviationMetric,
    ) {
        assert_eq!(DeviationMetric::from_str(input).unwrap(), expected);
    }

    #[test]
    fn unknown_names_are_configuration_errors() {
        assert!(DeviationMetric::from_str("iqr").unwrap_err().is_configuration());
        assert!(LinkageMetric::from_str("kendall").unwrap_err().is_configuration());
        assert!(LinkageMethod::from_str("nearest").unwrap_err().is_configuration());
        assert!(Normalization::from_str("zscore").unwrap_err().is_configuration());
        assert!(Padding::from_str("full").unwrap_err().is_configuration());
        assert!(CpdStrategy::from_str("pelt").unwrap_err().is_configuration());
        assert!(CpdStrategy::from_str("ar:0").unwrap_err().is_configuration());
        assert!(CpdStrategy::from_str("ar:x").unwrap_err().is_configuration());
    }

    #[test]
    fn linkage_methods_roundtrip_names() {
        for method in LinkageMethod::ALL {
            assert_eq!(LinkageMethod::from_str(&method.to_string()).unwrap(), method);
        }
    }

    #[rstest]
    #[case("peak", CpdStrategy::Peak)]
    #[case("ohtsu", CpdStrategy::Otsu)]
    #[case("Otsu", CpdStrategy::Otsu)]
    #[case("linear", CpdStrategy::LinearSegmentation)]
    #[case("ar", CpdStrategy::AutoregressiveSegmentation { order: 1 })]
    #[case("ar:3", CpdStrategy::AutoregressiveSegmentation { order: 3 })]
    fn strategy_from_str(
        #[case] input: &str,
        #[case] expected: CpdStrategy,
    ) {
        assert_eq!(CpdStrategy::from_str(input).unwrap(), expected);
    }

    #[test]
    fn enums_serialize_as_names() {
        let json = serde_json::to_string(&LinkageMethod::Ward).unwrap();
        assert_eq!(json, "\"ward\"");
        let parsed: Normalization = serde_json::from_str("\"minmax\"").unwrap();
        assert_eq!(parsed, Normalization::MinMax);
        assert!(serde_json::from_str::<Padding>("\"sideways\"").is_err());
    }
}
