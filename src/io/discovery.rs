use std::path::{
    Path,
    PathBuf,
};

use glob::Pattern;
use itertools::Itertools;
use log::*;

use crate::config_bail;
use crate::data_structs::TimeKey;
use crate::error::{
    DnbError,
    Result,
};

/// Key of a file named `<prefix><key>.csv`, `<prefix>_<key>.csv` or
/// `<prefix>.<key>.csv`. `None` when the name does not have that form.
pub fn key_from_filename(
    filename: &str,
    prefix: &str,
) -> Option<String> {
    let body = filename.strip_prefix(prefix)?.strip_suffix(".csv")?.trim();
    let body = body
        .strip_prefix('_')
        .or_else(|| body.strip_prefix('.'))
        .unwrap_or(body);
    Some(body.to_string())
}

/// Sorts keyed entries: numerically when every key is an integer,
/// lexicographically when none is. Mixing both is an error.
pub fn sort_by_keys<T>(entries: Vec<(TimeKey, T)>) -> Result<Vec<(TimeKey, T)>> {
    let n_int = entries.iter().filter(|(k, _)| k.is_int()).count();
    if n_int != 0 && n_int != entries.len() {
        config_bail!("numerical suffixes cannot be mixed with other suffixes");
    }
    Ok(entries
        .into_iter()
        .sorted_by(|(a, _), (b, _)| a.cmp(b))
        .collect())
}

/// Finds the CSV files of one dataset series in `dir`, ordered by key.
pub fn discover_files<P: AsRef<Path>>(
    dir: P,
    prefix: &str,
) -> Result<Vec<(TimeKey, PathBuf)>> {
    let dir = dir.as_ref();
    let pattern = dir.join(format!("{}*.csv", Pattern::escape(prefix)));
    let pattern = pattern
        .to_str()
        .ok_or_else(|| DnbError::configuration(format!("invalid path {}", dir.display())))?;

    let mut entries = Vec::new();
    for path in glob::glob(pattern)
        .map_err(|e| DnbError::configuration(format!("invalid file pattern: {e}")))?
    {
        let path = path.map_err(|e| DnbError::Io(e.into()))?;
        let Some(name) = path.file_name().and_then(|n| n.to_str())
        else {
            continue;
        };
        if let Some(key) = key_from_filename(name, prefix) {
            entries.push((TimeKey::parse(&key), path));
        }
    }
    let entries = sort_by_keys(entries)?;
    debug!(
        "Found {} files for \"{}/{prefix}\": {}",
        entries.len(),
        dir.display(),
        entries.iter().map(|(k, _)| k).join(", ")
    );
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("data_12.csv", Some("12"))]
    #[case("data.t3.csv", Some("t3"))]
    #[case("data7.csv", Some("7"))]
    #[case("data.csv", Some(""))]
    #[case("other_1.csv", None)]
    #[case("data_1.tsv", None)]
    fn keys_from_names(
        #[case] name: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(key_from_filename(name, "data"), expected.map(String::from));
    }

    #[test]
    fn integer_keys_sort_numerically() {
        let sorted = sort_by_keys(vec![
            (TimeKey::parse("10"), 'a'),
            (TimeKey::parse("2"), 'b'),
            (TimeKey::parse("1"), 'c'),
        ])
        .unwrap();
        assert_eq!(sorted.iter().map(|(_, v)| *v).collect::<String>(), "cba");
    }

    #[test]
    fn mixed_keys_are_rejected() {
        let err = sort_by_keys(vec![(TimeKey::parse("1"), ()), (TimeKey::parse("a"), ())])
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
