use std::path::{Path, PathBuf};

use log::{info, warn};
use tempfile::NamedTempFile;

use super::model::Table;
use crate::error::{PipelineError, Result};

/// A table written to a temporary file next to its destination, not yet
/// visible at `path`.
#[derive(Debug)]
pub struct StagedCsv {
    tmp: NamedTempFile,
    path: PathBuf,
    rows: usize,
}

impl StagedCsv {
    /// Rename the staged file into place, replacing any existing file.
    pub fn commit(self) -> Result<PathBuf> {
        let StagedCsv { tmp, path, rows } = self;
        tmp.persist(&path)
            .map_err(|e| PipelineError::persist(&path, e.error.to_string()))?;
        info!("wrote {} rows to {}", rows, path.display());
        Ok(path)
    }
}

/// Write `table` as comma-delimited CSV with a header row into a temporary
/// file in the destination's directory. The parent directory must already
/// exist. Dropping the result without committing removes the temporary file.
pub fn stage_csv(table: &Table, path: &Path) -> Result<StagedCsv> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(PipelineError::persist(
            path,
            format!("output directory {} does not exist", parent.display()),
        ));
    }

    let err = |e: &dyn std::fmt::Display| PipelineError::persist(path, e.to_string());

    let tmp = NamedTempFile::new_in(parent).map_err(|e| err(&e))?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file());
        writer.write_record(table.columns()).map_err(|e| err(&e))?;
        for row in table.rows() {
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .map_err(|e| err(&e))?;
        }
        writer.flush().map_err(|e| err(&e))?;
    }
    tmp.as_file().sync_all().map_err(|e| err(&e))?;

    Ok(StagedCsv {
        tmp,
        path: path.to_path_buf(),
        rows: table.len(),
    })
}

/// Write `table` as CSV, replacing any existing file at `path`.
///
/// Readers see either the old file or the complete new one.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    stage_csv(table, path)?.commit().map(|_| ())
}

/// Stage every table, then commit them all. Nothing becomes visible unless
/// every table staged; a failed rename removes the files already committed.
pub fn write_all<'a, I>(outputs: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = (&'a Table, &'a Path)>,
{
    let staged = outputs
        .into_iter()
        .map(|(table, path)| stage_csv(table, path))
        .collect::<Result<Vec<_>>>()?;

    let mut written = Vec::with_capacity(staged.len());
    for file in staged {
        match file.commit() {
            Ok(path) => written.push(path),
            Err(e) => {
                for path in &written {
                    if let Err(rm) = std::fs::remove_file(path) {
                        warn!("could not remove {}: {rm}", path.display());
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_table, DatasetSource};
    use crate::data::model::Value;

    fn sample() -> Table {
        Table::from_rows(
            vec!["b".into(), "a".into(), "when".into()],
            vec![
                vec![Value::Float(1.5), Value::Str("x, y".into()), Value::Null],
                vec![Value::Int(2), Value::Str("z".into()), Value::Float(3.0)],
            ],
        )
    }

    #[test]
    fn round_trip_preserves_rows_and_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&sample(), &path).unwrap();

        let back = load_table(&DatasetSource::new("out", &path)).unwrap();
        assert_eq!(back.columns(), sample().columns());
        assert_eq!(back.len(), 2);
        assert_eq!(back.get(0, "a"), Some(&Value::Str("x, y".into())));
        assert_eq!(back.get(1, "when"), Some(&Value::Float(3.0)));
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        std::fs::write(&path, "stale\n1\n2\n3\n").unwrap();
        write_csv(&sample().head(1), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("b,a,when"));
    }

    #[test]
    fn missing_directory_is_a_persist_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let err = write_csv(&sample(), &path).unwrap_err();
        assert_eq!(err.stage(), "persist");
        assert!(!path.exists());
    }

    #[test]
    fn staged_file_is_invisible_until_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let staged = stage_csv(&sample(), &path).unwrap();
        assert!(!path.exists());
        assert_eq!(staged.commit().unwrap(), path);
        assert!(path.is_file());
    }

    #[test]
    fn dropped_stage_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        drop(stage_csv(&sample(), &path).unwrap());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn write_all_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.csv");
        let second = dir.path().join("missing").join("second.csv");
        let table = sample();
        let err = write_all([(&table, first.as_path()), (&table, second.as_path())]).unwrap_err();
        assert_eq!(err.stage(), "persist");
        assert!(!first.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
