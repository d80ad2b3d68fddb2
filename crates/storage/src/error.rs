use core_types::DataError;
use std::io;
use std::path::Path;

/// Maps a `csv` failure onto the shared data-access taxonomy.
pub(crate) fn csv_error(path: &Path, err: csv::Error) -> DataError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io_err) = err.into_kind() {
            return io_error(path, io_err);
        }
        return DataError::Unavailable(path.display().to_string());
    }
    DataError::Parse(format!("{}: {}", path.display(), err))
}

/// A missing file is `NotFound`; anything else stays an I/O failure.
pub(crate) fn io_error(path: &Path, err: io::Error) -> DataError {
    if err.kind() == io::ErrorKind::NotFound {
        DataError::NotFound(path.display().to_string())
    } else {
        DataError::Io(err)
    }
}

pub(crate) fn parse_error(path: &Path, field: &str, value: &str) -> DataError {
    DataError::Parse(format!("{}: invalid {} '{}'", path.display(), field, value))
}
