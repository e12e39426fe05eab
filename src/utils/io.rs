//! File I/O primitives with consistent error handling.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Read and deserialize a JSON file.
///
/// Read failures map through `on_io`, parse failures through `on_json`, so
/// callers can pick the error code that fits the file's role.
pub fn read_json<T, IoErr, JsonErr>(path: &Path, on_io: IoErr, on_json: JsonErr) -> Result<T>
where
    T: DeserializeOwned,
    IoErr: FnOnce(std::io::Error) -> Error,
    JsonErr: FnOnce(serde_json::Error) -> Error,
{
    let raw = fs::read_to_string(path).map_err(on_io)?;
    serde_json::from_str(&raw).map_err(on_json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn read_json_maps_missing_file_errors() {
        let err = read_json::<Value, _, _>(
            Path::new("/nonexistent/event.json"),
            |e| Error::event_unreadable("/nonexistent/event.json", e.to_string()),
            |e| Error::internal_json(e.to_string(), None),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::EventUnreadable);
    }

    #[test]
    fn read_json_maps_parse_errors() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{{not json").unwrap();

        let err = read_json::<Value, _, _>(
            temp.path(),
            |e| Error::internal_io(e.to_string(), None),
            |e| Error::config_invalid_json("test.json", e),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidJson);
    }

    #[test]
    fn read_json_parses_objects() {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, r#"{{"sourcePath": "src"}}"#).unwrap();

        let value: Value = read_json(
            temp.path(),
            |e| Error::internal_io(e.to_string(), None),
            |e| Error::internal_json(e.to_string(), None),
        )
        .unwrap();
        assert_eq!(value["sourcePath"], "src");
    }
}
