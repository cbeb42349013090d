//! Read a dataset file for upload.
//!
//! The file is never parsed here; the backend owns dataset parsing. We only
//! check the extension and read the raw bytes.

use std::fs;
use std::path::Path;

use crate::domain::DatasetUpload;
use crate::error::AppError;

/// Extensions the backend accepts.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xls", "xlsx"];

pub fn read_dataset_upload(path: &Path) -> Result<DatasetUpload, AppError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::usage(format!("Invalid dataset path '{}'", path.display())))?;

    if !has_accepted_extension(path) {
        return Err(AppError::usage(format!(
            "Unsupported dataset file '{file_name}': expected one of .csv, .xls, .xlsx"
        )));
    }

    let bytes = fs::read(path)
        .map_err(|e| AppError::usage(format!("Failed to read dataset '{}': {e}", path.display())))?;

    Ok(DatasetUpload {
        file_name: file_name.to_string(),
        bytes,
    })
}

fn has_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &[u8]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("adsorfit-upload-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn reads_raw_bytes_and_name() {
        let path = temp_file("isotherms.CSV", b"experiment,pressure\nA,1\n");
        let upload = read_dataset_upload(&path).unwrap();
        assert_eq!(upload.file_name, "isotherms.CSV");
        assert_eq!(upload.bytes, b"experiment,pressure\nA,1\n");
    }

    #[test]
    fn rejects_other_extensions() {
        let path = temp_file("notes.txt", b"hello");
        let err = read_dataset_upload(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        assert!(err.message().contains("expected one of .csv, .xls, .xlsx"));
    }

    #[test]
    fn missing_file_is_usage_error() {
        let path = std::env::temp_dir().join("adsorfit-does-not-exist.xlsx");
        let err = read_dataset_upload(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_USAGE);
        assert!(err.message().starts_with("Failed to read dataset"));
    }
}
