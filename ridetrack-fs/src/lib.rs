//! Shared filesystem helpers built on `cap-std` and `camino`.
#![forbid(unsafe_code)]

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read};

/// Open a UTF-8 file path using ambient authority.
pub fn open_utf8_file(path: &Utf8Path) -> io::Result<fs_utf8::File> {
    fs_utf8::File::open_ambient(path, ambient_authority())
}

/// Read the whole file at `path` into a string.
pub fn read_utf8_file(path: &Utf8Path) -> io::Result<String> {
    let mut file = open_utf8_file(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Resolve an ambient directory for the given path and return the directory with the file name.
pub fn open_dir_and_file(path: &Utf8Path) -> io::Result<(fs_utf8::Dir, String)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path should include a file name"))?
        .to_owned();
    let dir = fs_utf8::Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, file_name))
}

/// Return whether a path exists and is a regular file using capability-based IO.
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = open_dir_and_file(path)?;
    match dir.metadata(name.as_str()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::io::Write;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).expect("temp paths are UTF-8")
    }

    #[rstest]
    fn reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{{\"42\": []}}").expect("write");
        let contents = read_utf8_file(&utf8(file.path())).expect("read");
        assert_eq!(contents.trim(), "{\"42\": []}");
    }

    #[rstest]
    fn distinguishes_files_from_directories_and_missing_paths() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("track.jsonl");
        std::fs::write(&file, "").expect("write");

        assert!(file_is_file(&utf8(&file)).expect("metadata"));
        assert!(!file_is_file(&utf8(dir.path())).unwrap_or(false));
        assert!(!file_is_file(&utf8(&dir.path().join("missing.json"))).expect("metadata"));
    }

    #[rstest]
    fn missing_file_is_an_error_when_read() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = utf8(&dir.path().join("absent.json"));
        let err = read_utf8_file(&missing).expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
