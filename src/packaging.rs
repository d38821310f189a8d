//! Extension packaging
//!
//! `zip_directory` archives the unpacked extension so it can be uploaded to a
//! store or sideloaded. Entries are written in sorted path order with a fixed
//! timestamp and mode, so the same tree always produces the same bytes.
//!
//! `build_public` assembles the static site: `landing/` is copied to
//! `public/landing/` and the extension archive lands in `public/extension.zip`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::console;
use crate::error::PackError;

pub const EXTENSION_DIR: &str = "extension";
pub const LANDING_DIR: &str = "landing";
pub const PUBLIC_DIR: &str = "public";
pub const ARCHIVE_NAME: &str = "extension.zip";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    pub files: usize,
    pub bytes: u64,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> PackError + '_ {
    move |source| PackError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn zip_err(e: impl std::fmt::Display) -> PackError {
    PackError::Zip(e.to_string())
}

/// Regular files under `root`, sorted, as (relative path with `/`, absolute path)
fn collect_files(root: &Path) -> Result<Vec<(String, PathBuf)>, PackError> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).map_err(io_err(&dir))? {
            let entry = entry.map_err(io_err(&dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(io_err(&path))?;
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() {
                let relative = path
                    .strip_prefix(root)
                    .map_err(|e| PackError::Zip(e.to_string()))?
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                out.push((relative, path));
            }
        }
    }

    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

/// Write every file under `source` into a deflated (level 9) archive at `output`.
/// Paths inside the archive are relative to `source`.
pub fn zip_directory(source: &Path, output: &Path) -> Result<PackReport, PackError> {
    if !source.is_dir() {
        return Err(PackError::MissingDirectory(source.to_path_buf()));
    }
    let files = collect_files(source)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let file = fs::File::create(output).map_err(io_err(output))?;
    let mut writer = ZipWriter::new(file);

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9))
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644);

    let mut report = PackReport::default();
    for (name, path) in files {
        let bytes = fs::read(&path).map_err(io_err(&path))?;
        writer.start_file(name.as_str(), options).map_err(zip_err)?;
        writer.write_all(&bytes).map_err(io_err(&path))?;
        report.files += 1;
        report.bytes += bytes.len() as u64;
    }
    writer.finish().map_err(zip_err)?;

    console::log(&format!(
        "[Pack] wrote {} ({} files, {} bytes)",
        output.display(),
        report.files,
        report.bytes
    ));
    Ok(report)
}

/// Recursively copy `source` into `dest`. A missing `source` copies nothing.
pub fn copy_dir(source: &Path, dest: &Path) -> Result<usize, PackError> {
    if !source.is_dir() {
        return Ok(0);
    }
    let mut copied = 0;
    for (relative, path) in collect_files(source)? {
        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::copy(&path, &target).map_err(io_err(&target))?;
        copied += 1;
    }
    Ok(copied)
}

/// Build `<root>/public` from `<root>/landing` and `<root>/extension`
pub fn build_public(root: &Path) -> Result<PackReport, PackError> {
    let public = root.join(PUBLIC_DIR);
    fs::create_dir_all(&public).map_err(io_err(&public))?;

    let copied = copy_dir(&root.join(LANDING_DIR), &public.join(LANDING_DIR))?;
    if copied == 0 {
        console::warn(&format!("[Pack] no {}/ directory, skipping", LANDING_DIR));
    }

    zip_directory(&root.join(EXTENSION_DIR), &public.join(ARCHIVE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn extension_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("manifest.json"), r#"{"manifest_version":3}"#).unwrap();
        fs::write(root.join("popup.html"), "<html></html>").unwrap();
        fs::create_dir_all(root.join("pkg")).unwrap();
        fs::write(root.join("pkg").join("linguist_core.js"), "export default 1;").unwrap();
        dir
    }

    fn entry_names(archive: &Path) -> Vec<String> {
        let file = fs::File::open(archive).unwrap();
        let zip = zip::ZipArchive::new(file).unwrap();
        zip.file_names().map(str::to_string).collect::<Vec<_>>()
    }

    #[test]
    fn test_zip_directory_entries_relative_and_sorted() {
        let ext = extension_tree();
        let out = TempDir::new().unwrap();
        let archive = out.path().join("extension.zip");

        let report = zip_directory(ext.path(), &archive).unwrap();
        assert_eq!(report.files, 3);

        let mut names = entry_names(&archive);
        names.sort();
        assert_eq!(names, vec!["manifest.json", "pkg/linguist_core.js", "popup.html"]);

        let file = fs::File::open(&archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        let mut manifest = String::new();
        zip.by_name("manifest.json").unwrap().read_to_string(&mut manifest).unwrap();
        assert_eq!(manifest, r#"{"manifest_version":3}"#);
    }

    #[test]
    fn test_zip_is_deterministic() {
        let ext = extension_tree();
        let out = TempDir::new().unwrap();
        let a = out.path().join("a.zip");
        let b = out.path().join("b.zip");
        zip_directory(ext.path(), &a).unwrap();
        zip_directory(ext.path(), &b).unwrap();
        assert_eq!(fs::read(a).unwrap(), fs::read(b).unwrap());
    }

    #[test]
    fn test_missing_extension_dir() {
        let out = TempDir::new().unwrap();
        let err = zip_directory(&out.path().join("nope"), &out.path().join("x.zip")).unwrap_err();
        assert!(matches!(err, PackError::MissingDirectory(_)));
    }

    #[test]
    fn test_build_public() {
        let root = TempDir::new().unwrap();
        let ext = root.path().join(EXTENSION_DIR);
        fs::create_dir_all(&ext).unwrap();
        fs::write(ext.join("manifest.json"), "{}").unwrap();
        let landing = root.path().join(LANDING_DIR).join("assets");
        fs::create_dir_all(&landing).unwrap();
        fs::write(root.path().join(LANDING_DIR).join("index.html"), "<h1>LinguistAI</h1>").unwrap();
        fs::write(landing.join("logo.svg"), "<svg/>").unwrap();

        let report = build_public(root.path()).unwrap();
        assert_eq!(report.files, 1);

        let public = root.path().join(PUBLIC_DIR);
        assert!(public.join(ARCHIVE_NAME).is_file());
        assert_eq!(
            fs::read_to_string(public.join("landing").join("index.html")).unwrap(),
            "<h1>LinguistAI</h1>"
        );
        assert!(public.join("landing").join("assets").join("logo.svg").is_file());
    }

    #[test]
    fn test_build_public_without_landing() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(EXTENSION_DIR)).unwrap();
        fs::write(root.path().join(EXTENSION_DIR).join("content.js"), "").unwrap();
        build_public(root.path()).unwrap();
        assert!(root.path().join(PUBLIC_DIR).join(ARCHIVE_NAME).is_file());
        assert!(!root.path().join(PUBLIC_DIR).join(LANDING_DIR).exists());
    }
}
