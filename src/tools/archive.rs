//! Zip archive creation and extraction.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::File;
use std::io;
use std::path::Path;

use super::{parse_args, Tool, ToolResult};

// --- zip_files ---

#[derive(Deserialize)]
struct ZipInput {
    source_path: String,
    output_zip_path: String,
}

pub struct ZipFilesTool;

fn add_dir(
    writer: &mut zip::ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: zip::write::FileOptions,
) -> Result<usize> {
    let mut count = 0;
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            count += add_dir(writer, root, &path, options)?;
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(&path);
        // Archive names always use forward slashes.
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        writer.start_file(name, options)?;
        let mut file = File::open(&path)?;
        io::copy(&mut file, writer)?;
        count += 1;
    }
    Ok(count)
}

/// Writes `source` (a file or a directory tree) into a new archive at `output`.
pub fn zip_path(source: &Path, output: &Path) -> Result<usize> {
    let out = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = zip::ZipWriter::new(out);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let count = if source.is_dir() {
        add_dir(&mut writer, source, source, options)?
    } else {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("source has no file name")?;
        writer.start_file(name, options)?;
        let mut file = File::open(source)?;
        io::copy(&mut file, &mut writer)?;
        1
    };
    writer.finish()?;
    Ok(count)
}

#[async_trait::async_trait]
impl Tool for ZipFilesTool {
    fn name(&self) -> &str {
        "zip_files"
    }

    fn description(&self) -> &str {
        "Compress a single file or an entire directory into a .zip archive."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source_path": {
                    "type": "string",
                    "description": "Full path of the file or directory to compress"
                },
                "output_zip_path": {
                    "type": "string",
                    "description": "Full path of the .zip file to create"
                }
            },
            "required": ["source_path", "output_zip_path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: ZipInput = parse_args(self.name(), input)?;
        let source = Path::new(&input.source_path);
        if !source.exists() {
            return Ok(ToolResult::error(format!(
                "The path '{}' does not exist.",
                input.source_path
            )));
        }
        let count = zip_path(source, Path::new(&input.output_zip_path))?;
        Ok(ToolResult::success(format!(
            "Successfully created zip file: {} ({} files)",
            input.output_zip_path, count
        )))
    }
}

// --- unzip_file ---

#[derive(Deserialize)]
struct UnzipInput {
    zip_path: String,
    destination_dir: String,
}

pub struct UnzipFileTool;

/// Extracts every entry of `archive` below `dest`.
///
/// Entries whose names would escape `dest` (absolute paths, `..`) are
/// skipped and counted separately.
pub fn unzip_path(archive: &Path, dest: &Path) -> Result<(usize, usize)> {
    let file = File::open(archive)
        .with_context(|| format!("failed to open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("not a valid zip archive")?;
    std::fs::create_dir_all(dest)?;

    let mut extracted = 0;
    let mut skipped = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            tracing::warn!(entry = entry.name(), "skipping unsafe zip entry");
            skipped += 1;
            continue;
        };
        let out_path = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        extracted += 1;
    }
    Ok((extracted, skipped))
}

#[async_trait::async_trait]
impl Tool for UnzipFileTool {
    fn name(&self) -> &str {
        "unzip_file"
    }

    fn description(&self) -> &str {
        "Extract the contents of a .zip archive into a directory, creating it if needed."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "zip_path": {
                    "type": "string",
                    "description": "Full path of the .zip file"
                },
                "destination_dir": {
                    "type": "string",
                    "description": "Directory to extract into"
                }
            },
            "required": ["zip_path", "destination_dir"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: UnzipInput = parse_args(self.name(), input)?;
        let (extracted, skipped) =
            unzip_path(Path::new(&input.zip_path), Path::new(&input.destination_dir))?;
        let mut text = format!(
            "Successfully extracted '{}' to '{}' ({} files).",
            input.zip_path, input.destination_dir, extracted
        );
        if skipped > 0 {
            text.push_str(&format!(" Skipped {} entries with unsafe paths.", skipped));
        }
        Ok(ToolResult::success(text))
    }
}
