//! Filesystem navigation and manipulation tools.
//!
//! Paths come straight from the model, usually absolute. Nothing here is
//! sandboxed to a root directory: the assistant acts on the user's whole
//! machine on the user's behalf.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use super::{parse_args, Tool, ToolResult};

use crate::constants::{FIND_FILES_MAX_RESULTS, TREE_MAX_ENTRIES};

/// Joins a directory and an item name, the way every tool here addresses items.
fn join(dir: &str, name: &str) -> PathBuf {
    Path::new(dir).join(name)
}

// --- list_directory_tree ---

#[derive(Deserialize)]
struct TreeInput {
    path: String,
    #[serde(default)]
    depth: usize,
}

pub struct ListDirectoryTreeTool;

/// Appends `- name` lines for `dir`, indented two spaces per level.
///
/// Unreadable directories are skipped silently. Returns `false` once the
/// entry cap is reached.
fn walk(dir: &Path, level: usize, max_depth: usize, lines: &mut Vec<String>) -> bool {
    if level > max_depth {
        return true;
    }
    let Ok(read) = std::fs::read_dir(dir) else {
        return true;
    };
    let mut entries: Vec<_> = read.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        if lines.len() >= TREE_MAX_ENTRIES {
            lines.push(format!("... truncated at {} entries", TREE_MAX_ENTRIES));
            return false;
        }
        lines.push(format!(
            "{}- {}",
            "  ".repeat(level),
            entry.file_name().to_string_lossy()
        ));
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir && !walk(&entry.path(), level + 1, max_depth, lines) {
            return false;
        }
    }
    true
}

#[async_trait::async_trait]
impl Tool for ListDirectoryTreeTool {
    fn name(&self) -> &str {
        "list_directory_tree"
    }

    fn description(&self) -> &str {
        "Return the folder and file tree of a directory. depth 0 lists only the directory itself; each extra level descends one folder deeper."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Root directory to explore"
                },
                "depth": {
                    "type": "integer",
                    "description": "How many levels deep to explore (default 0)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: TreeInput = parse_args(self.name(), input)?;
        let root = Path::new(&input.path);
        if !root.exists() {
            return Ok(ToolResult::error(format!(
                "Path does not exist: {}",
                input.path
            )));
        }
        if !root.is_dir() {
            return Ok(ToolResult::error(format!(
                "Path is not a directory: {}",
                input.path
            )));
        }

        let mut lines = Vec::new();
        walk(root, 0, input.depth, &mut lines);
        if lines.is_empty() {
            Ok(ToolResult::success(format!(
                "The directory '{}' is empty.",
                input.path
            )))
        } else {
            Ok(ToolResult::success(lines.join("\n")))
        }
    }
}

// --- find_files ---

#[derive(Deserialize)]
struct FindInput {
    start_dir: String,
    pattern: String,
}

pub struct FindFilesTool;

#[async_trait::async_trait]
impl Tool for FindFilesTool {
    fn name(&self) -> &str {
        "find_files"
    }

    fn description(&self) -> &str {
        "Find files matching a glob pattern (e.g. '*.txt', 'report.*', 'image_?.png') in a directory and all of its subdirectories."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "start_dir": {
                    "type": "string",
                    "description": "Directory to start the search from"
                },
                "pattern": {
                    "type": "string",
                    "description": "Glob pattern matched against file names"
                }
            },
            "required": ["start_dir", "pattern"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: FindInput = parse_args(self.name(), input)?;
        let full_pattern = Path::new(&input.start_dir).join("**").join(&input.pattern);
        let pattern_str = full_pattern.to_string_lossy();

        let mut paths: Vec<String> = Vec::new();
        for entry in glob::glob(&pattern_str)
            .with_context(|| format!("invalid pattern '{}'", input.pattern))?
        {
            if paths.len() >= FIND_FILES_MAX_RESULTS {
                paths.push(format!("... truncated at {} results", FIND_FILES_MAX_RESULTS));
                break;
            }
            // Unreadable entries are skipped rather than failing the search.
            if let Ok(path) = entry {
                paths.push(path.display().to_string());
            }
        }

        if paths.is_empty() {
            Ok(ToolResult::success(format!(
                "No files found matching '{}' in '{}'.",
                input.pattern, input.start_dir
            )))
        } else {
            Ok(ToolResult::success(format!(
                "Found files:\n{}",
                paths.join("\n")
            )))
        }
    }
}

// --- create ---

#[derive(Deserialize)]
struct ItemInput {
    path: String,
    name: String,
}

pub struct CreateTool;

#[async_trait::async_trait]
impl Tool for CreateTool {
    fn name(&self) -> &str {
        "create"
    }

    fn description(&self) -> &str {
        "Create a file or folder inside a directory. A name containing a dot (e.g. 'notes.txt') creates an empty file; any other name creates a folder."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory in which to create the item"
                },
                "name": {
                    "type": "string",
                    "description": "File name with extension, or folder name"
                }
            },
            "required": ["path", "name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: ItemInput = parse_args(self.name(), input)?;
        let target = join(&input.path, &input.name);

        if input.name.contains('.') {
            std::fs::File::create(&target)
                .with_context(|| format!("failed to create file {}", target.display()))?;
            Ok(ToolResult::success(format!(
                "File created: {}",
                target.display()
            )))
        } else {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("failed to create folder {}", target.display()))?;
            Ok(ToolResult::success(format!(
                "Folder created: {}",
                target.display()
            )))
        }
    }
}

// --- delete ---

pub struct DeleteTool;

#[async_trait::async_trait]
impl Tool for DeleteTool {
    fn name(&self) -> &str {
        "delete"
    }

    fn description(&self) -> &str {
        "Delete a file, or a folder with everything inside it."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory containing the item"
                },
                "name": {
                    "type": "string",
                    "description": "Name of the file or folder to delete"
                }
            },
            "required": ["path", "name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: ItemInput = parse_args(self.name(), input)?;
        let target = join(&input.path, &input.name);

        if target.is_file() {
            std::fs::remove_file(&target)
                .with_context(|| format!("failed to delete {}", target.display()))?;
            Ok(ToolResult::success(format!(
                "File deleted: {}",
                target.display()
            )))
        } else if target.is_dir() {
            std::fs::remove_dir_all(&target)
                .with_context(|| format!("failed to delete {}", target.display()))?;
            Ok(ToolResult::success(format!(
                "Folder deleted: {}",
                target.display()
            )))
        } else {
            Ok(ToolResult::error(format!(
                "Item not found: {}",
                target.display()
            )))
        }
    }
}

// --- move_item ---

#[derive(Deserialize)]
struct MoveInput {
    source: String,
    destination: String,
    name: String,
}

pub struct MoveTool;

/// Moves `from` to `to`, copying across filesystems when a rename is refused.
fn move_path(from: &Path, to: &Path) -> Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    if from.is_dir() {
        copy_dir(from, to)?;
        std::fs::remove_dir_all(from)?;
    } else {
        std::fs::copy(from, to)?;
        std::fs::remove_file(from)?;
    }
    Ok(())
}

fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[async_trait::async_trait]
impl Tool for MoveTool {
    fn name(&self) -> &str {
        "move_item"
    }

    fn description(&self) -> &str {
        "Move a file or folder from one directory to another, keeping its name."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "source": {
                    "type": "string",
                    "description": "Directory the item is currently in"
                },
                "destination": {
                    "type": "string",
                    "description": "Directory to move the item into"
                },
                "name": {
                    "type": "string",
                    "description": "Name of the file or folder to move"
                }
            },
            "required": ["source", "destination", "name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: MoveInput = parse_args(self.name(), input)?;
        let from = join(&input.source, &input.name);
        let to = join(&input.destination, &input.name);

        if !from.exists() {
            return Ok(ToolResult::error(format!(
                "Item not found: {}",
                from.display()
            )));
        }
        move_path(&from, &to).with_context(|| {
            format!("failed to move {} to {}", from.display(), to.display())
        })?;
        Ok(ToolResult::success(format!("Moved to: {}", to.display())))
    }
}

// --- rename ---

#[derive(Deserialize)]
struct RenameInput {
    path: String,
    old_name: String,
    new_name: String,
}

pub struct RenameTool;

#[async_trait::async_trait]
impl Tool for RenameTool {
    fn name(&self) -> &str {
        "rename"
    }

    fn description(&self) -> &str {
        "Rename a file or folder within its directory."
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory containing the item"
                },
                "old_name": {
                    "type": "string",
                    "description": "Current name"
                },
                "new_name": {
                    "type": "string",
                    "description": "New name"
                }
            },
            "required": ["path", "old_name", "new_name"]
        })
    }

    async fn execute(&self, input: Value) -> Result<ToolResult> {
        let input: RenameInput = parse_args(self.name(), input)?;
        let from = join(&input.path, &input.old_name);
        let to = join(&input.path, &input.new_name);

        if to.exists() {
            return Ok(ToolResult::error(format!(
                "An item named '{}' already exists in {}",
                input.new_name, input.path
            )));
        }
        std::fs::rename(&from, &to)
            .with_context(|| format!("failed to rename {}", from.display()))?;
        Ok(ToolResult::success(format!("Renamed to: {}", to.display())))
    }
}
