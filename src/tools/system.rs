use anyhow::Result;
use serde_json::{json, Value};

use super::{Tool, ToolResult};

fn empty_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Name of the account running perch.
pub fn current_username() -> Option<String> {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .or_else(|| {
            dirs::home_dir()
                .and_then(|h| h.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
}

pub struct GetUsernameTool;

#[async_trait::async_trait]
impl Tool for GetUsernameTool {
    fn name(&self) -> &str {
        "get_username"
    }

    fn description(&self) -> &str {
        "Return the username of the current user. Useful for building paths like /home/<user> or C:\\Users\\<user>."
    }

    fn schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        match current_username() {
            Some(name) => Ok(ToolResult::success(name)),
            None => Ok(ToolResult::error(
                "could not determine the current username".into(),
            )),
        }
    }
}

pub struct SystemInfoTool;

#[async_trait::async_trait]
impl Tool for SystemInfoTool {
    fn name(&self) -> &str {
        "get_system_info"
    }

    fn description(&self) -> &str {
        "Return basic information about this machine: operating system, architecture, hostname, CPU count, home and working directories."
    }

    fn schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".into());
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get().to_string())
            .unwrap_or_else(|_| "unknown".into());
        let home = dirs::home_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "unknown".into());
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "unknown".into());
        let user = current_username().unwrap_or_else(|| "unknown".into());

        let lines = [
            format!("OS: {} ({})", std::env::consts::OS, std::env::consts::FAMILY),
            format!("Architecture: {}", std::env::consts::ARCH),
            format!("Hostname: {}", host),
            format!("User: {}", user),
            format!("CPUs: {}", cpus),
            format!("Home directory: {}", home),
            format!("Working directory: {}", cwd),
        ];
        Ok(ToolResult::success(lines.join("\n")))
    }
}

pub struct CurrentTimeTool;

#[async_trait::async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Return the current local date and time as YYYY-MM-DD HH:MM:SS."
    }

    fn schema(&self) -> Value {
        empty_schema()
    }

    async fn execute(&self, _input: Value) -> Result<ToolResult> {
        let now = chrono::Local::now();
        Ok(ToolResult::success(
            now.format("%Y-%m-%d %H:%M:%S").to_string(),
        ))
    }
}
