//! The `evalmate tools` command.

use anyhow::Result;

use evalmate_core::tools::tool_definitions;

pub fn execute() -> Result<()> {
    let catalog = serde_json::json!({ "tools": tool_definitions() });
    println!("{}", serde_json::to_string_pretty(&catalog)?);
    Ok(())
}
