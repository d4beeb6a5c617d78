//! List built-in resource kinds

use anyhow::Result;
use colored::Colorize;

use crate::fetch::QueryCatalog;

/// Execute the kinds command
pub fn execute() -> Result<()> {
    let catalog = QueryCatalog::builtin();
    for (kind, template) in catalog.kinds() {
        let params = catalog.required_params(kind)?;
        println!("{}", kind.bold());
        println!("    query:  {template}");
        println!("    params: {}", params.join(", "));
    }
    Ok(())
}
