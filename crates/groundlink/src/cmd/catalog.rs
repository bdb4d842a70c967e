use std::sync::Arc;

use groundlink_registry::Definition;

use crate::cmd::{load_registry, CatalogArgs};
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_catalog, OutputFormat};

pub fn run(args: CatalogArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.catalog.as_deref())?;

    let definitions: Vec<&Arc<Definition>> = registry
        .iter()
        .filter(|d| args.group.as_deref().is_none_or(|group| d.group == group))
        .collect();
    if let (Some(group), true) = (&args.group, definitions.is_empty()) {
        return Err(CliError::new(USAGE, format!("unknown group '{group}'")));
    }

    print_catalog(&definitions, format);
    Ok(SUCCESS)
}
