use groundlink_frame::encode_update;
use groundlink_registry::Value;

use crate::cmd::{load_registry, EncodeArgs};
use crate::exit::{frame_error, registry_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.catalog.as_deref())?;

    let (group, name) = args
        .variable
        .split_once('.')
        .ok_or_else(|| CliError::new(USAGE, "variable must be written as group.name"))?;
    let value = args
        .value
        .as_deref()
        .map(|raw| {
            Value::parse(raw)
                .ok_or_else(|| CliError::new(USAGE, format!("cannot parse value '{raw}'")))
        })
        .transpose()?;

    let update = registry
        .bind(group, name, value)
        .map_err(|err| registry_error("bind", err))?;
    let frame = encode_update(&update).map_err(|err| frame_error("encode", err))?;

    print_encoded(&update, &frame, format);
    Ok(SUCCESS)
}
