use groundlink_frame::decode_frames;

use crate::cmd::{load_registry, DecodeArgs};
use crate::exit::{CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_decoded, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.catalog.as_deref())?;
    let buffer = parse_hex(&args.hex)?;

    let results = decode_frames(&buffer, &registry);
    print_decoded(&results, format);

    if results.iter().any(Result::is_err) {
        Ok(DATA_INVALID)
    } else {
        Ok(SUCCESS)
    }
}

/// Accepts `0x` prefixes and whitespace or `:` between bytes.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let input = input.trim();
    let input = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "hex input has an odd number of digits"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).unwrap_or("");
            u8::from_str_radix(text, 16)
                .map_err(|_| CliError::new(USAGE, format!("invalid hex byte '{text}'")))
        })
        .collect()
}
