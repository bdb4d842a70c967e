use std::io::{IsTerminal, Write};
use std::sync::Arc;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use groundlink_frame::FrameError;
use groundlink_registry::{Definition, Update, Value, ValueKind};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct UpdateOutput<'a> {
    variable: String,
    tag: u32,
    kind: ValueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    query: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<&'a str>,
}

impl<'a> UpdateOutput<'a> {
    fn new(update: &Update, frame: Option<&'a str>) -> Self {
        Self {
            variable: update.definition().path(),
            tag: update.tag(),
            kind: update.definition().kind,
            value: update.value(),
            query: update.is_query(),
            frame,
        }
    }
}

#[derive(Serialize)]
struct StatusOutput<'a> {
    status: &'a str,
}

#[derive(Serialize)]
struct ErrorOutput {
    error: String,
}

fn print_json(value: &impl Serialize) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn value_cell(update: &Update) -> String {
    update
        .value()
        .map(|value| value.to_string())
        .unwrap_or_else(|| "?".to_string())
}

pub fn print_catalog(definitions: &[&Arc<Definition>], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let entries: Vec<&Definition> = definitions.iter().map(|d| d.as_ref()).collect();
            print_json(&entries);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TAG", "GROUP", "NAME", "KIND", "DEFAULT"]);
            for definition in definitions {
                table.add_row(vec![
                    definition.tag.to_string(),
                    definition.group.clone(),
                    definition.name.clone(),
                    definition.kind.to_string(),
                    definition.zero_value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for definition in definitions {
                println!(
                    "{:>3}  {} ({}, default {})",
                    definition.tag,
                    definition.path(),
                    definition.kind,
                    definition.zero_value
                );
            }
        }
        OutputFormat::Raw => {
            for definition in definitions {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    definition.tag,
                    definition.group,
                    definition.name,
                    definition.kind,
                    definition.zero_value
                );
            }
        }
    }
}

pub fn print_encoded(update: &Update, frame: &[u8], format: OutputFormat) {
    let hex = to_hex(frame);
    match format {
        OutputFormat::Json => print_json(&UpdateOutput::new(update, Some(&hex))),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["VARIABLE", "TAG", "VALUE", "SIZE", "FRAME"])
                .add_row(vec![
                    update.definition().path(),
                    update.tag().to_string(),
                    value_cell(update),
                    frame.len().to_string(),
                    hex,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{update} => {hex}"),
        OutputFormat::Raw => print_raw(frame),
    }
}

pub fn print_decoded(results: &[Result<Update, FrameError>], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for result in results {
                match result {
                    Ok(update) => print_json(&UpdateOutput::new(update, None)),
                    Err(err) => print_json(&ErrorOutput {
                        error: err.to_string(),
                    }),
                }
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "VARIABLE", "TAG", "VALUE"]);
            for (index, result) in results.iter().enumerate() {
                let row = match result {
                    Ok(update) => vec![
                        index.to_string(),
                        update.definition().path(),
                        update.tag().to_string(),
                        value_cell(update),
                    ],
                    Err(err) => vec![
                        index.to_string(),
                        "error".to_string(),
                        String::new(),
                        err.to_string(),
                    ],
                };
                table.add_row(row);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for result in results {
                match result {
                    Ok(update) => println!("{update}"),
                    Err(err) => println!("error: {err}"),
                }
            }
        }
    }
}

/// One update received from the vehicle.
pub fn print_update(update: &Update, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&UpdateOutput::new(update, None)),
        _ => println!("{update}"),
    }
}

pub fn print_status(line: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatusOutput { status: line }),
        _ => println!("-- {line}"),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|byte| format!("{byte:02x}")).collect()
}
