use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{select, Receiver};
use groundlink_link::GroundLink;
use groundlink_registry::Update;
use groundlink_transport::{
    parse_duration, spawn_transport, status_channel, SerialConfig, SerialMedium, StatusSink,
    TransportConfig, TransportHandle,
};
use tracing::{debug, info};

use crate::cmd::console::Console;
use crate::cmd::{load_registry, RunArgs};
use crate::exit::{
    io_error, link_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE,
};
use crate::output::{print_status, print_update, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = load_registry(args.catalog.as_deref())?;
    let config = TransportConfig {
        retry_interval: parse_duration(&args.retry)
            .map_err(|err| transport_error("--retry", err))?,
        write_timeout: parse_duration(&args.write_timeout)
            .map_err(|err| transport_error("--write-timeout", err))?,
        ..TransportConfig::default()
    };

    let (sink, status) = status_channel();
    let transports = start_transports(&args, &config, &sink)?;
    if transports.is_empty() {
        return Err(CliError::new(
            USAGE,
            "no links configured, pass --serial <LINK> at least once",
        ));
    }

    let link = GroundLink::start_with_status(Arc::clone(&registry), transports, sink, status)
        .map_err(|err| link_error("start", err))?;
    info!(links = ?link.links(), "ground link running");
    let (requests, updates, status) = link.into_parts();

    thread::Builder::new()
        .name("printer".to_string())
        .spawn(move || print_incoming(updates, status, format))
        .map_err(|err| io_error("spawn printer", err))?;

    let mut console = Console::new(registry);
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|err| io_error("stdin", err))?;
        match console.parse(&line) {
            Ok(Some(update)) => {
                debug!(update = %update, "sending");
                if requests.send(vec![update]).is_err() {
                    return Err(CliError::new(INTERNAL, "ground link stopped"));
                }
            }
            Ok(None) => {}
            Err(err) => eprintln!("{err}"),
        }
    }

    Ok(SUCCESS)
}

/// Serial links in the order given, then the wireless link.
fn start_transports(
    args: &RunArgs,
    config: &TransportConfig,
    sink: &StatusSink,
) -> CliResult<Vec<TransportHandle>> {
    let mut transports = Vec::new();

    for link in &args.serial {
        let serial: SerialConfig = link
            .parse()
            .map_err(|err| transport_error("--serial", err))?;
        let handle = spawn_transport(SerialMedium::new(serial), config.clone(), sink.clone())
            .map_err(|err| transport_error("start serial", err))?;
        transports.push(handle);
    }

    #[cfg(feature = "ble")]
    if args.ble {
        use groundlink_transport::{BleUart, WirelessMedium};

        let uart =
            BleUart::new(config.write_timeout).map_err(|err| transport_error("--ble", err))?;
        let handle = spawn_transport(
            WirelessMedium::new("ble", uart),
            config.clone(),
            sink.clone(),
        )
        .map_err(|err| transport_error("start ble", err))?;
        transports.push(handle);
    }

    Ok(transports)
}

fn print_incoming(updates: Receiver<Update>, status: Receiver<String>, format: OutputFormat) {
    loop {
        select! {
            recv(updates) -> update => match update {
                Ok(update) => print_update(&update, format),
                Err(_) => return,
            },
            recv(status) -> line => match line {
                Ok(line) => print_status(&line, format),
                Err(_) => return,
            },
        }
    }
}
