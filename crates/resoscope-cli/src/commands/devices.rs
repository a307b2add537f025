//! Serial port listing.

use std::path::Path;

use clap::Args;
use resoscope_io::{list_ports, select_port};

use super::common::load_config;

#[derive(Args)]
pub struct DevicesArgs {
    /// Match against these keywords instead of the configured ones
    #[arg(short, long, value_delimiter = ',')]
    keywords: Vec<String>,
}

pub fn run(args: DevicesArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let keywords = if args.keywords.is_empty() {
        config.acquisition.port_keywords
    } else {
        args.keywords
    };

    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found.");
        return Ok(());
    }

    let selected = select_port(&ports, &keywords).map(|p| p.path.clone());

    println!("Serial Ports");
    println!("============\n");
    for (idx, port) in ports.iter().enumerate() {
        let marker = if selected.as_deref() == Some(port.path.as_str()) {
            "*"
        } else {
            " "
        };
        println!("{marker} [{idx}] {}  {}", port.path, port.description);
        if let Some((vid, pid)) = port.usb_id {
            println!("        usb: {vid:04x}:{pid:04x}");
        }
    }
    println!();

    match (&config.acquisition.port, selected) {
        (Some(port), _) => println!("Configured port: {port}"),
        (None, Some(path)) => println!("Auto-selected: {path} (matched {})", keywords.join(", ")),
        (None, None) => println!("No port matches: {}", keywords.join(", ")),
    }

    Ok(())
}
