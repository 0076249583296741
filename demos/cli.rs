use inquire::{Confirm, CustomType, Select};

use lw3010ec::sink::{CommandFailure, StatusSink, StatusUpdate};
use lw3010ec::{Command, Config, Controller, scaling, serial};

struct PrintSink;

impl StatusSink for PrintSink {
    fn on_status_changed(&mut self, update: &StatusUpdate) {
        let s = &update.snapshot;
        let c = &update.changed;
        if c.set_voltage || c.set_current {
            println!(
                "set-points: {:.2} V / {:.2} A",
                scaling::raw_to_display(s.set_voltage_raw),
                scaling::raw_to_display(s.set_current_raw),
            );
        }
        if c.output_voltage || c.output_current {
            println!(
                "output: {:.2} V / {:.2} A",
                scaling::raw_to_display(s.output_voltage_raw),
                scaling::raw_to_display(s.output_current_raw),
            );
        }
        if c.output_on {
            println!("output {}", if s.output_on { "ON" } else { "OFF" });
        }
        if c.mode {
            println!("regulation mode: {:?}", s.mode);
        }
    }

    fn on_command_failed(&mut self, failure: &CommandFailure) {
        match failure {
            CommandFailure::Rejected { requested, limit } => {
                eprintln!("rejected: raw value {requested} exceeds device limit {limit}");
            }
            CommandFailure::Transport { detail } => {
                eprintln!("command failed on the wire: {detail}");
            }
        }
    }
}

fn main() {
    env_logger::init();

    // Port from the command line, else auto-detect by USB adapter, else ask.
    let port_name = std::env::args().nth(1).or_else(serial::find_supply_port);
    let port_name = port_name.unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");
        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }
        let names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();
        Select::new("Select a serial port:", names)
            .prompt()
            .expect("Failed to select port")
    });
    println!("Using port: {port_name}");

    let mut config = Config::default();
    config.port = port_name;

    let controller = Controller::start(&config, PrintSink).expect("Failed to start controller");

    loop {
        let action = Select::new(
            "Action:",
            vec!["apply set-points", "toggle output", "quit"],
        )
        .prompt()
        .expect("Failed to read action");

        match action {
            "apply set-points" => {
                let volts: f32 = CustomType::new("Voltage (V):")
                    .with_help_message("0.01 - 29.99")
                    .prompt()
                    .expect("Failed to read voltage");
                let amps: f32 = CustomType::new("Current limit (A):")
                    .with_help_message("0.01 - 10.49")
                    .prompt()
                    .expect("Failed to read current");
                let cycle = Confirm::new("Cycle output around the write?")
                    .with_default(true)
                    .prompt()
                    .expect("Failed to read confirmation");

                controller.submit(Command::SetPoints {
                    voltage_raw: scaling::millivolts_to_raw((volts * 1000.0) as u32),
                    current_raw: scaling::milliamps_to_raw((amps * 1000.0) as u32),
                    disable_before: cycle,
                    enable_after: cycle,
                });
            }
            "toggle output" => {
                controller.submit(Command::ToggleOutput);
            }
            _ => break,
        }
    }

    controller.shutdown();
}
