use clap::Parser;
use mbusb_cli::{Cli, commands, logging};
use mbusb_core::UsbError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match commands::handle_create(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("❌ {err:#}");
            // a failed tool passes its own exit status through
            err.downcast_ref::<UsbError>()
                .map_or(ExitCode::FAILURE, UsbError::exit_code)
        }
    }
}
