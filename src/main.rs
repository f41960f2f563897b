use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use kartvid::api::{self, Cli};
use log::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    kartvid::init_logging(cli.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = api::execute(&cli, &mut out);
    let _ = out.flush();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
