mod commands;
mod output;
mod sources;
mod summary;
mod terminal;

use std::process;

use commands::{CommandLine, RUN_DEADLINE, generate, probe, run_with_deadline};
use terminal::{logging, print};
use tracing::error;

const DEADLINE_EXIT_CODE: i32 = 124;

#[tokio::main]
async fn main() {
    let commands = CommandLine::parse_args();

    logging::init_logging();
    print::banner();

    let settings = match commands.into_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e:#}");
            process::exit(2);
        }
    };

    let run = async {
        if settings.no_test {
            generate::generate(&settings).await
        } else {
            probe::probe(&settings).await
        }
    };

    match run_with_deadline(RUN_DEADLINE, run).await {
        Ok(Ok(())) => print::end_of_program(),
        Ok(Err(e)) => {
            error!("{e:#}");
            process::exit(1);
        }
        Err(_) => {
            error!("Run exceeded {} minutes, stopping", RUN_DEADLINE.as_secs() / 60);
            process::exit(DEADLINE_EXIT_CODE);
        }
    }
}
