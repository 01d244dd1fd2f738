use blocksig_core::logging;

mod cli;

fn main() {
    // Logs go to stderr; a failed init only means running without them.
    if let Err(err) = logging::init_logging() {
        eprintln!("blocksig: {:#}", err);
    }

    if let Err(err) = cli::run_from_args() {
        eprintln!("blocksig error: {:#}", err);
        std::process::exit(1);
    }
}
