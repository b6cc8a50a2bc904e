//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = ridetrack_cli::run() {
        eprintln!("ridetrack: {err}");
        std::process::exit(1);
    }
}
