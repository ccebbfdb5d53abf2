//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = waypost_cli::run() {
        eprintln!("waypost: {err}");
        std::process::exit(1);
    }
}
