//! zotfiles binary entry point.

fn main() {
    if let Err(err) = zotfiles::cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(zotfiles::error::exit_code(&err));
    }
}
