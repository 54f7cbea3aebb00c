use std::process;

fn main() {
    if let Err(err) = webapp_launcher::cli::run() {
        eprintln!("webapp-launcher: {err:?}");
        process::exit(1);
    }
}
