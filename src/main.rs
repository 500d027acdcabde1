mod cli;
mod demo;

fn main() {
    if let Err(err) = cli::run() {
        eprintln!("faculty-ranking: {err}");
        std::process::exit(err.exit_code());
    }
}
