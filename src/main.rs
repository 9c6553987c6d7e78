use clap::Parser;
use notedup::cli::{handle_duplicate, Cli, USAGE};
use notedup::NotedupError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = handle_duplicate(cli) {
        println!("Error: {}", e);
        if matches!(e, NotedupError::MissingArgument) {
            println!("{}", USAGE);
        }
        std::process::exit(1);
    }
}
