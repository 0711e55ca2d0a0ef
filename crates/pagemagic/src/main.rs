/// CLI module - command-line interface for pagemagic
mod cli;

fn main() {
    cli::run_cli();
}
