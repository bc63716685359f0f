fn main() {
    std::process::exit(scribe_cli::run_with_args(std::env::args_os()));
}
