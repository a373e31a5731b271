fn main() {
    if let Err(e) = clonescope_cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
