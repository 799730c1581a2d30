fn main() {
    if let Err(err) = nexus_lib::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
