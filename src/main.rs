fn main() {
    if let Err(err) = tabular_profiler::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
