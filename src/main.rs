fn main() {
    tracerr::cli::start_cli();
}
