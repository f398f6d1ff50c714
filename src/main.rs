fn main() {
    exposure_eval::cli::run();
}
