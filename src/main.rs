fn main() {
    std::process::exit(module_universe::run());
}
