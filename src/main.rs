fn main() {
    ember::run_cli();
}
