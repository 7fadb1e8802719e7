fn main() {
    if let Err(err) = overtime_desk_lib::run() {
        eprintln!("overtime-desk: {err:#}");
        std::process::exit(1);
    }
}
