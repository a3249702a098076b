fn main() {
    if let Err(err) = navlayer_svg::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
