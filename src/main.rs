fn main() {
    if let Err(err) = campaign_lens::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
