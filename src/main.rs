fn main() {
    if let Err(err) = helpdesk_dashboard::run() {
        eprintln!("{}", serde_json::json!({ "error": err }));
        std::process::exit(1);
    }
}
