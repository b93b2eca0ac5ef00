#[tokio::main]
async fn main() {
    if let Err(e) = med_pomichnyk::run().await {
        eprintln!("{} failed to start: {e}", med_pomichnyk::config::APP_NAME);
        std::process::exit(1);
    }
}
