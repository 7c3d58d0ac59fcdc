#[tokio::main]
async fn main() {
    if let Err(e) = chatline::run().await {
        eprintln!("chatline: {}", e);
        std::process::exit(1);
    }
}
