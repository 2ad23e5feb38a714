// src/main.rs
#[tokio::main]
async fn main() {
    pollhub::start_server().await;
}
