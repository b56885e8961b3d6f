//! Binary entry point for the Wayfarer game server.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    wayfarer::init().await
}
