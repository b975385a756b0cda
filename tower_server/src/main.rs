#[tokio::main]
async fn main() -> std::io::Result<()> {
    tower_server::run_with_config().await
}
