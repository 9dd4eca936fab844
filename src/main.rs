#[tokio::main]
async fn main() -> std::io::Result<()> {
    fleet_gateway::run_with_config().await
}
