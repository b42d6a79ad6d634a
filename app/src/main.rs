#[tokio::main]
async fn main() -> anyhow::Result<()> {
    amm_router::run().await
}
