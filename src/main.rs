#[tokio::main]
async fn main() -> anyhow::Result<()> {
    habitcanvas::run().await
}
