#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quickbooks_target::cli::run_with_sys_args().await
}
