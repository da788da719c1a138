pub mod context;
pub mod lifecycle;

pub use context::AppContext;
pub use lifecycle::{run_standalone, serve};

pub async fn run(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    run_standalone(config_path).await
}
