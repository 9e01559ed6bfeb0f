use std::path::Path;

use cogserve::{Config, FileServer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let server = FileServer::start(cfg)?;

    // Optional initial project root from the command line; otherwise the
    // embedding application sets it later.
    if let Some(root) = std::env::args().nth(1) {
        server.set_project_path(Some(Path::new(&root))).await;
    }

    println!("cogserve ready on port {}", server.port());

    tokio::signal::ctrl_c().await?;
    server.close();
    Ok(())
}
