mod analysis_backend;
mod app;
mod config;
mod entity;
mod handler;
mod persistence;
mod repository;
mod service;
mod storage;
#[cfg(test)]
mod test_support;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(app::run())
}
