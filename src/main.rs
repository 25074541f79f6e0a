// src/main.rs

use assetpipe::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("assetpipe error: {err:?}");
            std::process::exit(1);
        }
    }
}

/// Returns whether every pipeline that ran succeeded.
async fn run_main() -> anyhow::Result<bool> {
    // A missing `.env` is fine; real environment variables still apply.
    dotenvy::dotenv().ok();

    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let summary = run(args).await?;
    Ok(summary.all_succeeded())
}
