// src/main.rs

use pipedag::store::RunStatus;
use pipedag::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("pipedag error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(RunStatus::Succeeded) => {}
        Ok(RunStatus::Failed) => std::process::exit(1),
        Err(err) => {
            eprintln!("pipedag error: {err:?}");
            std::process::exit(2);
        }
    }
}
