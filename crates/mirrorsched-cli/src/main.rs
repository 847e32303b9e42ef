use mirrorsched_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let destination = logging::init();
    tracing::debug!(%destination, "mirrorsched starting");

    match Cli::run_from_args().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("mirrorsched error: {:#}", err);
            std::process::exit(1);
        }
    }
}
