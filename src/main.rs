use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match quiz_ingest_lib::run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
