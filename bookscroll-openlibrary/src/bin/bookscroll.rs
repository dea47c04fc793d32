use std::process::ExitCode;

use bookscroll_openlibrary::cli;

#[tokio::main]
async fn main() -> ExitCode {
    cli::init_tracing();
    match cli::run_from_env().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("bookscroll: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
