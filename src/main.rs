// src/main.rs

use agentexec::{cli, exit_codes, logging, run};

#[tokio::main]
async fn main() {
    let args = match cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // `--help` / `--version` are not errors.
            let code = if err.use_stderr() {
                exit_codes::FAILURE
            } else {
                exit_codes::OK
            };
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("agentexec error: {err:?}");
        std::process::exit(exit_codes::FAILURE);
    }

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("agentexec error: {err:?}");
            std::process::exit(exit_codes::FAILURE);
        }
    }
}
