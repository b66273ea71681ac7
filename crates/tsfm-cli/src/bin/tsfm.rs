use std::process::ExitCode;

fn main() -> ExitCode {
    tsfm_cli::cli::cli_main()
}
