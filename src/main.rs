use std::process::ExitCode;

fn main() -> ExitCode {
    match resale_flat::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", resale_flat::report::format_failure(&err));
            ExitCode::from(err.exit_code())
        }
    }
}
