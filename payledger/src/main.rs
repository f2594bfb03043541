use payledger::{cli, execute, ui};
use std::io;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let args = cli::parse_args();
    init_logging(&args);

    let mut console = ui::Console::new(io::stdout().lock(), ui::supports_colors());
    match execute(&args, &mut console) {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            // Status output is best effort once stdout itself may be the failure
            let _ = console.status("✗", &format!("{:#}", e), ui::StatusType::Error);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &cli::Args) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt().with_env_filter(filter).with_target(true).with_writer(io::stderr).init();
}
