use colored::{Colorize, CustomColor};

pub const TSFM_TEAL: CustomColor = CustomColor {
    r: 0,
    g: 150,
    b: 136,
};

// Status lines go to stderr; stdout carries command output only.
fn print_status(label: colored::ColoredString, message: &str) {
    eprintln!("[{}] {}: {}", "tsfm".custom_color(TSFM_TEAL), label, message);
}

pub fn print_err(err_message: &str) {
    print_status("error".red().bold(), err_message);
}

#[macro_export]
macro_rules! print_err {
    ($($arg:tt)*) => {
        $crate::logging::print_err(&format!($($arg)*));
    };
}

pub fn print_warn(warn_message: &str) {
    print_status("warning".yellow().bold(), warn_message);
}

#[macro_export]
macro_rules! print_warn {
    ($($arg:tt)*) => {
        $crate::logging::print_warn(&format!($($arg)*));
    };
}

pub fn print_info(info_message: &str) {
    print_status("info".cyan().bold(), info_message);
}

#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        $crate::logging::print_info(&format!($($arg)*));
    };
}

pub fn print_success(success_message: &str) {
    print_status("success".green().bold(), success_message);
}

#[macro_export]
macro_rules! print_success {
    ($($arg:tt)*) => {
        $crate::logging::print_success(&format!($($arg)*));
    };
}

/// Routes the library's `log` records to stderr. `RUST_LOG` overrides the verbosity flag.
pub fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .try_init();
}
