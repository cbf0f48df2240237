use crate::cli::ColorMode;
use nu_ansi_term::Color;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_EXIT_CODE: i32 = 1;

static USE_COLOR: AtomicBool = AtomicBool::new(true);

pub(crate) fn configure_color(cmode: ColorMode) {
    USE_COLOR.store(matches!(cmode, ColorMode::On), Ordering::Relaxed);
}

fn use_color() -> ColorMode {
    match USE_COLOR.load(Ordering::Relaxed) {
        true => ColorMode::On,
        false => ColorMode::Off,
    }
}

/// An error followed by each of its sources, `outer: inner: ...`.
pub(crate) fn error_chain(err: &dyn Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();

    while let Some(err) = source {
        let text = err.to_string();

        // reqwest repeats its inner error in its own message
        if !chain.contains(&text) {
            chain.push_str(": ");
            chain.push_str(&text);
        }

        source = err.source();
    }

    chain
}

fn report(label: &str, label_color: Color, text: &str) {
    match use_color() {
        ColorMode::On => {
            let style = label_color.bold();
            let text_style = Color::Default.bold();

            eprintln!("{} {}", style.paint(label), text_style.paint(text));
        }
        ColorMode::Off => {
            eprintln!("{} {}", label, text);
        }
    }
}

pub(crate) fn error_internal(text: &str) {
    report("error:", Color::Red, text);
}

pub(crate) fn warn_internal(text: &str) {
    report("warning:", Color::Yellow, text);
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::warn_internal(&formatted);
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
    })
}

#[macro_export]
macro_rules! die {
    ($($arg:tt)*) => ({
        let formatted = format!($($arg)*);
        $crate::utils::errors::error_internal(&formatted);
        ::std::process::exit($crate::utils::errors::DEFAULT_EXIT_CODE);
    })
}
