use serde::Serialize;

use crate::application::error::AppError;
use crate::application::toasts::{Toast, ToastKind};
use crate::presentation::views;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::unexpected(format!("failed to render output: {e}")))?;
    println!("{out}");
    Ok(())
}

/// Success toasts go to stdout, error toasts to stderr.
pub fn print_toasts(toasts: Vec<Toast>) {
    for toast in toasts {
        match toast.kind {
            ToastKind::Success => println!("{}", views::toast(&toast)),
            ToastKind::Error => eprintln!("{}", views::toast(&toast)),
        }
    }
}
