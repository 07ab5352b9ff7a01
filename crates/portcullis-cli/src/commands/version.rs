//! Version command.

use crate::style::colors::SemanticStyle;

pub fn run() {
    println!(
        "{} {}",
        "portcullis".header(),
        env!("CARGO_PKG_VERSION")
    );
}
