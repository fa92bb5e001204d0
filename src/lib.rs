pub mod config;
pub mod logging;
pub mod report;
pub mod sanitizer;

pub use config::*;
pub use logging::*;
pub use report::*;
pub use sanitizer::*;

pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    // No unit tests in lib.rs - all tests are in tests/ directory
}
