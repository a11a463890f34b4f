/// Shared command-execution and file helpers
pub mod command;
pub mod files;
#[cfg(test)]
pub mod testing;
