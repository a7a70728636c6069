//! Presence probes for helper programs.

/// Answers whether a program can be found on this system.
///
/// Results are never cached: a helper may be installed between two probes
/// (the AUR helper bootstrap does exactly that).
pub trait ToolPresence {
    fn present(&self, program: &str) -> bool;
}

/// Looks programs up on `PATH` with the `which` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhichTools;

impl ToolPresence for WhichTools {
    fn present(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
