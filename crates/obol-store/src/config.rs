//! Store construction options.

/// Options consumed when opening a store. Passed explicitly so store
/// behavior (including fault injection) stays deterministic and
/// testable rather than read from ambient process state.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Backing-engine cache budget in bytes.
    pub cache_size: usize,
    /// Keep the store entirely in memory (tests, throwaway chains).
    pub memory: bool,
    /// Delete all rows on open.
    pub wipe: bool,
    /// Crash-simulation ratio for coin batch writes: once per interval
    /// of consumed entries, terminate the process with probability
    /// 1/ratio. Zero disables.
    pub crash_simulate: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cache_size: 8 << 20,
            memory: false,
            wipe: false,
            crash_simulate: 0,
        }
    }
}

impl StoreOptions {
    pub fn in_memory() -> Self {
        Self {
            memory: true,
            ..Self::default()
        }
    }
}
