pub const DEFAULT_INTERPRETER: &str = "mono";

pub const DEFAULT_READY_SETTLE_MS: u64 = 50;
pub const MIN_READY_SETTLE_MS: u64 = 1;
pub const MAX_READY_SETTLE_MS: u64 = 10_000;

pub const MAX_RESULT_TIMEOUT_MS: u64 = 3_600_000;

pub const DEFAULT_EXIT_GRACE_MS: u64 = 2_000;
pub const MAX_EXIT_GRACE_MS: u64 = 60_000;

pub(super) const RUNTIME_KEY_LEN: usize = 16;
pub(super) const MODS_DIR_NAME: &str = "Mods";
pub(super) const MANAGED_DIR_NAME: &str = "Managed";
