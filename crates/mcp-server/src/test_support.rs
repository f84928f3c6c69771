use std::sync::Mutex;

/// Serialises tests that touch `CODECLAW_*` environment variables.
///
/// Tests run in parallel but the environment is process-wide.
pub(crate) static ENV_MUTEX: Mutex<()> = Mutex::new(());
