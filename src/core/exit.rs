//! Exit hooks and process termination for fatal records

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type ExitHook = Box<dyn FnOnce() + Send>;
type Terminator = Arc<dyn Fn(i32) + Send + Sync>;

static EXIT_HOOKS: Lazy<Mutex<Vec<ExitHook>>> = Lazy::new(|| Mutex::new(Vec::new()));
static TERMINATOR: Lazy<RwLock<Option<Terminator>>> = Lazy::new(|| RwLock::new(None));

/// Exit code used by fatal records
pub const FATAL_EXIT_CODE: i32 = 1;

/// Register a callback to run before a fatal record terminates the process
///
/// Hooks run once, in registration order. A panicking hook is reported on
/// stderr and does not stop the others.
pub fn register_exit_hook<F>(hook: F)
where
    F: FnOnce() + Send + 'static,
{
    EXIT_HOOKS.lock().push(Box::new(hook));
}

/// Run and forget every registered exit hook
pub fn run_exit_hooks() {
    let hooks = std::mem::take(&mut *EXIT_HOOKS.lock());
    for hook in hooks {
        if panic::catch_unwind(AssertUnwindSafe(hook)).is_err() {
            eprintln!("[LOGGER WARNING] An exit hook panicked");
        }
    }
}

/// Replace `std::process::exit` as the action taken after a fatal record
///
/// The terminator receives the exit code. If it returns, emission returns
/// normally with a fatal outcome.
pub fn set_terminator<F>(terminator: F)
where
    F: Fn(i32) + Send + Sync + 'static,
{
    *TERMINATOR.write() = Some(Arc::new(terminator));
}

/// Restore `std::process::exit`
pub fn reset_terminator() {
    *TERMINATOR.write() = None;
}

pub(crate) fn terminate() {
    run_exit_hooks();

    let terminator = TERMINATOR.read().clone();
    match terminator {
        Some(terminator) => terminator(FATAL_EXIT_CODE),
        None => std::process::exit(FATAL_EXIT_CODE),
    }
}
