//! Next-in-chain resolution of the intercepted libc symbols.
//!
//! `dlsym(RTLD_NEXT, …)` returns the definition that follows this library
//! in the dynamic linker's search order, i.e. the libc implementation that
//! the preloaded hooks shadow. Each symbol is resolved at most once and
//! the address cached for the lifetime of the process; a slot that
//! resolves to NULL stays NULL, and the hooks surface that as a missing
//! libc symbol instead of calling through it.

use std::ffi::CStr;
use std::mem;

use libc::{c_char, c_int, c_void};
use once_cell::sync::OnceCell;

pub(crate) type ExecveFn =
    unsafe extern "C" fn(*const c_char, *const *const c_char, *const *const c_char) -> c_int;
pub(crate) type ExecvFn = unsafe extern "C" fn(*const c_char, *const *const c_char) -> c_int;
pub(crate) type SystemFn = unsafe extern "C" fn(*const c_char) -> c_int;
pub(crate) type ChdirFn = unsafe extern "C" fn(*const c_char) -> c_int;

fn next(symbol: &CStr) -> *mut c_void {
    unsafe { libc::dlsym(libc::RTLD_NEXT, symbol.as_ptr()) }
}

macro_rules! raw_symbol {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $symbol:literal) => {
        $(#[$meta])*
        pub(crate) fn $name() -> Option<$ty> {
            static SLOT: OnceCell<Option<$ty>> = OnceCell::new();
            *SLOT.get_or_init(|| {
                let ptr = next($symbol);
                if ptr.is_null() {
                    None
                } else {
                    // A non-null RTLD_NEXT result for these names is the
                    // libc definition with the matching signature.
                    Some(unsafe { mem::transmute::<*mut c_void, $ty>(ptr) })
                }
            })
        }
    };
}

raw_symbol!(
    /// The libc `execve`, also the exec used by the dispatcher's ssh
    /// child.
    raw_execve, ExecveFn, c"execve"
);
raw_symbol!(raw_execv, ExecvFn, c"execv");
raw_symbol!(raw_execvp, ExecvFn, c"execvp");
raw_symbol!(raw_system, SystemFn, c"system");
raw_symbol!(raw_chdir, ChdirFn, c"chdir");
