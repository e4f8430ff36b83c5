//! The libc entry points exported by the shared object.
//!
//! Every exec hook follows the same shape: trace the call, ask the policy
//! whether it is in scope, then either fall through to the raw libc
//! symbol or reify the argument vector into a shell-safe command and hand
//! it to the remote dispatcher.
//!
//! On a successful remote run the exec-style hooks terminate the calling
//! process with `_exit(0)`: real exec does not return on success, so the
//! code following the call site in the host program assumes it never
//! runs. A non-zero remote status is returned to the caller instead, a
//! deliberate deviation that keeps the failure observable. `system` is
//! the exception on the success path too, since its contract is to
//! return the child status.
//!
//! The variadic `execl`/`execlp` symbols live in `native/varargs.c`,
//! which normalises their argument lists and forwards to
//! [`constellation_execl_argv`] and [`constellation_execlp_argv`] below.
//! `execle`, `execlpe` and `posix_spawn` are not intercepted.

use std::ffi::{CStr, OsStr, OsString};
use std::fs::DirBuilder;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::DirBuilderExt;
use std::path::Path;

use libc::{c_char, c_int};
use log::debug;

use crate::{escape, logger, policy, remote, symbols};

/// Sets the caller's `errno` and returns -1, the error convention shared
/// by all intercepted entry points.
fn fail(errno: c_int) -> c_int {
    set_errno(errno);
    -1
}

fn set_errno(errno: c_int) {
    unsafe { *errno_location() = errno };
}

#[cfg(target_os = "linux")]
unsafe fn errno_location() -> *mut c_int {
    libc::__errno_location()
}

#[cfg(not(target_os = "linux"))]
unsafe fn errno_location() -> *mut c_int {
    libc::__error()
}

/// Copies a NULL-terminated argument vector into owned strings.
///
/// # Safety
///
/// `argv` must be NULL or point to a NULL-terminated array of valid C
/// strings that stay alive for the duration of the call.
unsafe fn collect_argv(argv: *const *const c_char) -> Vec<OsString> {
    let mut args = Vec::new();
    if argv.is_null() {
        return args;
    }
    let mut i = 0;
    loop {
        let arg = *argv.add(i);
        if arg.is_null() {
            break;
        }
        args.push(OsStr::from_bytes(CStr::from_ptr(arg).to_bytes()).to_os_string());
        i += 1;
    }
    args
}

/// Quotes the reified argv, runs it remotely, and applies the exec
/// no-return contract: remote status 0 terminates the process.
fn dispatch_exec(args: &[OsString], cwd: &Path) -> c_int {
    let command = escape::quote_argv(args.iter().map(|arg| arg.as_os_str()));
    debug!("Intercepting command: {}", command.to_string_lossy());

    match remote::execute(&command, Some(cwd)) {
        Ok(0) => unsafe { libc::_exit(0) },
        Ok(status) => status,
        Err(err) => {
            debug!("Remote dispatch failed: {}", err);
            fail(err.errno())
        }
    }
}

/// Replacement for `execve(2)`.
///
/// # Safety
///
/// Same contract as the libc symbol: `filename` must be a valid C string
/// (or NULL, which falls through), and `argv`/`envp` NULL-terminated
/// arrays of valid C strings.
#[no_mangle]
pub unsafe extern "C" fn execve(
    filename: *const c_char,
    argv: *const *const c_char,
    envp: *const *const c_char,
) -> c_int {
    logger::init();
    let raw = symbols::raw_execve();
    if filename.is_null() {
        return match raw {
            Some(real) => real(filename, argv, envp),
            None => fail(libc::ENOSYS),
        };
    }

    let hint = OsStr::from_bytes(CStr::from_ptr(filename).to_bytes());
    debug!("execve called: filename={}", hint.to_string_lossy());

    let args = collect_argv(argv);
    match policy::should_intercept(hint, Some(&args)) {
        Some(cwd) => dispatch_exec(&args, &cwd),
        None => match raw {
            Some(real) => real(filename, argv, envp),
            None => fail(libc::ENOSYS),
        },
    }
}

/// Replacement for `execv(3)`.
///
/// # Safety
///
/// Same contract as the libc symbol.
#[no_mangle]
pub unsafe extern "C" fn execv(path: *const c_char, argv: *const *const c_char) -> c_int {
    logger::init();
    let raw = symbols::raw_execv();
    if path.is_null() {
        return match raw {
            Some(real) => real(path, argv),
            None => fail(libc::ENOSYS),
        };
    }

    let hint = OsStr::from_bytes(CStr::from_ptr(path).to_bytes());
    debug!("execv called: path={}", hint.to_string_lossy());

    let args = collect_argv(argv);
    match policy::should_intercept(hint, Some(&args)) {
        Some(cwd) => dispatch_exec(&args, &cwd),
        None => match raw {
            Some(real) => real(path, argv),
            None => fail(libc::ENOSYS),
        },
    }
}

/// Replacement for `execvp(3)`.
///
/// # Safety
///
/// Same contract as the libc symbol.
#[no_mangle]
pub unsafe extern "C" fn execvp(file: *const c_char, argv: *const *const c_char) -> c_int {
    logger::init();
    let raw = symbols::raw_execvp();
    if file.is_null() {
        return match raw {
            Some(real) => real(file, argv),
            None => fail(libc::ENOSYS),
        };
    }

    let hint = OsStr::from_bytes(CStr::from_ptr(file).to_bytes());
    debug!("execvp called: file={}", hint.to_string_lossy());

    let args = collect_argv(argv);
    match policy::should_intercept(hint, Some(&args)) {
        Some(cwd) => dispatch_exec(&args, &cwd),
        None => match raw {
            Some(real) => real(file, argv),
            None => fail(libc::ENOSYS),
        },
    }
}

/// Vector-form body of the `execl` hook; the C stub normalises the
/// variadic list and forwards it here. A fall-through executes the
/// normalised vector through the raw `execv`, which is equivalent.
///
/// # Safety
///
/// `path` must be a valid C string or NULL; `argv` a NULL-terminated
/// array of valid C strings.
#[no_mangle]
pub unsafe extern "C" fn constellation_execl_argv(
    path: *const c_char,
    argv: *const *const c_char,
) -> c_int {
    logger::init();
    let raw = symbols::raw_execv();
    if path.is_null() {
        return match raw {
            Some(real) => real(path, argv),
            None => fail(libc::ENOSYS),
        };
    }

    let hint = OsStr::from_bytes(CStr::from_ptr(path).to_bytes());
    debug!("execl called: path={}", hint.to_string_lossy());

    let args = collect_argv(argv);
    match policy::should_intercept(hint, Some(&args)) {
        Some(cwd) => dispatch_exec(&args, &cwd),
        None => match raw {
            Some(real) => real(path, argv),
            None => fail(libc::ENOSYS),
        },
    }
}

/// Vector-form body of the `execlp` hook; the fall-through goes through
/// the raw `execvp` so PATH search still applies.
///
/// # Safety
///
/// `file` must be a valid C string or NULL; `argv` a NULL-terminated
/// array of valid C strings.
#[no_mangle]
pub unsafe extern "C" fn constellation_execlp_argv(
    file: *const c_char,
    argv: *const *const c_char,
) -> c_int {
    logger::init();
    let raw = symbols::raw_execvp();
    if file.is_null() {
        return match raw {
            Some(real) => real(file, argv),
            None => fail(libc::ENOSYS),
        };
    }

    let hint = OsStr::from_bytes(CStr::from_ptr(file).to_bytes());
    debug!("execlp called: file={}", hint.to_string_lossy());

    let args = collect_argv(argv);
    match policy::should_intercept(hint, Some(&args)) {
        Some(cwd) => dispatch_exec(&args, &cwd),
        None => match raw {
            Some(real) => real(file, argv),
            None => fail(libc::ENOSYS),
        },
    }
}

/// Replacement for `system(3)`.
///
/// The command string is forwarded to the remote shell as written, and
/// the hook returns the child status, matching the `system` contract.
/// `system(NULL)` reports 0 without dispatching.
///
/// # Safety
///
/// `command` must be a valid C string or NULL.
#[no_mangle]
pub unsafe extern "C" fn system(command: *const c_char) -> c_int {
    logger::init();
    if command.is_null() {
        debug!("system called: command=NULL");
        return 0;
    }

    let hint = OsStr::from_bytes(CStr::from_ptr(command).to_bytes());
    debug!("system called: command={}", hint.to_string_lossy());

    match policy::should_intercept(hint, None) {
        Some(cwd) => {
            debug!("Intercepting system command: {}", hint.to_string_lossy());
            match remote::execute(hint, Some(&cwd)) {
                Ok(status) => status,
                Err(err) => {
                    debug!("Remote dispatch failed: {}", err);
                    fail(err.errno())
                }
            }
        }
        None => match symbols::raw_system() {
            Some(real) => real(command),
            None => fail(libc::ENOSYS),
        },
    }
}

/// Replacement for `chdir(2)` that materialises missing directories.
///
/// The raw `chdir` runs first; on failure the target tree is created with
/// mode `0755` and the raw `chdir` retried once. If creation fails, the
/// original `chdir` errno is preserved. This is a local fix-up so hosts
/// can enter workspace directories that semantically live on the remote
/// side before anything has materialised them here.
///
/// # Safety
///
/// `path` must be a valid C string or NULL.
#[no_mangle]
pub unsafe extern "C" fn chdir(path: *const c_char) -> c_int {
    logger::init();
    if path.is_null() {
        return fail(libc::EFAULT);
    }
    let raw = match symbols::raw_chdir() {
        Some(real) => real,
        None => return fail(libc::ENOSYS),
    };

    let target = OsStr::from_bytes(CStr::from_ptr(path).to_bytes());
    debug!("chdir called: path={}", target.to_string_lossy());

    if raw(path) == 0 {
        return 0;
    }
    let original = io::Error::last_os_error();

    debug!(
        "chdir failed, attempting to create directory: {}",
        target.to_string_lossy()
    );
    let mut builder = DirBuilder::new();
    builder.recursive(true).mode(0o755);
    match builder.create(Path::new(target)) {
        Ok(()) => {
            debug!("Directory created, retrying chdir");
            raw(path)
        }
        Err(err) => {
            debug!("Failed to create directory: {}", err);
            fail(original.raw_os_error().unwrap_or(libc::EIO))
        }
    }
}
