//! Hook-level behavior that can be observed without a reachable remote
//! host: the environment gate, the errno surface, and the status
//! pass-through.

use std::ffi::CString;
use std::io;
use std::ptr;
use std::sync::{Mutex, MutexGuard, OnceLock};

use constellation_intercept::hooks;

const APP_ID: &str = "CONSTELLATIONFS_APP_ID";
const HOST: &str = "REMOTE_VM_HOST";
const PORT: &str = "REMOTE_VM_PORT";
const PASSWORD: &str = "REMOTE_VM_PASSWORD";

fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn clear_env() {
    for var in [APP_ID, HOST, PORT, PASSWORD] {
        std::env::remove_var(var);
    }
}

#[test]
fn system_null_reports_zero() {
    let _guard = env_lock();
    clear_env();

    assert_eq!(unsafe { hooks::system(ptr::null()) }, 0);
}

#[test]
fn system_falls_through_without_the_gate() {
    let _guard = env_lock();
    clear_env();

    let command = CString::new("exit 7").unwrap();
    let status = unsafe { hooks::system(command.as_ptr()) };

    // the raw libc system reports a full wait status
    assert!(libc::WIFEXITED(status));
    assert_eq!(libc::WEXITSTATUS(status), 7);
}

#[test]
fn missing_port_surfaces_einval() {
    let _guard = env_lock();
    clear_env();
    std::env::set_var(APP_ID, "app1");
    std::env::set_var(HOST, "user@host");

    let file = CString::new("ls").unwrap();
    let arg0 = CString::new("ls").unwrap();
    let argv = [arg0.as_ptr(), ptr::null()];

    let result = unsafe { hooks::execvp(file.as_ptr(), argv.as_ptr()) };
    let errno = io::Error::last_os_error();
    clear_env();

    assert_eq!(result, -1);
    assert_eq!(errno.raw_os_error(), Some(libc::EINVAL));
}

#[test]
fn missing_port_surfaces_einval_for_system() {
    let _guard = env_lock();
    clear_env();
    std::env::set_var(APP_ID, "app1");
    std::env::set_var(HOST, "user@host");

    let command = CString::new("echo hello").unwrap();
    let result = unsafe { hooks::system(command.as_ptr()) };
    let errno = io::Error::last_os_error();
    clear_env();

    assert_eq!(result, -1);
    assert_eq!(errno.raw_os_error(), Some(libc::EINVAL));
}

// An unreachable target makes the ssh child fail; the hook must return
// the non-zero status instead of terminating the process.
#[test]
fn failed_dispatch_returns_instead_of_exiting() {
    let _guard = env_lock();
    clear_env();
    std::env::set_var(APP_ID, "app1");
    // port 1 refuses immediately; if ssh itself is absent the child
    // reports 127
    std::env::set_var(HOST, "nobody@127.0.0.1");
    std::env::set_var(PORT, "1");

    let command = CString::new("true").unwrap();
    let status = unsafe { hooks::system(command.as_ptr()) };
    clear_env();

    assert_ne!(status, 0);
    assert_ne!(status, -1);
}
