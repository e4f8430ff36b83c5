//! The chdir replacement: failing directory changes succeed after the
//! target tree is created locally.

use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

use constellation_intercept::hooks;

// The working directory is process-wide state; these tests serialise on
// it.
fn cwd_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn chdir(path: &Path) -> (i32, io::Error) {
    let path = CString::new(path.as_os_str().as_bytes()).unwrap();
    let result = unsafe { hooks::chdir(path.as_ptr()) };
    (result, io::Error::last_os_error())
}

#[test]
fn existing_directory_passes_through() {
    let _guard = cwd_lock();
    let tmp = tempfile::tempdir().unwrap();

    let (result, _) = chdir(tmp.path());
    assert_eq!(result, 0);
    assert_eq!(
        std::env::current_dir().unwrap(),
        tmp.path().canonicalize().unwrap()
    );

    std::env::set_current_dir("/").unwrap();
}

#[test]
fn creates_the_missing_tree() {
    let _guard = cwd_lock();
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path().join("new/a/b/c");

    let old_umask = unsafe { libc::umask(0o022) };
    let (result, _) = chdir(&target);
    unsafe { libc::umask(old_umask) };

    assert_eq!(result, 0);
    assert_eq!(
        std::env::current_dir().unwrap(),
        target.canonicalize().unwrap()
    );

    // every created level carries mode 0755
    for dir in [
        tmp.path().join("new"),
        tmp.path().join("new/a"),
        tmp.path().join("new/a/b"),
        target.clone(),
    ] {
        let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755, "wrong mode on {}", dir.display());
    }

    std::env::set_current_dir("/").unwrap();
}

#[test]
fn impossible_creation_keeps_the_original_errno() {
    let _guard = cwd_lock();
    let tmp = tempfile::tempdir().unwrap();

    // a plain file in the middle of the path makes creation impossible
    let file = tmp.path().join("plain");
    std::fs::write(&file, b"x").unwrap();

    let (result, errno) = chdir(&file.join("sub"));
    assert_eq!(result, -1);
    assert_eq!(errno.raw_os_error(), Some(libc::ENOTDIR));
}

#[test]
fn null_path_is_a_fault() {
    let _guard = cwd_lock();
    let result = unsafe { hooks::chdir(std::ptr::null()) };
    let errno = io::Error::last_os_error();
    assert_eq!(result, -1);
    assert_eq!(errno.raw_os_error(), Some(libc::EFAULT));
}
