use std::ffi::NulError;
use std::fmt;
use std::io;

use libc::c_int;

/// Errors that occur while rerouting a process launch to the remote host.
///
/// Hooks never propagate these as Rust errors; each intercepted entry
/// point reports them the way libc does, by returning `-1` with `errno`
/// set to the value of [`errno`](Error::errno).
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// `REMOTE_VM_HOST` is unset or empty.
    MissingHost,

    /// Neither `REMOTE_VM_HOST` nor `REMOTE_VM_PORT` carries a port.
    MissingPort,

    /// A reified string contained an interior NUL byte and cannot cross
    /// the exec boundary.
    Nul(NulError),

    /// fork(2) failed while spawning the ssh child.
    Fork(io::Error),

    /// waitpid(2) failed while collecting the ssh child.
    Wait(io::Error),
}

impl Error {
    /// The `errno` value reported to the caller of the intercepted libc
    /// entry point.
    pub fn errno(&self) -> c_int {
        match self {
            Error::MissingHost | Error::MissingPort | Error::Nul(_) => libc::EINVAL,
            Error::Fork(e) | Error::Wait(e) => e.raw_os_error().unwrap_or(libc::EIO),
        }
    }
}

impl From<NulError> for Error {
    fn from(err: NulError) -> Self {
        Error::Nul(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingHost => write!(f, "REMOTE_VM_HOST is not set"),
            Error::MissingPort => {
                write!(f, "no port in REMOTE_VM_HOST and REMOTE_VM_PORT is not set")
            }
            Error::Nul(_) => write!(f, "argument contains an interior NUL byte"),
            Error::Fork(_) => write!(f, "failed to fork the ssh child"),
            Error::Wait(_) => write!(f, "failed to wait for the ssh child"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Fork(ref e) | Error::Wait(ref e) => Some(e),
            Error::Nul(ref e) => Some(e),
            Error::MissingHost | Error::MissingPort => None,
        }
    }
}

#[test]
fn errno_mapping() {
    let ioe = || io::Error::from_raw_os_error(libc::EAGAIN);

    assert_eq!(Error::MissingHost.errno(), libc::EINVAL);
    assert_eq!(Error::MissingPort.errno(), libc::EINVAL);
    assert_eq!(Error::Fork(ioe()).errno(), libc::EAGAIN);
    assert_eq!(Error::Wait(ioe()).errno(), libc::EAGAIN);

    let nul = std::ffi::CString::new("a\0b").unwrap_err();
    assert_eq!(Error::Nul(nul).errno(), libc::EINVAL);
}

#[test]
fn error_sanity() {
    use std::error::Error as _;

    let ioe = || io::Error::from_raw_os_error(libc::ECHILD);
    let expect = ioe();

    let e = Error::Wait(ioe());
    assert!(!format!("{}", e).is_empty());
    let e = e
        .source()
        .expect("source failed")
        .downcast_ref::<io::Error>()
        .expect("source not io");
    assert_eq!(e.kind(), expect.kind());
    assert_eq!(format!("{}", e), format!("{}", expect));

    let e = Error::MissingPort;
    assert!(!format!("{}", e).is_empty());
    assert!(e.source().is_none());
}
