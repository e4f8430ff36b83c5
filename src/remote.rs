//! The remote dispatcher: forks and runs the local ssh client with a
//! pre-quoted command, then surfaces the child's exit status.

use std::ffi::{CString, OsStr, OsString};
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use libc::{c_char, c_int};
use log::debug;

use crate::config::RemoteHost;
use crate::error::Error;
use crate::symbols;

const SSH_BINARY: &str = "/usr/bin/ssh";
const SSHPASS_BINARY: &str = "/usr/bin/sshpass";

extern "C" {
    /// The host process environment, inherited by the ssh child unchanged.
    #[link_name = "environ"]
    static ENVIRON: *const *const c_char;
}

/// Runs `command` on the configured remote host, prefixed with a `cd`
/// into `working_dir` when one is given.
///
/// Returns the ssh child's exit status: 0 propagates remote success, any
/// other value a remote (or ssh's own) failure. The call blocks until the
/// child exits; there is no timeout, signals aimed at the caller reach
/// the child through normal process semantics.
pub(crate) fn execute(command: &OsStr, working_dir: Option<&Path>) -> Result<c_int, Error> {
    let remote = RemoteHost::from_env()?;

    let full_command = prefix_working_dir(command, working_dir);
    debug!(
        "Executing via ssh on {}: {}",
        remote.destination,
        full_command.to_string_lossy()
    );

    let (binary, args) = ssh_argv(&remote, &full_command)?;
    let mut argv: Vec<*const c_char> = args.iter().map(|arg| arg.as_ptr()).collect();
    argv.push(ptr::null());

    // Resolved before forking; dlsym in the child of a threaded process
    // is not safe.
    let raw_execve = symbols::raw_execve();

    match unsafe { libc::fork() } {
        -1 => Err(Error::Fork(io::Error::last_os_error())),
        0 => {
            // Child. Only the raw symbol may be used here: the hooked
            // execve would reroute the ssh launch into another dispatch.
            if let Some(real) = raw_execve {
                unsafe { real(binary.as_ptr(), argv.as_ptr(), ENVIRON) };
            }
            // exec only returns on failure
            unsafe { libc::_exit(127) }
        }
        child => {
            let mut status: c_int = 0;
            if unsafe { libc::waitpid(child, &mut status, 0) } == -1 {
                return Err(Error::Wait(io::Error::last_os_error()));
            }
            if libc::WIFEXITED(status) {
                let code = libc::WEXITSTATUS(status);
                debug!("ssh child exited with status {}", code);
                Ok(code)
            } else {
                // Terminated by a signal; must never read as success.
                let signal = libc::WTERMSIG(status);
                debug!("ssh child terminated by signal {}", signal);
                Ok(128 + signal)
            }
        }
    }
}

/// `cd '<dir>' && <command>`, or the command unchanged.
///
/// The directory is quoted once; directories whose path contains a single
/// quote are a known limitation.
fn prefix_working_dir(command: &OsStr, working_dir: Option<&Path>) -> OsString {
    match working_dir {
        Some(dir) => {
            let mut full =
                OsString::with_capacity(dir.as_os_str().len() + command.len() + 9);
            full.push("cd '");
            full.push(dir);
            full.push("' && ");
            full.push(command);
            full
        }
        None => command.to_os_string(),
    }
}

/// The binary to exec and its argument vector, fronted by `sshpass` when a
/// password is configured.
fn ssh_argv(remote: &RemoteHost, command: &OsStr) -> Result<(CString, Vec<CString>), Error> {
    let mut args = Vec::with_capacity(12);

    let binary = if let Some(password) = &remote.password {
        args.push(CString::new("sshpass")?);
        args.push(CString::new("-p")?);
        args.push(CString::new(password.as_str())?);
        CString::new(SSHPASS_BINARY)?
    } else {
        CString::new(SSH_BINARY)?
    };

    args.push(CString::new("ssh")?);
    args.push(CString::new("-o")?);
    args.push(CString::new("StrictHostKeyChecking=no")?);
    if remote.password.is_none() {
        // Key-based auth must never fall back to an interactive prompt.
        args.push(CString::new("-o")?);
        args.push(CString::new("BatchMode=yes")?);
    }
    args.push(CString::new("-p")?);
    args.push(CString::new(remote.port.as_str())?);
    args.push(CString::new(remote.destination.as_str())?);
    args.push(CString::new(command.as_bytes())?);

    Ok((binary, args))
}
