//! The per-call decision of whether a spawn call is rerouted.

use std::env;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use log::debug;

use crate::config;

/// Shell basenames whose argument vectors are scanned for ssh
/// invocations.
const SHELLS: &[&[u8]] = &[b"sh", b"bash", b"zsh", b"dash"];

/// Decides whether the call described by `hint` (the filename, path, or
/// command string of the intercepted entry point) is in scope.
///
/// Returns the working directory captured at the time of the call when
/// the call is to be rerouted, and `None` when it must fall through to
/// the raw libc symbol. Once the environment gate is passed, every
/// non-ssh call is rerouted; there is deliberately no check that the
/// working directory lies inside any particular workspace.
pub(crate) fn should_intercept(hint: &OsStr, argv: Option<&[OsString]>) -> Option<PathBuf> {
    if env::var_os(config::APP_ID).is_none() {
        debug!("{} not set, not intercepting", config::APP_ID);
        return None;
    }

    if is_ssh_invocation(hint, argv) {
        debug!("SSH command detected, not intercepting");
        return None;
    }

    match env::current_dir() {
        Ok(cwd) => {
            debug!("Current working directory: {}", cwd.display());
            Some(cwd)
        }
        Err(err) => {
            debug!("Could not get working directory ({}), not intercepting", err);
            None
        }
    }
}

/// The reentrancy filter: the dispatcher itself launches ssh, and a
/// traced program may do the same through a shell. Neither may be
/// rerouted, or the reroute would loop.
fn is_ssh_invocation(hint: &OsStr, argv: Option<&[OsString]>) -> bool {
    if names_ssh(hint) {
        return true;
    }
    if is_shell(hint) {
        if let Some(args) = argv {
            return args.iter().any(|arg| mentions_ssh(arg.as_os_str()));
        }
    }
    false
}

/// The hint is the ssh binary itself: basename `ssh`, or any path
/// containing `/ssh`.
fn names_ssh(hint: &OsStr) -> bool {
    let bytes = hint.as_bytes();
    basename(bytes) == b"ssh" || contains(bytes, b"/ssh")
}

fn is_shell(hint: &OsStr) -> bool {
    SHELLS.contains(&basename(hint.as_bytes()))
}

/// One argument carries an ssh invocation: the word `ssh` alone, or `ssh`
/// opening a word.
fn mentions_ssh(arg: &OsStr) -> bool {
    let bytes = arg.as_bytes();
    bytes == b"ssh"
        || contains(bytes, b"ssh ")
        || contains(bytes, b"ssh\t")
        || contains(bytes, b"ssh\n")
}

fn basename(path: &[u8]) -> &[u8] {
    match path.iter().rposition(|&b| b == b'/') {
        Some(slash) => &path[slash + 1..],
        None => path,
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
