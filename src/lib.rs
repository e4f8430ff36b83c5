//! Transparent rerouting of process execution onto a remote VM over SSH
//! (**only works on unix**).
//!
//! This crate builds a shared object meant for the dynamic linker's
//! preload list (`LD_PRELOAD`). Once loaded into a host process it
//! replaces the libc process-spawn family — `execve`, `execv`, `execvp`,
//! `execl`, `execlp` and `system` — so that every command the host
//! believes it launches locally is instead executed on a pre-provisioned
//! remote VM, using nothing more than the standard `ssh` client on the
//! local side. An auxiliary `chdir` replacement lets hosts enter
//! workspace directories that only exist remotely by materialising them
//! locally on demand.
//!
//! # Activation
//!
//! Interception is driven entirely by environment variables, read fresh
//! on every call:
//!
//! - `CONSTELLATIONFS_APP_ID` — master gate; without it every hook falls
//!   through to libc untouched.
//! - `REMOTE_VM_HOST` — the target, as `user@host` optionally suffixed
//!   with `:port`.
//! - `REMOTE_VM_PORT` — explicit port, overriding one embedded in the
//!   host string. If neither carries a port the call fails with `EINVAL`;
//!   there is no default.
//! - `REMOTE_VM_PASSWORD` — switches ssh to an `sshpass -p` front-end;
//!   without it ssh runs in batch mode and relies on keys.
//! - `CONSTELLATION_DEBUG` — activates the debug trace on standard error
//!   and `/tmp/constellation-fs-debug.log`.
//!
//! # Exec semantics
//!
//! Real exec replaces the process image and never returns on success.
//! The hooks approximate this by calling `_exit(0)` when the remote
//! command succeeds, so code after the call site in the host never runs.
//! When the remote command fails, the hook returns the ssh child's exit
//! status instead of terminating — a deliberate deviation that lets the
//! caller observe the failure. Dispatcher errors surface as `-1` with
//! `errno` set, matching the libc contract of each entry point. `system`
//! returns the child status in every case, as its contract demands.
//!
//! # Avoiding recursion
//!
//! The dispatcher itself launches `ssh`, which must not be rerouted in
//! turn. Two defences are layered: the ssh child is spawned through the
//! raw next-in-chain `execve` resolved with `dlsym(RTLD_NEXT, …)`, and
//! the interception policy refuses to reroute calls that already name an
//! ssh binary or pass an ssh command line to a shell.
//!
//! # Scope
//!
//! Only the entry points listed above are intercepted. `execle`,
//! `execlpe`, `posix_spawn`, plain `fork`, and file or socket I/O pass
//! through untouched, and the hooks do not capture or reshape standard
//! streams beyond what ssh does natively. Every intercepted call spawns
//! a fresh ssh child; there is no connection reuse and no timeout.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rustdoc::broken_intra_doc_links,
    rust_2018_idioms
)]

#[cfg(not(unix))]
compile_error!("This crate can only be used on unix");

mod config;
mod escape;
mod logger;
mod policy;
mod remote;
mod symbols;

pub mod hooks;

mod error;
pub use error::Error;
