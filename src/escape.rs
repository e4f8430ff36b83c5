//! Quote an argument vector into a single shell-safe command string.
//!
//! Unlike the minimising escape of the [`shell-escape`] crate, every
//! argument is wrapped in single quotes unconditionally, with embedded
//! single quotes rewritten to the sequence `'"'"'`. The remote login shell
//! undoes exactly one level of quoting, reproducing the original argument
//! vector verbatim with no globbing, variable expansion, or word
//! splitting.
//!
//! [`shell-escape`]: https://crates.io/crates/shell-escape

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

/// Wraps a single argument in single quotes.
pub(crate) fn quote(arg: &OsStr) -> OsString {
    let bytes = arg.as_bytes();

    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'\'');
    for &b in bytes {
        if b == b'\'' {
            quoted.extend_from_slice(b"'\"'\"'");
        } else {
            quoted.push(b);
        }
    }
    quoted.push(b'\'');

    OsString::from_vec(quoted)
}

/// Quotes every argument and joins them with single spaces.
pub(crate) fn quote_argv<'a, I>(args: I) -> OsString
where
    I: IntoIterator<Item = &'a OsStr>,
{
    let mut command = OsString::new();
    for (i, arg) in args.into_iter().enumerate() {
        if i > 0 {
            command.push(" ");
        }
        command.push(quote(arg));
    }
    command
}
