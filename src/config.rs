//! The controlling environment variables.
//!
//! The environment is a read-only view consulted fresh on every
//! intercepted call; nothing here is cached, so the surrounding
//! infrastructure can flip interception on and off at runtime.

use std::env;

use crate::error::Error;

/// Master gate; no interception happens while this is unset.
pub(crate) const APP_ID: &str = "CONSTELLATIONFS_APP_ID";

/// Remote target in `user@host` form, optionally suffixed with `:port`.
pub(crate) const HOST: &str = "REMOTE_VM_HOST";

/// Explicit port override; wins over a port embedded in [`HOST`].
pub(crate) const PORT: &str = "REMOTE_VM_PORT";

/// When set, ssh is fronted by `sshpass -p <password>`; when unset, ssh
/// relies on key-based authentication.
pub(crate) const PASSWORD: &str = "REMOTE_VM_PASSWORD";

/// Any value activates the debug trace.
pub(crate) const DEBUG: &str = "CONSTELLATION_DEBUG";

/// The resolved target of one remote dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteHost {
    /// `user@host`, with any `:port` suffix stripped.
    pub(crate) destination: String,
    pub(crate) port: String,
    pub(crate) password: Option<String>,
}

impl RemoteHost {
    /// Reads the remote target from the environment.
    ///
    /// Everything after the last `:` of [`HOST`] is a candidate port, but
    /// [`PORT`] wins when both are present. A target without any port is
    /// an error, not a default.
    pub(crate) fn from_env() -> Result<Self, Error> {
        let raw = env::var(HOST).map_err(|_| Error::MissingHost)?;
        if raw.is_empty() {
            return Err(Error::MissingHost);
        }

        let (destination, embedded) = split_destination(&raw);

        let port = match env::var(PORT) {
            Ok(port) if !port.is_empty() => port,
            _ => embedded.map(str::to_owned).ok_or(Error::MissingPort)?,
        };

        Ok(RemoteHost {
            destination: destination.to_owned(),
            port,
            password: env::var(PASSWORD).ok(),
        })
    }
}

/// Splits `user@host[:port]` on the last `:`. An empty port counts as
/// absent.
fn split_destination(raw: &str) -> (&str, Option<&str>) {
    match raw.rfind(':') {
        Some(colon) if colon + 1 < raw.len() => (&raw[..colon], Some(&raw[colon + 1..])),
        Some(colon) => (&raw[..colon], None),
        None => (raw, None),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn split() {
        assert_eq!(split_destination("u@h:2222"), ("u@h", Some("2222")));
        assert_eq!(split_destination("u@h"), ("u@h", None));
        assert_eq!(split_destination("u@h:"), ("u@h", None));
        assert_eq!(split_destination("h:22"), ("h", Some("22")));
        // only the last colon separates the port
        assert_eq!(split_destination("u@[::1]:22"), ("u@[::1]", Some("22")));
    }

    #[test]
    fn from_env_resolves_port() {
        let _guard = test_env::lock();
        test_env::clear();

        env::set_var(HOST, "u@h:2222");
        let remote = RemoteHost::from_env().unwrap();
        assert_eq!(remote.destination, "u@h");
        assert_eq!(remote.port, "2222");
        assert_eq!(remote.password, None);

        env::set_var(PORT, "9022");
        let remote = RemoteHost::from_env().unwrap();
        assert_eq!(remote.destination, "u@h");
        assert_eq!(remote.port, "9022");

        env::set_var(PASSWORD, "secret");
        let remote = RemoteHost::from_env().unwrap();
        assert_eq!(remote.password.as_deref(), Some("secret"));

        test_env::clear();
    }

    #[test]
    fn from_env_requires_a_port() {
        let _guard = test_env::lock();
        test_env::clear();

        env::set_var(HOST, "u@h");
        assert!(matches!(
            RemoteHost::from_env(),
            Err(crate::Error::MissingPort)
        ));

        // a trailing colon is not a port
        env::set_var(HOST, "u@h:");
        assert!(matches!(
            RemoteHost::from_env(),
            Err(crate::Error::MissingPort)
        ));

        // neither is an empty override
        env::set_var(HOST, "u@h");
        env::set_var(PORT, "");
        assert!(matches!(
            RemoteHost::from_env(),
            Err(crate::Error::MissingPort)
        ));

        test_env::clear();
    }

    #[test]
    fn from_env_requires_a_host() {
        let _guard = test_env::lock();
        test_env::clear();

        assert!(matches!(
            RemoteHost::from_env(),
            Err(crate::Error::MissingHost)
        ));

        env::set_var(HOST, "");
        assert!(matches!(
            RemoteHost::from_env(),
            Err(crate::Error::MissingHost)
        ));

        test_env::clear();
    }
}
