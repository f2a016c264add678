use libc::{self, c_int};
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

/// A facility name, as attached to a record's `Facility` attribute.
///
/// Available facilities depend on the target platform. All variants of this
/// `enum` are available on all platforms; those not native to the target
/// platform map to a reasonable fallback in [`Facility::to_raw`].
///
/// The default facility is [`User`](Facility::User).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Facility {
    /// Authentication, authorization, and other security-related matters.
    ///
    /// `security` is accepted on input as an alias for this facility; it is
    /// not a distinct value and is never produced by [`Facility::name`].
    Auth,

    /// Log messages containing sensitive information.
    ///
    /// On platforms without a native `authpriv` facility: becomes `Auth`.
    AuthPriv,

    /// Periodic task scheduling daemons like `cron`.
    ///
    /// On platforms without a native `cron` facility: becomes `Daemon`.
    Cron,

    /// Daemons that don't fall into a more specific category.
    Daemon,

    /// FTP server.
    ///
    /// On platforms without a native `ftp` facility: becomes `Daemon`.
    Ftp,

    /// macOS installer.
    ///
    /// On other platforms: becomes `User`.
    Install,

    /// Operating system kernel.
    ///
    /// Programs other than the kernel are typically not allowed to use this
    /// facility.
    Kern,

    /// `launchd`, the macOS process supervisor.
    ///
    /// On other platforms: becomes `Daemon`.
    Launchd,

    /// Reserved for local use.
    Local0,
    /// Reserved for local use.
    Local1,
    /// Reserved for local use.
    Local2,
    /// Reserved for local use.
    Local3,
    /// Reserved for local use.
    Local4,
    /// Reserved for local use.
    Local5,
    /// Reserved for local use.
    Local6,
    /// Reserved for local use.
    Local7,

    /// Print server.
    Lpr,

    /// Mail transport and delivery agents.
    Mail,

    /// NeXT/early macOS `NetInfo` system.
    ///
    /// On other platforms: becomes `Daemon`.
    NetInfo,

    /// Usenet news system.
    News,

    /// macOS remote authentication and authorization.
    ///
    /// On other platforms: becomes `Daemon`.
    RemoteAuth,

    /// Messages generated internally by the logging daemon itself.
    Syslog,

    /// General user processes.
    ///
    /// This is the default facility: the value returned by
    /// `Facility::default()`.
    User,

    /// Unix-to-Unix Copy system.
    Uucp,
}

impl Facility {
    /// All facility values except the `security` input alias, which maps to
    /// [`Auth`](Facility::Auth) rather than naming a distinct value.
    pub const ALL: [Facility; 24] = [
        Facility::Auth, Facility::AuthPriv, Facility::Cron, Facility::Daemon,
        Facility::Ftp, Facility::Install, Facility::Kern, Facility::Launchd,
        Facility::Local0, Facility::Local1, Facility::Local2, Facility::Local3,
        Facility::Local4, Facility::Local5, Facility::Local6, Facility::Local7,
        Facility::Lpr, Facility::Mail, Facility::NetInfo, Facility::News,
        Facility::RemoteAuth, Facility::Syslog, Facility::User, Facility::Uucp,
    ];

    /// Gets the name of this `Facility`, in lowercase.
    ///
    /// `FromStr` accepts the same names, case-insensitively, plus `security`
    /// as an alias for `auth`.
    pub fn name(&self) -> &'static str {
        match *self {
            Facility::Auth => "auth",
            Facility::AuthPriv => "authpriv",
            Facility::Cron => "cron",
            Facility::Daemon => "daemon",
            Facility::Ftp => "ftp",
            Facility::Install => "install",
            Facility::Kern => "kern",
            Facility::Launchd => "launchd",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
            Facility::Lpr => "lpr",
            Facility::Mail => "mail",
            Facility::NetInfo => "netinfo",
            Facility::News => "news",
            Facility::RemoteAuth => "remoteauth",
            Facility::Syslog => "syslog",
            Facility::User => "user",
            Facility::Uucp => "uucp",
        }
    }

    /// Converts to the matching `libc::LOG_*` constant, substituting a
    /// fallback facility on platforms lacking the native one.
    pub fn to_raw(self) -> c_int {
        match self {
            Facility::Auth => libc::LOG_AUTH,
            #[cfg(any(target_os = "linux", target_os = "android", target_os = "macos",
                      target_os = "ios", target_os = "freebsd", target_os = "dragonfly",
                      target_os = "openbsd", target_os = "netbsd"))]
            Facility::AuthPriv => libc::LOG_AUTHPRIV,
            #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos",
                      target_os = "ios", target_os = "freebsd", target_os = "dragonfly",
                      target_os = "openbsd", target_os = "netbsd")))]
            Facility::AuthPriv => libc::LOG_AUTH,
            #[cfg(any(target_os = "linux", target_os = "android", target_os = "macos",
                      target_os = "ios", target_os = "freebsd", target_os = "dragonfly",
                      target_os = "openbsd", target_os = "netbsd", target_os = "solaris",
                      target_os = "illumos"))]
            Facility::Cron => libc::LOG_CRON,
            #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos",
                      target_os = "ios", target_os = "freebsd", target_os = "dragonfly",
                      target_os = "openbsd", target_os = "netbsd", target_os = "solaris",
                      target_os = "illumos")))]
            Facility::Cron => libc::LOG_DAEMON,
            Facility::Daemon => libc::LOG_DAEMON,
            #[cfg(any(target_os = "linux", target_os = "android", target_os = "macos",
                      target_os = "ios", target_os = "freebsd", target_os = "dragonfly",
                      target_os = "openbsd", target_os = "netbsd"))]
            Facility::Ftp => libc::LOG_FTP,
            #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "macos",
                      target_os = "ios", target_os = "freebsd", target_os = "dragonfly",
                      target_os = "openbsd", target_os = "netbsd")))]
            Facility::Ftp => libc::LOG_DAEMON,
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            Facility::Install => libc::LOG_INSTALL,
            #[cfg(not(any(target_os = "macos", target_os = "ios")))]
            Facility::Install => libc::LOG_USER,
            Facility::Kern => libc::LOG_KERN,
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            Facility::Launchd => libc::LOG_LAUNCHD,
            #[cfg(not(any(target_os = "macos", target_os = "ios")))]
            Facility::Launchd => libc::LOG_DAEMON,
            Facility::Local0 => libc::LOG_LOCAL0,
            Facility::Local1 => libc::LOG_LOCAL1,
            Facility::Local2 => libc::LOG_LOCAL2,
            Facility::Local3 => libc::LOG_LOCAL3,
            Facility::Local4 => libc::LOG_LOCAL4,
            Facility::Local5 => libc::LOG_LOCAL5,
            Facility::Local6 => libc::LOG_LOCAL6,
            Facility::Local7 => libc::LOG_LOCAL7,
            Facility::Lpr => libc::LOG_LPR,
            Facility::Mail => libc::LOG_MAIL,
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            Facility::NetInfo => libc::LOG_NETINFO,
            #[cfg(not(any(target_os = "macos", target_os = "ios")))]
            Facility::NetInfo => libc::LOG_DAEMON,
            Facility::News => libc::LOG_NEWS,
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            Facility::RemoteAuth => libc::LOG_REMOTEAUTH,
            #[cfg(not(any(target_os = "macos", target_os = "ios")))]
            Facility::RemoteAuth => libc::LOG_DAEMON,
            Facility::Syslog => libc::LOG_SYSLOG,
            Facility::User => libc::LOG_USER,
            Facility::Uucp => libc::LOG_UUCP,
        }
    }
}

impl Default for Facility {
    fn default() -> Self {
        Facility::User
    }
}

impl Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Facility> for c_int {
    fn from(facility: Facility) -> Self {
        facility.to_raw()
    }
}

impl FromStr for Facility {
    type Err = UnknownFacilityError;

    /// Accepts any name from [`Facility::name`], case-insensitively, plus
    /// `security` as a historical alias for `auth`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();

        match &*lower {
            "auth" => Ok(Facility::Auth),
            "authpriv" => Ok(Facility::AuthPriv),
            "cron" => Ok(Facility::Cron),
            "daemon" => Ok(Facility::Daemon),
            "ftp" => Ok(Facility::Ftp),
            "install" => Ok(Facility::Install),
            "kern" => Ok(Facility::Kern),
            "launchd" => Ok(Facility::Launchd),
            "local0" => Ok(Facility::Local0),
            "local1" => Ok(Facility::Local1),
            "local2" => Ok(Facility::Local2),
            "local3" => Ok(Facility::Local3),
            "local4" => Ok(Facility::Local4),
            "local5" => Ok(Facility::Local5),
            "local6" => Ok(Facility::Local6),
            "local7" => Ok(Facility::Local7),
            "lpr" => Ok(Facility::Lpr),
            "mail" => Ok(Facility::Mail),
            "netinfo" => Ok(Facility::NetInfo),
            "news" => Ok(Facility::News),
            "remoteauth" => Ok(Facility::RemoteAuth),
            "security" => Ok(Facility::Auth),
            "syslog" => Ok(Facility::Syslog),
            "user" => Ok(Facility::User),
            "uucp" => Ok(Facility::Uucp),
            _ => Err(UnknownFacilityError { name: lower }),
        }
    }
}

/// Indicates that `<Facility as FromStr>::from_str` was called with an
/// unrecognized facility name.
#[derive(Clone, Debug)]
#[cfg_attr(test, derive(Eq, PartialEq))]
pub struct UnknownFacilityError {
    name: String,
}

impl UnknownFacilityError {
    /// The unrecognized facility name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for UnknownFacilityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unrecognized facility name `{}`", self.name)
    }
}

impl Error for UnknownFacilityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_accepts_security_alias() {
        assert_eq!(Facility::from_str("security"), Ok(Facility::Auth));
        assert_eq!(Facility::from_str("SECURITY"), Ok(Facility::Auth));
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!(Facility::from_str("Daemon"), Ok(Facility::Daemon));
        assert_eq!(Facility::from_str("LOCAL3"), Ok(Facility::Local3));
    }

    #[test]
    fn from_str_rejects_unknown_names() {
        let err = Facility::from_str("foobar").unwrap_err();
        assert_eq!(err.name(), "foobar");
        assert_eq!(err.to_string(), "unrecognized facility name `foobar`");
    }

    #[test]
    fn name_round_trips_through_from_str() {
        for facility in Facility::ALL {
            assert_eq!(Facility::from_str(facility.name()), Ok(facility));
        }
    }

    #[test]
    fn default_is_user() {
        assert_eq!(Facility::default(), Facility::User);
    }
}
