//! The client handle and the send pipeline: default-attribute fill-in,
//! severity-mask filtering against the process/system-master override, and
//! fan-out to the daemon sink and local sinks (§3, §4.F).

use std::io;
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex, OnceLock};

use crate::daemon::{self, DaemonSink};
use crate::error::{DaemonError, SendStatus};
use crate::facility::Facility;
use crate::format::{self, Encoding, MsgFormat, TimeFormat};
use crate::global;
use crate::level::Level;
use crate::notifier::Notifier;
use crate::record::{keys, Record};

/// Construction-time options for [`Client::open`] (§3, §4.F).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClientOptions(u32);

impl ClientOptions {
    pub const NONE: ClientOptions = ClientOptions(0);
    /// Disables the daemon sink; only local sinks receive records.
    pub const NO_REMOTE: ClientOptions = ClientOptions(1 << 0);
    /// Adds a local `std`-format sink on standard error at construction.
    pub const STDERR: ClientOptions = ClientOptions(1 << 1);

    pub fn contains(self, flag: ClientOptions) -> bool {
        self.0 & flag.0 == flag.0
    }

    pub fn union(self, other: ClientOptions) -> ClientOptions {
        ClientOptions(self.0 | other.0)
    }
}

impl std::ops::BitOr for ClientOptions {
    type Output = ClientOptions;
    fn bitor(self, rhs: ClientOptions) -> ClientOptions {
        self.union(rhs)
    }
}

/// The sentinel a [`Sink`]'s `fd` is set to once a write has failed, so
/// later sends skip it without needing to shrink the vector mid-iteration.
const DEAD_FD: RawFd = -1;

struct Sink {
    fd: RawFd,
    msg_format: MsgFormat,
    time_format: TimeFormat,
    encoding: Encoding,
}

/// A log client: the handle an application opens once and sends records
/// through (§3's `Client`).
pub struct Client {
    ident: Option<String>,
    facility: Facility,
    options: ClientOptions,
    filter_mask: u32,
    sinks: Vec<Sink>,
    pid: i32,
    uid: u32,
    gid: u32,
    daemon: Option<Arc<dyn DaemonSink>>,
}

fn write_all_fd(fd: RawFd, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        let n = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned zero bytes"));
        }
        buf = &buf[n as usize..];
    }
    Ok(())
}

fn hostname() -> Vec<u8> {
    let mut buf = vec![0u8; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return b"localhost".to_vec();
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    buf.truncate(len);
    buf
}

impl Client {
    /// Opens a new client. `ident` defaults to the process-wide cached
    /// sender (argv[0]'s basename); `facility` defaults to `"user"`, the
    /// same default [`Facility::default`] uses.
    ///
    /// `daemon_factory` is consulted only on the first call across the
    /// process to construct the shared daemon-sink handle (§5); later
    /// calls reuse it regardless of what `daemon_factory` would build.
    pub fn open(
        ident: Option<&str>,
        facility: Option<&str>,
        options: ClientOptions,
        daemon_factory: impl FnOnce() -> Arc<dyn DaemonSink>,
    ) -> Client {
        let facility = facility.and_then(|f| f.parse().ok()).unwrap_or_default();

        let daemon = if options.contains(ClientOptions::NO_REMOTE) {
            None
        } else {
            Some(global::state().acquire_daemon_sink(daemon_factory))
        };

        let mut client = Client {
            ident: ident.map(str::to_string),
            facility,
            options,
            filter_mask: Level::default().mask_upto(),
            sinks: Vec::new(),
            pid: std::process::id() as i32,
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
            daemon,
        };

        if options.contains(ClientOptions::STDERR) {
            client.add_sink(2, MsgFormat::Std, TimeFormat::Lcl, Encoding::Safe);
        }

        client
    }

    /// Sets the client's own severity filter to "up to and including
    /// `level`" (§4.F). Overridden at send time by a non-zero process or
    /// system-master override mask.
    pub fn set_filter_mask_upto(&mut self, level: Level) {
        self.filter_mask = level.mask_upto();
    }

    pub fn filter_mask(&self) -> u32 {
        self.filter_mask
    }

    pub fn facility(&self) -> Facility {
        self.facility
    }

    /// Adds a local sink, or updates its format/time-format/encoding in
    /// place if `fd` already has one (§4.F).
    pub fn add_sink(&mut self, fd: RawFd, msg_format: MsgFormat, time_format: TimeFormat, encoding: Encoding) {
        if let Some(existing) = self.sinks.iter_mut().find(|s| s.fd == fd) {
            existing.msg_format = msg_format;
            existing.time_format = time_format;
            existing.encoding = encoding;
        } else {
            self.sinks.push(Sink { fd, msg_format, time_format, encoding });
        }
    }

    pub fn remove_sink(&mut self, fd: RawFd) {
        self.sinks.retain(|s| s.fd != fd);
    }

    fn fill_defaults(&self, record: &mut Record, level: Level) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        if record.get(keys::TIME).is_none() {
            let _ = record.set(keys::TIME.as_bytes(), Some(now.as_secs().to_string().as_bytes()));
        }
        if record.get(keys::TIME_NANO_SEC).is_none() {
            let _ = record.set(keys::TIME_NANO_SEC.as_bytes(), Some(now.subsec_nanos().to_string().as_bytes()));
        }
        if record.get(keys::HOST).is_none() {
            let _ = record.set(keys::HOST.as_bytes(), Some(&hostname()));
        }
        if record.get(keys::PID).is_none() {
            let _ = record.set(keys::PID.as_bytes(), Some(self.pid.to_string().as_bytes()));
        }
        if record.get(keys::UID).is_none() {
            let _ = record.set(keys::UID.as_bytes(), Some(self.uid.to_string().as_bytes()));
        }
        if record.get(keys::GID).is_none() {
            let _ = record.set(keys::GID.as_bytes(), Some(self.gid.to_string().as_bytes()));
        }
        if record.get(keys::LEVEL).is_none() {
            let _ = record.set(keys::LEVEL.as_bytes(), Some(level.as_u8().to_string().as_bytes()));
        }
        if record.get(keys::SENDER).is_none() {
            let sender = self.ident.clone().unwrap_or_else(|| global::state().cached_sender());
            let _ = record.set(keys::SENDER.as_bytes(), Some(sender.as_bytes()));
        }
        if record.get(keys::FACILITY).is_none() {
            let _ = record.set(keys::FACILITY.as_bytes(), Some(self.facility.name().as_bytes()));
        }
    }

    /// Prepends `store ` to the outgoing record's `ASLOption` attribute, the
    /// annotation the daemon uses to tell an override-driven send apart
    /// from one the client's own filter would have let through anyway.
    fn annotate_store_option(&self, record: &mut Record) {
        let prior = record.get(keys::ASL_OPTION).map(<[u8]>::to_vec);
        let value = match prior {
            Some(p) if !p.is_empty() => {
                let mut v = b"store ".to_vec();
                v.extend_from_slice(&p);
                v
            }
            _ => b"store".to_vec(),
        };
        let _ = record.set(keys::ASL_OPTION.as_bytes(), Some(&value));
    }

    /// Fills default attributes, applies the filter pipeline, and fans the
    /// record out to the daemon sink (if enabled) and every local sink
    /// (§4.F).
    ///
    /// Returns immediately with an empty [`SendStatus`] if the effective
    /// severity mask drops `level`: neither the daemon nor any local sink
    /// sees the record in that case.
    pub fn send(&mut self, mut record: Record, level: Level, notifier: &dyn Notifier) -> SendStatus {
        let mut status = SendStatus::new();

        let (process_mask, master_mask) = global::state().refresh_override_masks(notifier);
        let effective_mask = if process_mask != 0 {
            process_mask
        } else if master_mask != 0 {
            master_mask
        } else {
            self.filter_mask
        };

        if effective_mask & level.mask_bit() == 0 {
            return status;
        }

        self.fill_defaults(&mut record, level);

        if process_mask != 0 || master_mask != 0 {
            self.annotate_store_option(&mut record);
        }

        if let Some(daemon) = self.daemon.clone() {
            let text = crate::codec::text::encode(&record);
            let framed = daemon::frame(&text);
            let result = match daemon.send(&framed) {
                Ok(()) => Ok(()),
                Err(first_err) => match daemon.rebind() {
                    Ok(()) => daemon.send(&framed).map_err(DaemonError::Send),
                    Err(_) => Err(DaemonError::Send(first_err)),
                },
            };
            status.daemon = Some(result);
        }

        for sink in &mut self.sinks {
            if sink.fd == DEAD_FD {
                continue;
            }
            let bytes = format::format_message(&record, &sink.msg_format, sink.time_format, sink.encoding);
            match write_all_fd(sink.fd, &bytes) {
                Ok(()) => status.sinks.push((sink.fd, Ok(()))),
                Err(e) => {
                    status.sinks.push((sink.fd, Err(e)));
                    sink.fd = DEAD_FD;
                }
            }
        }

        status
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.sinks.clear();
        if self.daemon.take().is_some() {
            global::state().release_daemon_sink();
        }
    }
}

/// Closes `client`. Equivalent to dropping it; provided so callers can
/// spell the lifecycle the way the rest of this API's open/close pairs do.
pub fn close(client: Client) {
    drop(client);
}

static DEFAULT_CLIENT: OnceLock<Mutex<Client>> = OnceLock::new();

/// Runs `f` against the process-wide implicit default client, constructing
/// it on first use (§5). `daemon_factory` is only consulted if no client
/// (default or otherwise) has acquired the daemon sink yet.
pub fn with_default_client<R>(
    daemon_factory: impl FnOnce() -> Arc<dyn DaemonSink>,
    f: impl FnOnce(&mut Client) -> R,
) -> R {
    let mutex = DEFAULT_CLIENT.get_or_init(|| Mutex::new(Client::open(None, None, ClientOptions::NONE, daemon_factory)));
    let mut guard = mutex.lock().unwrap();
    f(&mut guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::fake::FakeDaemonSink;
    use crate::notifier::fake::FakeNotifier;
    use crate::record::Record;

    fn fake_daemon() -> Arc<FakeDaemonSink> {
        Arc::new(FakeDaemonSink::new())
    }

    #[test]
    fn send_fills_defaults_and_reaches_daemon() {
        let sink = fake_daemon();
        let sink_for_factory = sink.clone();
        let mut client = Client::open(Some("myapp"), None, ClientOptions::NONE, move || sink_for_factory as Arc<dyn DaemonSink>);
        let notifier = FakeNotifier::new();

        let mut msg = Record::new_message();
        msg.set(b"Message", Some(b"hello")).unwrap();
        let status = client.send(msg, Level::Error, &notifier);

        assert!(status.is_ok());
        assert_eq!(sink.received().len(), 1);
        let frame = sink.received().pop().unwrap();
        let space = frame.iter().position(|&b| b == b' ').unwrap();
        let text = std::str::from_utf8(&frame[space + 1..frame.len() - 1]).unwrap();
        let decoded = crate::codec::text::decode(text).unwrap();
        assert_eq!(decoded.get("Sender"), Some(&b"myapp"[..]));
        assert_eq!(decoded.get("Level"), Some(&b"3"[..]));
        assert_eq!(decoded.get("Message"), Some(&b"hello"[..]));
    }

    #[test]
    fn client_filter_mask_drops_below_threshold() {
        let sink = fake_daemon();
        let sink_for_factory = sink.clone();
        let mut client = Client::open(None, None, ClientOptions::NONE, move || sink_for_factory as Arc<dyn DaemonSink>);
        client.set_filter_mask_upto(Level::Error);
        let notifier = FakeNotifier::new();

        let status = client.send(Record::new_message(), Level::Debug, &notifier);

        assert!(status.is_ok());
        assert!(status.daemon.is_none());
        assert_eq!(sink.received().len(), 0);
    }

    #[test]
    fn process_override_admits_a_level_the_client_mask_would_drop() {
        let sink = fake_daemon();
        let sink_for_factory = sink.clone();
        let mut client = Client::open(None, None, ClientOptions::NONE, move || sink_for_factory as Arc<dyn DaemonSink>);
        client.set_filter_mask_upto(Level::Error);
        let notifier = FakeNotifier::new();
        notifier.bump("com.apple.system.filter.process", Level::Debug.mask_upto() as u64);
        notifier.bump("com.apple.asl.filter", 1);

        let status = client.send(Record::new_message(), Level::Debug, &notifier);

        assert!(status.is_ok());
        assert_eq!(sink.received().len(), 1);
    }

    #[test]
    fn daemon_failure_does_not_flip_status_but_sink_failure_does() {
        let sink = fake_daemon();
        sink.fail_next_sends(2);
        let sink_for_factory = sink.clone();
        let mut client = Client::open(None, None, ClientOptions::NONE, move || sink_for_factory as Arc<dyn DaemonSink>);
        let notifier = FakeNotifier::new();

        let status = client.send(Record::new_message(), Level::Error, &notifier);
        assert!(status.is_ok());
        assert!(status.daemon.unwrap().is_err());

        client.add_sink(999, MsgFormat::Msg, TimeFormat::Sec, Encoding::None);
        let status = client.send(Record::new_message(), Level::Error, &notifier);
        assert!(!status.is_ok());
    }

    #[test]
    fn no_remote_option_skips_daemon_entirely() {
        let mut client = Client::open(None, None, ClientOptions::NO_REMOTE, || panic!("factory should not run"));
        let notifier = FakeNotifier::new();
        let status = client.send(Record::new_message(), Level::Error, &notifier);
        assert!(status.daemon.is_none());
    }
}
