//! End-to-end integration test: a client built against fakes, sent through
//! the full default-fill + filter + fan-out pipeline, and inspected through
//! what those fakes observed.

use std::sync::Arc;

use asl_client::client::{Client, ClientOptions};
use asl_client::codec::text;
use asl_client::daemon::fake::FakeDaemonSink;
use asl_client::format::{Encoding, MsgFormat, TimeFormat};
use asl_client::level::Level;
use asl_client::notifier::fake::FakeNotifier;
use asl_client::{builder, Record};

fn daemon_message(sink: &FakeDaemonSink) -> Record {
    let frame = sink.received().pop().expect("a frame was sent");
    let space = frame.iter().position(|&b| b == b' ').unwrap();
    let text = std::str::from_utf8(&frame[space + 1..frame.len() - 1]).unwrap();
    text::decode(text).expect("daemon frame decodes")
}

#[test]
fn default_client_fills_attributes_and_reaches_the_daemon() {
    let sink = Arc::new(FakeDaemonSink::new());
    let sink_for_factory = sink.clone();
    let mut client = Client::open(Some("integration-app"), Some("local3"), ClientOptions::NONE, move || {
        sink_for_factory as Arc<dyn asl_client::daemon::DaemonSink>
    });
    let notifier = FakeNotifier::new();

    let mut msg = builder::new_message();
    msg.set(b"Message", Some(b"integration hello")).unwrap();
    let status = client.send(msg, Level::Warning, &notifier);

    assert!(status.is_ok());
    let received = daemon_message(&sink);
    assert_eq!(received.get("Sender"), Some(&b"integration-app"[..]));
    assert_eq!(received.get("Facility"), Some(&b"local3"[..]));
    assert_eq!(received.get("Level"), Some(&b"4"[..]));
    assert!(received.get("Host").is_some());
    assert!(received.get("PID").is_some());
}

#[test]
fn system_master_override_reaches_records_the_client_mask_would_drop() {
    let sink = Arc::new(FakeDaemonSink::new());
    let sink_for_factory = sink.clone();
    let mut client = Client::open(None, None, ClientOptions::NONE, move || {
        sink_for_factory as Arc<dyn asl_client::daemon::DaemonSink>
    });
    client.set_filter_mask_upto(Level::Error);
    let notifier = FakeNotifier::new();

    let dropped = client.send(builder::new_message(), Level::Debug, &notifier);
    assert_eq!(sink.received().len(), 0);
    assert!(dropped.is_ok());

    notifier.bump("com.apple.system.filter.master", Level::Debug.mask_upto() as u64);
    notifier.bump("com.apple.asl.filter", 1);

    let admitted = client.send(builder::new_message(), Level::Debug, &notifier);
    assert!(admitted.is_ok());
    assert_eq!(sink.received().len(), 1);
    let received = daemon_message(&sink);
    assert!(received.get("ASLOption").unwrap().starts_with(b"store"));
}

#[test]
fn local_sink_receives_the_configured_render_mode() {
    let mut read_fd = [0; 2];
    assert_eq!(unsafe { libc::pipe(read_fd.as_mut_ptr()) }, 0);
    let [read_end, write_end] = read_fd;

    let mut client = Client::open(Some("pipe-app"), None, ClientOptions::NO_REMOTE, || unreachable!());
    client.add_sink(write_end, MsgFormat::Msg, TimeFormat::Sec, Encoding::None);
    let notifier = FakeNotifier::new();

    let mut msg = builder::new_message();
    msg.set(b"Message", Some(b"piped")).unwrap();
    let status = client.send(msg, Level::Info, &notifier);
    assert!(status.is_ok());

    let mut buf = [0u8; 64];
    let n = unsafe { libc::read(read_end, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
    assert!(n > 0);
    assert_eq!(&buf[..n as usize], b"piped\n");

    unsafe {
        libc::close(read_end);
        libc::close(write_end);
    }
}
