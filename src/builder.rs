//! The default message builder (§4.G): constructs the eight-key skeleton a
//! caller fills in before sending.

use crate::record::Record;

/// Builds the default eight-key message skeleton (`Time`, `Host`, `Sender`,
/// `PID`, `UID`, `GID`, `Level`, `Message`), each present with a null value,
/// in that order. [`crate::client::Client::send`] fills in whichever of
/// these are still null at send time.
pub fn new_message() -> Record {
    Record::new_message()
}
