/*!
# vmowner DevKit - stubs and fixtures for tests

Lets the resolver, reporter and dispatcher be exercised without a directory
server or a mail relay:
- `MockDirectory`: in-memory `Directory` that records every query
- `RecordingNotifier`: `Notifier` that keeps what it was asked to send
- `fixtures`: user records and inventory files
*/

pub mod directory_stub;
pub mod fixtures;
pub mod notifier_stub;

pub use directory_stub::{MockDirectory, Query};
pub use notifier_stub::RecordingNotifier;
