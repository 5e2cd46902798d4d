pub mod blink;
pub mod client;
pub mod clock;
pub mod panel;
pub mod status;
pub mod store;
pub mod synchronizer;

pub use blink::{BlinkOutcome, BlinkTracker};
pub use client::{ControllerApi, ControllerClient, ControllerRequest};
pub use clock::{Clock, SystemClock};
pub use panel::{ControlPanel, PanelSnapshot};
pub use status::{StatusBoard, StatusView};
pub use store::{BaseUrlStore, FileKeyValueStore, MemoryKeyValueStore, SaveStatus, StorageBackend};
pub use synchronizer::{RefreshReport, SettingSynchronizer, ShadowSettings, WriteOutcome};
