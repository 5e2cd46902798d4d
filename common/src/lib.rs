pub mod blink;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod schedule;
pub mod types;
pub mod wire;

pub use blink::{ArmedSession, BlinkPhase, BlinkRefusal, BlinkSession};
pub use codec::parse_setting;
pub use config::ClientConfig;
pub use endpoint::ControllerEndpoint;
pub use error::{ActionError, ParseError, RequestError, ValidationError};
pub use schedule::{ClockTime, GlowWindow};
pub use types::{minutes_label, Mode, ScheduleSnapshot, SettingName};
pub use wire::*;
