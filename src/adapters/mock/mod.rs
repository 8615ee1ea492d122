pub mod notification_channel;

pub use notification_channel::RecordingChannel;
