mod channel_queue;

pub use channel_queue::ChannelJobQueue;
