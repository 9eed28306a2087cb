mod serper_client;

pub use serper_client::SerperSearchClient;
