mod fetch_port;

pub use fetch_port::FetchPort;

#[cfg(test)]
pub mod mocks {
    pub use super::fetch_port::mock::{MockFetcher, MockReply};
}
