#[cfg(feature = "http")]
mod http;
mod mock;
