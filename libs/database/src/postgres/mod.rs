pub mod connector;

pub use connector::{connect, connect_with_retry};
