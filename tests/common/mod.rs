#![allow(dead_code)]

pub use assetpipe_test_utils::builders;
pub use assetpipe_test_utils::fakes;
pub use assetpipe_test_utils::{eventually, init_tracing, with_timeout};
