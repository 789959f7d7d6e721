//! API Adapter - 后端 REST API 客户端实现

mod fake_api_client;
mod http_api_client;

pub use fake_api_client::FakeNovelApi;
pub use http_api_client::*;
