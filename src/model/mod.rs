pub mod http;
pub mod value;

pub use http::{CallbackOutput, FetchRequest, FetchResponse, HeaderKey, HeaderMap, ResponseKind};
pub use value::{Record, Value};
