pub mod cassette;
pub mod config;
pub mod error;
pub mod model;
pub mod recorder;
pub mod snapshot;
pub mod spider;
pub mod util;

pub use cassette::{Cassette, CassettePacker, JsonPacker, OutputKind, TaggedOutput};
pub use config::Settings;
pub use error::RecorderError;
pub use model::{
    CallbackOutput, FetchRequest, FetchResponse, HeaderKey, HeaderMap, Record, ResponseKind, Value,
};
pub use recorder::{sample_slot, Recorder};
pub use snapshot::{redact_path, Snapshotter, CASSETTE_META_KEY, DEFAULT_CALLBACK, RULE_META_KEY};
pub use spider::{Rule, Spider};
