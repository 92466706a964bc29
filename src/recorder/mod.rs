//! Sampling and fixture recording.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::cassette::{Cassette, CassettePacker, JsonPacker};
use crate::config::Settings;
use crate::error::RecorderError;
use crate::model::{CallbackOutput, FetchResponse, Record, Value};
use crate::snapshot::Snapshotter;
use crate::spider::Spider;
use crate::util::names::sanitize_spider_name;

/// Records callback invocations as fixture cassettes, bounding how many
/// persist per callback via streaming reservoir sampling.
///
/// One recorder instance covers one job run: construction clears the
/// previous run's fixtures for this spider and captures its initial
/// attributes. The host framework serializes calls per job instance, so the
/// recorder does no internal locking.
pub struct Recorder {
    settings: Settings,
    spider_name: String,
    init_attrs: Record,
    max_fixtures: u64,
    fixture_counters: HashMap<String, u64>,
    base_path: PathBuf,
    packer: Box<dyn CassettePacker>,
}

impl Recorder {
    pub fn new(
        spider: &Spider,
        settings: Settings,
        base_path: impl Into<PathBuf>,
    ) -> Result<Self, RecorderError> {
        let base_path = base_path.into();
        let spider_name = sanitize_spider_name(&spider.name);
        let init_attrs = Snapshotter::new(spider, &settings).spider_attrs();
        let max_fixtures = settings.max_fixtures();

        fs::create_dir_all(&base_path)?;
        clear_fixtures(&base_path, &spider_name);

        for warning in settings.deprecated_warnings() {
            tracing::warn!("{warning}");
        }

        Ok(Self {
            settings,
            spider_name,
            init_attrs,
            max_fixtures,
            fixture_counters: HashMap::new(),
            base_path,
            packer: Box::new(JsonPacker),
        })
    }

    /// Swaps the packing collaborator.
    pub fn with_packer(mut self, packer: Box<dyn CassettePacker>) -> Self {
        self.packer = packer;
        self
    }

    pub fn spider_name(&self) -> &str {
        &self.spider_name
    }

    pub fn max_fixtures(&self) -> u64 {
        self.max_fixtures
    }

    /// Cassette shell for a response that is about to reach its callback.
    pub fn new_cassette(&self, spider: &Spider, response: &FetchResponse) -> Cassette {
        let snapshotter = Snapshotter::new(spider, &self.settings);
        let (request, response_record) = snapshotter.snapshot_response_pair(response);
        Cassette {
            spider_name: self.spider_name.clone(),
            request,
            response: response_record,
            init_attrs: self.init_attrs.clone(),
            input_attrs: snapshotter.spider_attrs(),
            output_attrs: Record::new(),
            output_data: Vec::new(),
            filename: None,
        }
    }

    /// Records a finished invocation.
    ///
    /// The outputs are only borrowed; the caller's pipeline keeps using
    /// them untouched. A kept invocation is packed and written (overwriting
    /// any previous fixture at that slot); a write failure fails this
    /// invocation's recording only, never the crawl itself.
    pub fn record(
        &mut self,
        spider: &Spider,
        mut cassette: Cassette,
        outputs: &[CallbackOutput],
    ) -> Result<(), RecorderError> {
        let snapshotter = Snapshotter::new(spider, &self.settings);
        cassette.output_data = snapshotter.snapshot_callback_output(outputs);
        cassette.output_attrs = snapshotter.spider_attrs();

        let callback_name = cassette.callback_name().to_string();
        let counter = self.fixture_counters.entry(callback_name.clone()).or_insert(0);
        let seen = *counter;
        *counter += 1;

        let test_dir = self.test_dir(&callback_name)?;

        if let Some(slot) = sample_slot(seen, self.max_fixtures, &mut rand::rng()) {
            self.add_sample(spider, slot, &test_dir, cassette)?;
        }
        Ok(())
    }

    /// Re-packs a cassette over an existing fixture file.
    pub fn update_fixture(&self, cassette: &Cassette, path: &Path) -> Result<(), RecorderError> {
        fs::write(path, self.packer.pack(cassette)?)?;
        Ok(())
    }

    /// Per-callback fixture directory, created lazily. Pre-existing
    /// directories are not an error.
    fn test_dir(&self, callback_name: &str) -> Result<PathBuf, RecorderError> {
        let mut dir = self.base_path.join("tests").join(&self.spider_name);
        if let Some(extra) = &self.settings.extra_path {
            dir = dir.join(extra);
        }
        dir = dir.join(callback_name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn fixture_name(&self, spider: &Spider, slot: u64) -> String {
        let default_name = format!("fixture{slot}.bin");
        let Some(attr) = &self.settings.fixture_naming_attr else {
            return default_name;
        };
        match spider.attr(attr).and_then(naming_value) {
            Some(value) => format!("fixture_{value}_{slot}.bin"),
            None => {
                tracing::warn!(
                    attr = attr.as_str(),
                    "could not find naming attribute on spider; using default fixture naming"
                );
                default_name
            }
        }
    }

    fn add_sample(
        &self,
        spider: &Spider,
        slot: u64,
        test_dir: &Path,
        mut cassette: Cassette,
    ) -> Result<(), RecorderError> {
        let filename = self.fixture_name(spider, slot);
        let path = test_dir.join(&filename);
        cassette.filename = Some(filename);
        fs::write(path, self.packer.pack(&cassette)?)?;
        Ok(())
    }
}

/// Reservoir decision for one invocation.
///
/// `seen` is how many invocations of this callback happened before this
/// one. The first `max` invocations are always kept, at slot `seen + 1`;
/// afterwards a uniform draw over `[0, seen]` inclusive keeps the
/// invocation at slot `r + 1` iff `r < max`. At any point each invocation
/// so far occupies a slot with probability `max / seen`, without knowing
/// the total invocation count in advance.
pub fn sample_slot(seen: u64, max: u64, rng: &mut impl Rng) -> Option<u64> {
    if seen < max {
        return Some(seen + 1);
    }
    let r = rng.random_range(0..=seen);
    if r < max {
        Some(r + 1)
    } else {
        None
    }
}

/// Filename fragment derived from a naming attribute; only scalar shapes
/// qualify.
fn naming_value(value: &Value) -> Option<String> {
    if !value.is_truthy() {
        return None;
    }
    match value {
        Value::Scalar(serde_json::Value::String(s)) => Some(s.clone()),
        Value::Scalar(serde_json::Value::Number(n)) => Some(n.to_string()),
        Value::Scalar(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}

/// Deletes the previous run's fixture tree for this spider. A missing tree
/// is fine; any other failure only means stale fixtures survive until
/// overwritten.
fn clear_fixtures(base_path: &Path, spider_name: &str) {
    let path = base_path.join("tests").join(spider_name);
    if let Err(err) = fs::remove_dir_all(&path) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::debug!(
                error = %err,
                path = %path.display(),
                "failed to clear previous fixtures"
            );
        }
    }
}
