//! Recursive snapshotting of live object graphs into portable records.

use crate::cassette::{OutputKind, TaggedOutput};
use crate::config::Settings;
use crate::model::{CallbackOutput, FetchRequest, FetchResponse, HeaderMap, Record, Value};
use crate::snapshot::redact::redact_path;
use crate::spider::{Rule, Spider};

/// Default entry-point callback for requests without an explicit one.
pub const DEFAULT_CALLBACK: &str = "parse";

/// Reserved metadata key used for replay bookkeeping; never recorded.
pub const CASSETTE_META_KEY: &str = "_spidertape_cassette";

/// Metadata key carrying the index of the routing rule a request was
/// queued under.
pub const RULE_META_KEY: &str = "rule";

/// Converts live values into fully portable, privacy-scrubbed snapshots.
///
/// The engine only ever mutates values it exclusively owns: callers hand
/// over either an owned copy or a value destined only for the fixture.
pub struct Snapshotter<'a> {
    spider: &'a Spider,
    settings: &'a Settings,
}

impl<'a> Snapshotter<'a> {
    pub fn new(spider: &'a Spider, settings: &'a Settings) -> Self {
        Self { spider, settings }
    }

    /// Recursively converts a value into its portable form. Shapes outside
    /// the known set pass through unchanged.
    pub fn snapshot(&self, value: Value) -> Value {
        match value {
            Value::Request(request) => Value::Record(self.snapshot_request(&request)),
            Value::Response(response) => Value::Record(self.snapshot_response(&response)),
            Value::Record(record) => Value::Record(
                record
                    .into_iter()
                    .map(|(key, value)| (key, self.snapshot(value)))
                    .collect(),
            ),
            Value::Seq(items) => {
                Value::Seq(items.into_iter().map(|v| self.snapshot(v)).collect())
            }
            // Fixed sequences are rebuilt rather than mutated, and stay fixed.
            Value::Fixed(items) => {
                Value::Fixed(items.into_iter().map(|v| self.snapshot(v)).collect())
            }
            other => other,
        }
    }

    /// Portable field mapping of a request: resolved callback name, cleaned
    /// headers, snapshotted and redacted metadata.
    pub fn snapshot_request(&self, request: &FetchRequest) -> Record {
        let mut headers = request.headers.clone();
        self.clean_headers(&mut headers);

        let mut record = Record::new();
        record.insert("url".to_string(), Value::str(request.url.clone()));
        record.insert("method".to_string(), Value::str(request.method.clone()));
        record.insert("headers".to_string(), Value::Record(headers.to_record()));
        record.insert(
            "callback".to_string(),
            Value::str(self.resolve_callback(request)),
        );
        record.insert(
            "meta".to_string(),
            Value::Record(self.snapshot_meta(&request.meta)),
        );
        record.insert("body".to_string(), Value::Bytes(request.body.clone()));
        record
    }

    /// Portable field mapping of a response: type tag, url, status, raw
    /// body, headers, flags, encoding. Response headers are recorded as-is.
    pub fn snapshot_response(&self, response: &FetchResponse) -> Record {
        let mut record = Record::new();
        record.insert("cls".to_string(), Value::str(response.kind.type_tag()));
        record.insert("url".to_string(), Value::str(response.request.url.clone()));
        record.insert(
            "status".to_string(),
            Value::int(i64::from(response.status)),
        );
        record.insert("body".to_string(), Value::Bytes(response.body.clone()));
        record.insert(
            "headers".to_string(),
            Value::Record(response.headers.to_record()),
        );
        record.insert(
            "flags".to_string(),
            Value::Seq(response.flags.iter().map(|f| Value::str(f.clone())).collect()),
        );
        record.insert(
            "encoding".to_string(),
            match &response.encoding {
                Some(encoding) => Value::str(encoding.clone()),
                None => Value::null(),
            },
        );
        record
    }

    /// Snapshot of the request/response pair that triggered a callback.
    pub fn snapshot_response_pair(&self, response: &FetchResponse) -> (Record, Record) {
        (
            self.snapshot_request(&response.request),
            self.snapshot_response(response),
        )
    }

    /// Tagged snapshots of everything a callback produced, in order.
    ///
    /// The live outputs are only borrowed; the caller's pipeline keeps
    /// using them untouched. Non-request outputs are cloned before
    /// snapshotting so fixture-only redaction never corrupts live job data.
    pub fn snapshot_callback_output(&self, outputs: &[CallbackOutput]) -> Vec<TaggedOutput> {
        outputs
            .iter()
            .map(|output| match output {
                CallbackOutput::Request(request) => TaggedOutput {
                    kind: OutputKind::Request,
                    data: Value::Record(self.snapshot_request(request)),
                },
                CallbackOutput::Record(value) => TaggedOutput {
                    kind: OutputKind::Record,
                    data: self.snapshot(value.clone()),
                },
            })
            .collect()
    }

    /// Spider attributes eligible for recording: every entry whose name is
    /// not reserved, not a rule table (when the job routes by rules), and
    /// not excluded by `dont_record_spider_attrs`. Values are recorded
    /// as-is.
    pub fn spider_attrs(&self) -> Record {
        self.spider
            .attrs
            .iter()
            .filter(|(name, _)| !self.is_filtered_attr(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn is_filtered_attr(&self, name: &str) -> bool {
        const RESERVED_ATTRS: [&str; 3] = ["crawler", "settings", "start_urls"];
        if RESERVED_ATTRS.contains(&name) {
            return true;
        }
        if self.spider.uses_rules() && name == "rules" {
            return true;
        }
        self.settings
            .dont_record_spider_attrs
            .iter()
            .any(|attr| attr == name)
    }

    fn clean_headers(&self, headers: &mut HeaderMap) {
        for name in self.settings.header_denylist() {
            headers.remove(&name);
        }
    }

    fn resolve_callback(&self, request: &FetchRequest) -> String {
        let name = request.callback.as_deref().unwrap_or("");
        if name.is_empty() {
            return DEFAULT_CALLBACK.to_string();
        }
        if self.spider.uses_rules() {
            if let Some(rule) = self.matched_rule(request) {
                return rule.callback.clone();
            }
        }
        name.to_string()
    }

    fn matched_rule(&self, request: &FetchRequest) -> Option<&Rule> {
        let index = match request.meta.get(RULE_META_KEY)? {
            Value::Scalar(scalar) => scalar.as_u64()? as usize,
            _ => return None,
        };
        self.spider.rule(index)
    }

    fn snapshot_meta(&self, meta: &Record) -> Record {
        let mut out = Record::new();
        for (key, value) in meta {
            if key == CASSETTE_META_KEY {
                continue;
            }
            out.insert(key.clone(), self.snapshot(value.clone()));
        }
        for path in &self.settings.dont_record_meta {
            redact_path(&mut out, path);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshotter_parts() -> (Spider, Settings) {
        (Spider::new("quotes"), Settings::default())
    }

    fn request_with_headers() -> FetchRequest {
        let mut request = FetchRequest::new("https://example.com/");
        request.headers.insert_text("Authorization", b"tok".to_vec());
        request
            .headers
            .insert_bytes(b"Proxy-Authorization".to_vec(), b"tok2".to_vec());
        request.headers.insert_text("X-Secret", b"s".to_vec());
        request.headers.insert_text("Accept", b"text/html".to_vec());
        request
    }

    fn headers_of(record: &Record) -> &Record {
        match record.get("headers") {
            Some(Value::Record(headers)) => headers,
            other => panic!("headers should be a record, got {other:?}"),
        }
    }

    #[test]
    fn header_redaction_is_complete() {
        let (spider, mut settings) = snapshotter_parts();
        settings.dont_record_headers = vec!["X-Secret".to_string()];
        let snapshotter = Snapshotter::new(&spider, &settings);

        let snapshot = snapshotter.snapshot_request(&request_with_headers());
        let headers = headers_of(&snapshot);

        assert!(!headers.contains_key("Authorization"));
        assert!(!headers.contains_key("Proxy-Authorization"));
        assert!(!headers.contains_key("X-Secret"));
        assert!(headers.contains_key("Accept"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn allowlisted_auth_header_survives() {
        let (spider, mut settings) = snapshotter_parts();
        settings.record_auth_headers = vec!["Authorization".to_string()];
        let snapshotter = Snapshotter::new(&spider, &settings);

        let snapshot = snapshotter.snapshot_request(&request_with_headers());
        let headers = headers_of(&snapshot);

        assert!(headers.contains_key("Authorization"));
        assert!(!headers.contains_key("Proxy-Authorization"));
    }

    #[test]
    fn missing_callback_resolves_to_entry_point() {
        let (spider, settings) = snapshotter_parts();
        let snapshotter = Snapshotter::new(&spider, &settings);

        let snapshot = snapshotter.snapshot_request(&FetchRequest::new("https://example.com/"));
        assert_eq!(
            snapshot.get("callback").and_then(Value::as_str),
            Some(DEFAULT_CALLBACK)
        );

        let empty = FetchRequest::new("https://example.com/").with_callback("");
        let snapshot = snapshotter.snapshot_request(&empty);
        assert_eq!(
            snapshot.get("callback").and_then(Value::as_str),
            Some(DEFAULT_CALLBACK)
        );
    }

    #[test]
    fn rule_matched_request_resolves_to_rule_callback() {
        let spider = Spider::new("quotes").with_rules(vec![
            Rule::new("/page/", "parse_page"),
            Rule::new("/author/", "parse_author"),
        ]);
        let settings = Settings::default();
        let snapshotter = Snapshotter::new(&spider, &settings);

        let mut request = FetchRequest::new("https://example.com/author/x")
            .with_callback("_generic_dispatch");
        request.meta.insert(RULE_META_KEY.to_string(), Value::int(1));

        let snapshot = snapshotter.snapshot_request(&request);
        assert_eq!(
            snapshot.get("callback").and_then(Value::as_str),
            Some("parse_author")
        );
    }

    #[test]
    fn reserved_meta_key_is_never_recorded() {
        let (spider, mut settings) = snapshotter_parts();
        settings.dont_record_meta = vec!["download.latency".to_string()];
        let snapshotter = Snapshotter::new(&spider, &settings);

        let mut download = Record::new();
        download.insert("latency".to_string(), Value::int(120));
        download.insert("retries".to_string(), Value::int(2));

        let mut request = FetchRequest::new("https://example.com/");
        request
            .meta
            .insert(CASSETTE_META_KEY.to_string(), Value::str("bookkeeping"));
        request
            .meta
            .insert("download".to_string(), Value::Record(download));

        let snapshot = snapshotter.snapshot_request(&request);
        let Some(Value::Record(meta)) = snapshot.get("meta") else {
            panic!("meta should be a record");
        };
        assert!(!meta.contains_key(CASSETTE_META_KEY));
        let Some(Value::Record(download)) = meta.get("download") else {
            panic!("download should survive");
        };
        assert!(!download.contains_key("latency"));
        assert!(download.contains_key("retries"));
    }

    #[test]
    fn fixed_sequences_round_trip_as_fixed() {
        let (spider, settings) = snapshotter_parts();
        let snapshotter = Snapshotter::new(&spider, &settings);

        let inner_request = FetchRequest::new("https://example.com/next");
        let fixed = Value::Fixed(vec![
            Value::int(7),
            Value::Request(Box::new(inner_request)),
            Value::str("tail"),
        ]);

        let snapshot = snapshotter.snapshot(fixed);
        let Value::Fixed(items) = snapshot else {
            panic!("fixed sequences must stay fixed");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::int(7));
        assert!(matches!(items[1], Value::Record(_)));
        assert_eq!(items[2], Value::str("tail"));
    }

    #[test]
    fn callback_output_leaves_live_objects_untouched() {
        let (spider, mut settings) = snapshotter_parts();
        settings.dont_record_meta = vec!["session".to_string()];
        let snapshotter = Snapshotter::new(&spider, &settings);

        let request = request_with_headers();
        let mut fields = Record::new();
        fields.insert("title".to_string(), Value::str("t"));
        fields.insert(
            "next".to_string(),
            Value::Request(Box::new(request_with_headers())),
        );
        let record = Value::Record(fields);

        let outputs = vec![
            CallbackOutput::Request(request.clone()),
            CallbackOutput::Record(record.clone()),
        ];

        let tagged = snapshotter.snapshot_callback_output(&outputs);

        // Originals keep their auth headers and live shapes.
        assert_eq!(outputs[0], CallbackOutput::Request(request));
        assert_eq!(outputs[1], CallbackOutput::Record(record));

        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[0].kind, OutputKind::Request);
        assert_eq!(tagged[1].kind, OutputKind::Record);

        // The snapshot itself did get scrubbed.
        let Value::Record(request_snapshot) = &tagged[0].data else {
            panic!()
        };
        assert!(!headers_of(request_snapshot).contains_key("Authorization"));
        let Value::Record(record_snapshot) = &tagged[1].data else {
            panic!()
        };
        let Some(Value::Record(next)) = record_snapshot.get("next") else {
            panic!("nested request should snapshot to a record");
        };
        assert!(!headers_of(next).contains_key("Authorization"));
    }

    #[test]
    fn unknown_shapes_pass_through() {
        let (spider, settings) = snapshotter_parts();
        let snapshotter = Snapshotter::new(&spider, &settings);

        let opaque = Value::Scalar(serde_json::json!({"weird": [1, 2, {"deep": true}]}));
        assert_eq!(snapshotter.snapshot(opaque.clone()), opaque);

        let bytes = Value::Bytes(vec![0, 159, 146, 150]);
        assert_eq!(snapshotter.snapshot(bytes.clone()), bytes);
    }

    #[test]
    fn spider_attrs_filters_reserved_rule_and_user_names() {
        let mut spider = Spider::new("quotes").with_rules(vec![Rule::new("/", "parse")]);
        spider.set_attr("page", Value::int(3));
        spider.set_attr("crawler", Value::str("handle"));
        spider.set_attr("settings", Value::str("cfg"));
        spider.set_attr("start_urls", Value::Seq(vec![Value::str("https://e.com")]));
        spider.set_attr("rules", Value::str("table"));
        spider.set_attr("secret_state", Value::str("x"));

        let settings = Settings {
            dont_record_spider_attrs: vec!["secret_state".to_string()],
            ..Settings::default()
        };
        let snapshotter = Snapshotter::new(&spider, &settings);

        let attrs = snapshotter.spider_attrs();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("page"), Some(&Value::int(3)));
    }
}
