//! Dotted-path field redaction over nested records.

use crate::model::{Record, Value};

/// Deletes the field(s) referenced by `path` from `record`, in place.
///
/// `path` is a dotted expression (`a.b.c`). A segment carrying the `[]`
/// marker addresses each element of the sequence under that key; a marked
/// terminal segment empties the whole sequence. Missing keys and falsy
/// values short-circuit silently, so redacting something that is not there
/// is a no-op. Paths may nest arbitrarily deep and carry multiple markers.
pub fn redact_path(record: &mut Record, path: &str) {
    let segments: Vec<&str> = path.split('.').collect();
    redact_segments(record, &segments);
}

fn redact_segments(record: &mut Record, segments: &[&str]) {
    let Some((&raw, rest)) = segments.split_first() else {
        return;
    };
    let each_element = raw.contains("[]");
    let key = raw.trim_matches(['[', ']']);

    match record.get(key) {
        None => return,
        Some(value) if !value.is_truthy() => return,
        Some(_) => {}
    }

    if each_element {
        if let Some(Value::Seq(items)) | Some(Value::Fixed(items)) = record.get_mut(key) {
            if rest.is_empty() {
                items.clear();
                return;
            }
            for item in items {
                if let Value::Record(child) = item {
                    redact_segments(child, rest);
                }
            }
        }
    } else if rest.is_empty() {
        record.shift_remove(key);
    } else if let Some(Value::Record(child)) = record.get_mut(key) {
        redact_segments(child, rest);
    }
}
