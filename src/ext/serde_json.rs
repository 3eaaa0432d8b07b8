// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path lookups into raw API payloads with typed, non-panicking extraction
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (typed, string and timestamp extraction)
// invariants: No panics; missing paths and JSON null yield None; to_or_default returns T::default on failure
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;

use crate::model::Timestamp;
use crate::window::parse_api_time;

/// A location inside a JSON document, resolved lazily into a typed value.
pub struct JsonFetched<'a> {
  inner: Option<&'a serde_json::Value>,
}

impl<'a> JsonFetched<'a> {
  /// Deserialize the fetched value as `T`; `None` when missing, null, or mistyped.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self
      .inner
      .filter(|v| !v.is_null())
      .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  pub fn to_or_default<T>(&self) -> T
  where
    T: DeserializeOwned + Default,
  {
    self.to::<T>().unwrap_or_default()
  }

  /// Borrow a string without cloning the value.
  pub fn str(&self) -> Option<&'a str> {
    self.inner.and_then(|v| v.as_str())
  }

  /// Read an RFC3339 timestamp string.
  pub fn time(&self) -> Option<Timestamp> {
    self.str().and_then(parse_api_time)
  }

  /// Render scalars (strings and numbers) as text, e.g. build numbers.
  pub fn text(&self) -> Option<String> {
    match self.inner? {
      serde_json::Value::String(s) => Some(s.clone()),
      serde_json::Value::Number(n) => Some(n.to_string()),
      _ => None,
    }
  }

  pub fn value(&self) -> Option<&'a serde_json::Value> {
    self.inner
  }
}

/// Fetch nested values via dotted paths like `pipeline.provider.settings.repository`.
///
/// Keys containing dots cannot be addressed; use `serde_json::Value::get` for those.
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for serde_json::Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      match cur.get(key) {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
