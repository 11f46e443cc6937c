//! Transparent memoization over the expiring cache.
//!
//! A [`Memoizer`] wraps a function and a fixed time-to-live. Calling it
//! derives a key from the arguments, returns the cached result on a hit, and
//! otherwise calls through and caches what the function returned.
//!
//! The cache is passed in on every call rather than held by the memoizer, so
//! one cache owned by the application context serves every memoized function.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use atlas_core::error::Result;
use atlas_core::traits::KeyValueStore;

use crate::ExpiringCache;

/// Prefix of every memoization key in the store.
const KEY_PREFIX: &str = "memo";

/// Derives the cache key for a call to the function named `namespace`.
///
/// The arguments are converted to JSON, every object is re-emitted with its
/// keys sorted, and the result is appended to the namespace. JSON keeps
/// `1`, `1.0` and `"1"` apart, so structurally equal arguments always give
/// equal keys and differently-typed ones never collide.
pub fn memo_key<A: Serialize + ?Sized>(namespace: &str, args: &A) -> Result<Vec<u8>> {
    let canonical = canonicalize(serde_json::to_value(args)?);
    let mut key = format!("{}:{}:", KEY_PREFIX, namespace).into_bytes();
    key.extend(serde_json::to_vec(&canonical)?);
    Ok(key)
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        other => other,
    }
}

/// Positional and keyword arguments of one call.
///
/// Keyword arguments are kept sorted by name, so the order they were added in
/// does not affect the memoization key.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CallArgs {
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self> {
        self.args.push(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Sets a keyword argument.
    pub fn kwarg<T: Serialize + ?Sized>(mut self, name: impl Into<String>, value: &T) -> Result<Self> {
        self.kwargs.insert(name.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Returns the positional arguments.
    pub fn positional(&self) -> &[Value] {
        &self.args
    }

    /// Returns a keyword argument by name.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        self.kwargs.get(name)
    }
}

/// Caches a function's results for a fixed time-to-live.
///
/// Only successful results are cached; an error from the wrapped function is
/// returned unchanged and leaves the cache untouched. Cache failures never fail
/// a call: they are logged and the function is called through.
///
/// Concurrent calls with equal arguments are not deduplicated; each computes
/// and the last write wins.
pub struct Memoizer<F> {
    namespace: String,
    ttl: Duration,
    bypass: bool,
    function: F,
}

impl<F> Memoizer<F> {
    /// Wraps `function`, caching results under `namespace` for `ttl`.
    pub fn new(namespace: impl Into<String>, ttl: Duration, function: F) -> Self {
        Self {
            namespace: namespace.into(),
            ttl,
            bypass: false,
            function,
        }
    }

    /// When `bypass` is set, every call goes straight to the function and
    /// nothing is read from or written to the cache.
    pub fn bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    /// Returns the namespace results are cached under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the time-to-live of cached results.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Calls the wrapped function through the cache.
    pub fn call<S, A, T, E>(&self, cache: &mut ExpiringCache<S>, args: &A) -> std::result::Result<T, E>
    where
        S: KeyValueStore,
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: Fn(&A) -> std::result::Result<T, E>,
    {
        if self.bypass {
            return (self.function)(args);
        }

        let key = match memo_key(&self.namespace, args) {
            Ok(key) => key,
            Err(err) => {
                warn!(namespace = %self.namespace, error = %err, "Arguments not serializable, calling through");
                return (self.function)(args);
            }
        };

        match cache.get::<T>(&key) {
            Ok(Some(value)) => {
                debug!(namespace = %self.namespace, "Memoized result hit");
                return Ok(value);
            }
            Ok(None) => debug!(namespace = %self.namespace, "Memoized result miss"),
            Err(err) => warn!(namespace = %self.namespace, error = %err, "Cache lookup failed"),
        }

        let value = (self.function)(args)?;

        if let Err(err) = cache.set(&key, &value, Some(self.ttl)) {
            warn!(namespace = %self.namespace, error = %err, "Failed to cache result");
        }

        Ok(value)
    }
}
