use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::event::NotifySet;

/// Specification of a single child-process execution.
///
/// `program` is argv[0]; it is resolved to an absolute executable path at
/// launch time. The environment overrides are merged onto the ambient
/// environment, override wins on key collision. An absent timeout means the
/// execution is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into, strip_option))]
#[serde(rename_all = "camelCase")]
pub struct CommandSpec {
    /// Program to execute (argv[0]).
    pub program: String,

    /// Trailing arguments (argv[1..]).
    #[builder(default)]
    #[builder(setter(custom))]
    #[serde(default)]
    pub args: Vec<String>,

    /// Environment overrides merged over the ambient environment.
    #[builder(default)]
    #[builder(setter(custom))]
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// Working directory for the child (default: caller's current directory).
    #[builder(default)]
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// Wall-clock deadline in milliseconds (absent = unbounded).
    #[builder(default)]
    #[builder(setter(custom))]
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Streams for which the caller wants real-time notifications.
    ///
    /// Subscription only gates callback dispatch; stdout/stderr are always
    /// recorded in full regardless of this set.
    #[builder(default)]
    #[serde(default)]
    pub notify: NotifySet,
}

impl CommandSpec {
    pub fn builder() -> CommandSpecBuilder {
        CommandSpecBuilder::default()
    }

    /// Get the configured deadline as a Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl CommandSpecBuilder {
    pub fn args<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let args: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.args = Some(args);
        self
    }

    pub fn env<T: ToString>(&mut self, key: T, value: T) -> &mut Self {
        let map = self.env.get_or_insert_with(HashMap::new);
        map.insert(key.to_string(), value.to_string());
        self
    }

    pub fn env_multi<T: ToString, I: IntoIterator<Item = (T, T)>>(&mut self, iter: I) -> &mut Self {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (key, value) in iter {
            env.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout_ms = Some(Some(timeout.as_millis() as u64));
        self
    }
}
