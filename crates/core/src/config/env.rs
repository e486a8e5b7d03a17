//! Two-tier environment: public variables may reach client code, everything
//! else stays on the server.

use std::collections::BTreeMap;

use serde::Serialize;

/// Private values shorter than this are not searched for in client payloads.
pub const MIN_SECRET_LEN: usize = 8;

/// Environment variables split by the configured public prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVars {
    public: BTreeMap<String, String>,
    private: BTreeMap<String, String>,
}

/// The public tier, the only part ever serialized into client markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClientEnv(BTreeMap<String, String>);

impl ClientEnv {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl EnvVars {
    pub fn partition<I>(public_prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut env = Self::default();
        for (name, value) in vars {
            if !public_prefix.is_empty() && name.starts_with(public_prefix) {
                env.public.insert(name, value);
            } else {
                env.private.insert(name, value);
            }
        }
        env
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.public
            .get(name)
            .or_else(|| self.private.get(name))
            .map(String::as_str)
    }

    pub fn is_public(&self, name: &str) -> bool {
        self.public.contains_key(name)
    }

    pub fn public(&self) -> &BTreeMap<String, String> {
        &self.public
    }

    pub fn private_names(&self) -> impl Iterator<Item = &str> {
        self.private.keys().map(String::as_str)
    }

    pub fn client(&self) -> ClientEnv {
        ClientEnv(self.public.clone())
    }

    /// Every variable, for templates that run on the server.
    pub fn server_view(&self) -> BTreeMap<&str, &str> {
        self.public
            .iter()
            .chain(self.private.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }

    /// Name of a private variable whose value appears in `serialized`.
    ///
    /// The value is searched both raw and JSON-escaped. Values shorter than
    /// [`MIN_SECRET_LEN`] are skipped, as are values also held by a public
    /// variable.
    pub fn find_private_leak(&self, serialized: &str) -> Option<&str> {
        self.private.iter().find_map(|(name, value)| {
            if value.len() < MIN_SECRET_LEN || self.public.values().any(|p| p == value) {
                return None;
            }
            let escaped = serde_json::to_string(value).unwrap_or_default();
            let escaped = escaped.trim_matches('"');
            (serialized.contains(value.as_str()) || serialized.contains(escaped))
                .then_some(name.as_str())
        })
    }
}
