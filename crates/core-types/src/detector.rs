use serde::Deserialize;
use toml::Value;

/// Selects a signal detector by name together with its raw parameters.
#[derive(Deserialize, Debug, Clone)]
pub struct DetectorConfig {
    pub name: String,
    // This will hold the `params = { ... }` table from the TOML
    #[serde(default = "default_params")]
    pub params: Value,
}

fn default_params() -> Value {
    Value::Table(Default::default())
}
