use serde::{Deserialize, Serialize};

/// Configuration for the users_info module (`modules.users_info`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersInfoConfig {
    /// JSON file holding the whole user collection.
    #[serde(default = "default_data_file")]
    pub data_file: String,
    /// Seed an empty collection at startup when the file is absent.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

impl Default for UsersInfoConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            create_if_missing: default_create_if_missing(),
        }
    }
}

fn default_data_file() -> String {
    "data/users.json".to_string()
}

fn default_create_if_missing() -> bool {
    true
}
