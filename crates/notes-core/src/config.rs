//! Tunables consumed by the core components.
//!
//! Every section deserializes with defaults so a partial `config.json` is fine.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default)]
    pub tokens: TokenConfig,

    #[serde(default)]
    pub passwords: PasswordConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token lifetime in seconds. `None` keeps tokens valid for as long as
    /// the identity exists.
    #[serde(default)]
    pub lifetime_secs: Option<u64>,
}

/// Argon2id cost parameters used when hashing new passwords.
///
/// Existing hashes carry their own parameters in the PHC string, so changing
/// these only affects passwords hashed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Match search terms case-sensitively (default: case-insensitive)
    #[serde(default)]
    pub case_sensitive: bool,
}
