use crate::catalog::REGISTRY_SCHEMA_VERSION;

pub struct CacheKeys;

impl CacheKeys {
    /// Assembled registry: llm-registry:registry:v{schema_version}
    ///
    /// The schema version is part of the key so a persisted registry written
    /// by an incompatible build is never read back.
    pub fn registry() -> String {
        format!("llm-registry:registry:v{}", REGISTRY_SCHEMA_VERSION)
    }
}
