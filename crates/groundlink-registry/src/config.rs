/// Limits applied when loading a catalog from outside the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Maximum bytes read from a catalog file.
    pub max_catalog_size: usize,
    /// Maximum number of variables. Tags are `int32` on the wire.
    pub max_variables: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_catalog_size: 256 * 1024,
            max_variables: 4096,
        }
    }
}
