//! Crate version reporting

/// Version string baked in at compile time.
pub fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
