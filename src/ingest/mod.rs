/// Data source clients.
///
/// Submodules:
/// - `radar`: IMD radar product image transport.

pub mod radar;
