//! Keep certificate bundles in a key/value store in step with a directory of PEM files.
//!
//! Every `<name>.crt` that has a matching `<name>.key` becomes one bundle, the certificate
//! followed by the key, stored under `<kv base>/<name>.pem`.
mod bundle;
pub use bundle::{BundleSet, find_certificates};

mod error;
pub use error::{CertError, CertResult};

mod kv;
pub use kv::{KvClient, SyncReport, sync_bundles};
