use std::{collections::BTreeMap, fs, path::Path};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CertError, CertResult};

const CERT_EXT: &str = ".crt";
const KEY_EXT: &str = ".key";
const ISSUER_SUFFIX: &str = ".issuer.crt";

/// Bundle name (file stem) to PEM content: certificate then key.
pub type BundleSet = BTreeMap<String, String>;

/// Collect certificate bundles below `dir`, recursively.
///
/// Files are paired by file name only, so a pair may be split across subdirectories; when a
/// name occurs twice the later file in walk order wins. `*.issuer.crt` files are ignored.
/// Unreadable entries are logged and skipped.
pub fn find_certificates(dir: &Path) -> CertResult<BundleSet> {
    if !dir.is_dir() {
        return Err(CertError::NotADirectory(dir.to_path_buf()));
    }

    let mut files = BTreeMap::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if name.ends_with(ISSUER_SUFFIX) || !(name.ends_with(CERT_EXT) || name.ends_with(KEY_EXT)) {
            continue;
        }

        match fs::read_to_string(entry.path()) {
            Ok(content) => {
                files.insert(name.to_string(), content);
            }
            Err(e) => warn!(path = %entry.path().display(), error = %e, "cannot read file"),
        }
    }

    let mut bundles = BundleSet::new();
    for (name, cert) in &files {
        let Some(stem) = name.strip_suffix(CERT_EXT) else {
            continue;
        };
        match files.get(&format!("{stem}{KEY_EXT}")) {
            Some(key) if !key.is_empty() => {
                bundles.insert(stem.to_string(), format!("{cert}{key}"));
            }
            _ => debug!(cert = %name, "no matching key"),
        }
    }
    Ok(bundles)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn pairs_certificates_with_keys() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "example.com.crt", "CERT\n");
        write(tmp.path(), "example.com.key", "KEY\n");
        write(tmp.path(), "example.com.issuer.crt", "ISSUER\n");
        write(tmp.path(), "lonely.crt", "CERT\n");
        write(tmp.path(), "notes.txt", "hello");

        let bundles = find_certificates(tmp.path()).unwrap();

        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles["example.com"], "CERT\nKEY\n");
    }

    #[test]
    fn walks_subdirectories_and_pairs_by_name() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a/api.crt", "A-CERT\n");
        write(tmp.path(), "b/api.key", "A-KEY\n");
        write(tmp.path(), "deep/er/www.crt", "W-CERT\n");
        write(tmp.path(), "deep/er/www.key", "W-KEY\n");

        let bundles = find_certificates(tmp.path()).unwrap();

        assert_eq!(bundles.len(), 2);
        assert_eq!(bundles["api"], "A-CERT\nA-KEY\n");
        assert_eq!(bundles["www"], "W-CERT\nW-KEY\n");
    }

    #[test]
    fn empty_key_is_not_paired() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "x.crt", "CERT\n");
        write(tmp.path(), "x.key", "");

        assert!(find_certificates(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");

        assert!(matches!(
            find_certificates(&missing),
            Err(CertError::NotADirectory(_))
        ));
    }
}
