// Content hashes for immutable assets

use crate::mapping::NameMapping;
use serde::Serialize;
use sha2::{Digest, Sha256};
use stasis_scanner::error::Result;
use stasis_scanner::normalize::splice_before_extension;
use stasis_scanner::{Frontier, OutputDir};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Files that never change under a given name once fingerprinted.
pub const IMMUTABLE_EXTENSIONS: [&str; 4] = [".js", ".css", ".png", ".jpg"];

const READ_CHUNK: usize = 128 * 1024;

/// One asset renamed to carry its content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintedAsset {
    pub path: String,
    pub hash: String,
    pub save_path: String,
    pub final_name: String,
}

#[derive(Debug, Clone)]
pub struct FingerprintOutcome {
    pub mapping: NameMapping,
    pub assets: Vec<FingerprintedAsset>,
}

pub fn is_immutable_asset(save_path: &str) -> bool {
    IMMUTABLE_EXTENSIONS.iter().any(|ext| save_path.ends_with(ext))
}

/// Hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Hex SHA-256 of a file, read in chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Rename every stored immutable asset to embed its hash and derive the final
/// name mapping.
///
/// Must only run on a drained frontier: the hash covers the final stored
/// bytes. The frontier itself is left untouched.
pub fn fingerprint_assets(frontier: &Frontier, output: &OutputDir) -> Result<FingerprintOutcome> {
    let mut mapping = NameMapping::from_frontier(frontier);
    let mut assets = Vec::new();
    // Two paths can fold onto the same file; it is hashed and moved once
    let mut hashed: HashMap<String, String> = HashMap::new();

    for (path, stored_name, save_path) in frontier.visited() {
        if !is_immutable_asset(save_path) {
            continue;
        }

        let hash = match hashed.get(save_path) {
            Some(hash) => hash.clone(),
            None => {
                let hash = sha256_file(&output.resolve(save_path)?)?;
                let new_save_path = splice_before_extension(save_path, &hash);
                output.rename(save_path, &new_save_path)?;
                hashed.insert(save_path.to_string(), hash.clone());
                hash
            }
        };

        let final_name = splice_before_extension(stored_name, &hash);
        debug!("Fingerprinted {} -> {}", path, final_name);
        mapping.set_final_name(path, &final_name);
        assets.push(FingerprintedAsset {
            path: path.to_string(),
            save_path: splice_before_extension(save_path, &hash),
            hash,
            final_name,
        });
    }

    info!("Fingerprinted {} assets", assets.len());
    Ok(FingerprintOutcome { mapping, assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
    }

    #[test]
    fn test_hash_is_deterministic_and_content_addressed() {
        let dir = TempDir::new().unwrap();
        let output = OutputDir::new(dir.path());
        output.write_bytes("/a.png", b"same bytes").unwrap();
        output.write_bytes("/b/c.png", b"same bytes").unwrap();
        output.write_bytes("/d.png", b"other bytes").unwrap();

        let a = sha256_file(&output.resolve("/a.png").unwrap()).unwrap();
        let c = sha256_file(&output.resolve("/b/c.png").unwrap()).unwrap();
        let d = sha256_file(&output.resolve("/d.png").unwrap()).unwrap();

        assert_eq!(a, c);
        assert_ne!(a, d);
        assert_eq!(a, sha256_hex(b"same bytes"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_large_file_hashed_in_chunks() {
        let dir = TempDir::new().unwrap();
        let output = OutputDir::new(dir.path());
        let bytes: Vec<u8> = (0..READ_CHUNK * 2 + 17).map(|i| (i % 251) as u8).collect();
        output.write_bytes("/big.jpg", &bytes).unwrap();

        assert_eq!(
            sha256_file(&output.resolve("/big.jpg").unwrap()).unwrap(),
            sha256_hex(&bytes)
        );
    }

    #[test]
    fn test_immutable_extensions() {
        assert!(is_immutable_asset("/wp-includes/js/wp-embed.min.ver_4.9.7.js"));
        assert!(is_immutable_asset("/style.css"));
        assert!(is_immutable_asset("/logo.png"));
        assert!(is_immutable_asset("/photo.jpg"));
        assert!(!is_immutable_asset("/photo.jpeg"));
        assert!(!is_immutable_asset("/data.json"));
        assert!(!is_immutable_asset("/index.html"));
        assert!(!is_immutable_asset("/feed.xml"));
    }

    #[test]
    fn test_fingerprint_renames_assets_only() {
        let dir = TempDir::new().unwrap();
        let output = OutputDir::new(dir.path());

        let mut frontier = Frontier::seeded();
        frontier.push_all(["/style.css?ver=2", "/logo.png"]);
        for (path, stored, save, body) in [
            ("/", "/", "/index.html", "<html></html>"),
            ("/style.css?ver=2", "/style.ver_2.css", "/style.ver_2.css", "body{}"),
            ("/logo.png", "/logo.png", "/logo.png", "PNG"),
        ] {
            output.write_text(save, body).unwrap();
            frontier.mark_visited(path, stored.to_string(), save.to_string()).unwrap();
        }

        let outcome = fingerprint_assets(&frontier, &output).unwrap();
        let css_hash = sha256_hex(b"body{}");
        let png_hash = sha256_hex(b"PNG");

        assert_eq!(outcome.assets.len(), 2);
        assert_eq!(outcome.mapping.final_name("/"), Some("/"));
        assert_eq!(
            outcome.mapping.final_name("/style.css?ver=2"),
            Some(format!("/style.ver_2.{}.css", css_hash).as_str())
        );
        assert_eq!(
            outcome.mapping.final_name("/logo.png"),
            Some(format!("/logo.{}.png", png_hash).as_str())
        );

        assert!(dir.path().join("index.html").exists());
        assert!(!dir.path().join("style.ver_2.css").exists());
        assert!(dir.path().join(format!("style.ver_2.{}.css", css_hash)).exists());
        assert!(dir.path().join(format!("logo.{}.png", png_hash)).exists());

        // The frontier still records the pre-fingerprint names
        assert!(frontier.visited().any(|(_, stored, _)| stored == "/logo.png"));
    }

    #[test]
    fn test_paths_sharing_a_file_are_moved_once() {
        let dir = TempDir::new().unwrap();
        let output = OutputDir::new(dir.path());

        let mut frontier = Frontier::seeded();
        frontier.push_all(["/a.js?ver=1", "/a.ver_1.js"]);
        output.write_text("/index.html", "").unwrap();
        output.write_text("/a.ver_1.js", "x").unwrap();
        frontier.mark_visited("/", "/".to_string(), "/index.html".to_string()).unwrap();
        for path in ["/a.js?ver=1", "/a.ver_1.js"] {
            frontier
                .mark_visited(path, "/a.ver_1.js".to_string(), "/a.ver_1.js".to_string())
                .unwrap();
        }

        let outcome = fingerprint_assets(&frontier, &output).unwrap();
        let hash = sha256_hex(b"x");

        assert_eq!(outcome.assets.len(), 2);
        assert_eq!(
            outcome.mapping.final_name("/a.js?ver=1"),
            outcome.mapping.final_name("/a.ver_1.js")
        );
        assert!(dir.path().join(format!("a.ver_1.{}.js", hash)).exists());
    }
}
