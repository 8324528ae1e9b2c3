//! Companion feed-card asset plumbing.
//!
//! The card itself is a JS module served by the host at a fixed path; this
//! module computes its cache-busting URL from a content hash and registers
//! it with the host exactly once per process.
//!
//! Host differences are negotiated by capability rather than by parsing
//! host version strings: the [`ResourceHost`] adapter reports which
//! registration features it actually has, and [`CardRegistrar`] picks the
//! matching behavior.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use md5::{Digest, Md5};
use tracing::{debug, error};

/// Fixed URL path the host serves the card from
pub const FRONTEND_SCRIPT_URL: &str = "/vibbo/vibbo-feed-card.js";

/// Number of hash hex chars used in the cache-busting query parameter
const HASH_QUERY_LEN: usize = 8;

/// Build the card URL with a content-hash query param for cache busting.
///
/// An unreadable asset hashes as `0` so the URL stays well-formed.
pub fn card_url(card_path: &Path) -> String {
    let hash = match std::fs::read(card_path) {
        Ok(bytes) => {
            let mut hasher = Md5::new();
            hasher.update(&bytes);
            let digest = format!("{:x}", hasher.finalize());
            digest[..HASH_QUERY_LEN].to_string()
        }
        Err(_) => "0".to_string(),
    };
    format!("{}?{}", FRONTEND_SCRIPT_URL, hash)
}

/// A script resource entry in the host's managed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub id: String,
    pub url: String,
}

/// Capability surface of the hosting platform's resource registry.
///
/// Implementations report what they can actually do; behavior is selected
/// from the answers, never from a host version number.
pub trait ResourceHost {
    /// Whether the host manages script resources in a mutable collection.
    fn has_resource_collection(&self) -> bool;

    /// Whether the managed collection has finished loading. Only meaningful
    /// when `has_resource_collection` is true.
    fn resources_loaded(&self) -> bool;

    /// Current entries of the managed collection.
    fn resources(&self) -> Vec<ResourceEntry>;

    /// Add a new script resource.
    fn create_resource(&mut self, url: &str);

    /// Replace the URL of an existing resource.
    fn update_resource(&mut self, id: &str, url: &str);

    /// Fallback hook: inject the script without a managed collection.
    fn add_extra_js(&mut self, url: &str);
}

/// What a registration attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new resource entry was created.
    Created,
    /// An existing entry was updated to the current content hash.
    Updated,
    /// An entry with the current hash was already present.
    Unchanged,
    /// The host has no managed collection; the extra-JS fallback was used.
    ExtraJs,
    /// This process already registered the card.
    AlreadyRegistered,
    /// The managed collection exists but has not loaded yet; retry later.
    Deferred,
    /// The card asset is missing on disk; nothing was registered.
    MissingAsset,
}

/// Once-per-process card registration state.
///
/// Registration is idempotent: the first successful call records the
/// registered URL, later calls observe it and do nothing. `Deferred` and
/// `MissingAsset` outcomes record nothing, so the host may retry.
pub struct CardRegistrar {
    card_path: PathBuf,
    registered: OnceLock<String>,
}

impl CardRegistrar {
    pub fn new(card_path: PathBuf) -> Self {
        Self {
            card_path,
            registered: OnceLock::new(),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered.get().is_some()
    }

    /// Register the card with the host, negotiating by capability.
    pub fn register(&self, host: &mut dyn ResourceHost) -> Registration {
        if self.is_registered() {
            return Registration::AlreadyRegistered;
        }

        if !self.card_path.is_file() {
            error!(path = %self.card_path.display(), "Feed card JS not found, card will not be available");
            return Registration::MissingAsset;
        }

        let url = card_url(&self.card_path);

        if !host.has_resource_collection() {
            debug!("No managed resource collection, falling back to extra JS");
            host.add_extra_js(FRONTEND_SCRIPT_URL);
            let _ = self.registered.set(FRONTEND_SCRIPT_URL.to_string());
            return Registration::ExtraJs;
        }

        if !host.resources_loaded() {
            debug!("Resource collection not loaded yet, deferring registration");
            return Registration::Deferred;
        }

        // Compare entries by path, ignoring the hash query string.
        for entry in host.resources() {
            if entry.url.split('?').next() == Some(FRONTEND_SCRIPT_URL) {
                if entry.url == url {
                    debug!(url = %url, "Card already registered with current hash");
                    let _ = self.registered.set(url);
                    return Registration::Unchanged;
                }
                debug!(old = %entry.url, new = %url, "Updating card resource");
                host.update_resource(&entry.id, &url);
                let _ = self.registered.set(url);
                return Registration::Updated;
            }
        }

        debug!(url = %url, "Registering card resource");
        host.create_resource(&url);
        let _ = self.registered.set(url);
        Registration::Created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Default)]
    struct FakeHost {
        managed: bool,
        loaded: bool,
        entries: Vec<ResourceEntry>,
        extra_js: Vec<String>,
        created: Vec<String>,
        updated: Vec<(String, String)>,
    }

    impl ResourceHost for FakeHost {
        fn has_resource_collection(&self) -> bool {
            self.managed
        }

        fn resources_loaded(&self) -> bool {
            self.loaded
        }

        fn resources(&self) -> Vec<ResourceEntry> {
            self.entries.clone()
        }

        fn create_resource(&mut self, url: &str) {
            self.created.push(url.to_string());
            self.entries.push(ResourceEntry {
                id: format!("res-{}", self.entries.len()),
                url: url.to_string(),
            });
        }

        fn update_resource(&mut self, id: &str, url: &str) {
            self.updated.push((id.to_string(), url.to_string()));
            if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
                entry.url = url.to_string();
            }
        }

        fn add_extra_js(&mut self, url: &str) {
            self.extra_js.push(url.to_string());
        }
    }

    fn write_card(dir: &std::path::Path, contents: &[u8]) -> PathBuf {
        let path = dir.join("vibbo-feed-card.js");
        let mut file = std::fs::File::create(&path).expect("create card file");
        file.write_all(contents).expect("write card file");
        path
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vibbo-feed-test-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn test_card_url_stable_and_content_sensitive() {
        let dir = temp_dir("hash");
        let path = write_card(&dir, b"customElements.define('vibbo-feed-card', C);");

        let first = card_url(&path);
        let second = card_url(&path);
        assert_eq!(first, second);
        assert!(first.starts_with("/vibbo/vibbo-feed-card.js?"));

        let query = first.split('?').nth(1).expect("query present");
        assert_eq!(query.len(), 8);
        assert!(query.chars().all(|c| c.is_ascii_hexdigit()));

        let path = write_card(&dir, b"changed contents");
        assert_ne!(card_url(&path), first);
    }

    #[test]
    fn test_card_url_missing_file_hashes_as_zero() {
        let url = card_url(Path::new("/nonexistent/card.js"));
        assert_eq!(url, "/vibbo/vibbo-feed-card.js?0");
    }

    #[test]
    fn test_register_creates_then_short_circuits() {
        let dir = temp_dir("create");
        let path = write_card(&dir, b"card v1");
        let registrar = CardRegistrar::new(path);

        let mut host = FakeHost {
            managed: true,
            loaded: true,
            ..Default::default()
        };

        assert_eq!(registrar.register(&mut host), Registration::Created);
        assert!(registrar.is_registered());
        assert_eq!(host.created.len(), 1);

        // Second call in the same process touches nothing.
        assert_eq!(
            registrar.register(&mut host),
            Registration::AlreadyRegistered
        );
        assert_eq!(host.created.len(), 1);
    }

    #[test]
    fn test_register_updates_stale_entry_in_place() {
        let dir = temp_dir("update");
        let path = write_card(&dir, b"card v2");
        let registrar = CardRegistrar::new(path.clone());

        let mut host = FakeHost {
            managed: true,
            loaded: true,
            entries: vec![ResourceEntry {
                id: "res-0".to_string(),
                url: "/vibbo/vibbo-feed-card.js?deadbeef".to_string(),
            }],
            ..Default::default()
        };

        assert_eq!(registrar.register(&mut host), Registration::Updated);
        assert_eq!(host.updated.len(), 1);
        assert_eq!(host.updated[0].0, "res-0");
        assert_eq!(host.updated[0].1, card_url(&path));
        assert!(host.created.is_empty());
    }

    #[test]
    fn test_register_leaves_current_entry_alone() {
        let dir = temp_dir("unchanged");
        let path = write_card(&dir, b"card v3");
        let registrar = CardRegistrar::new(path.clone());

        let mut host = FakeHost {
            managed: true,
            loaded: true,
            entries: vec![ResourceEntry {
                id: "res-0".to_string(),
                url: card_url(&path),
            }],
            ..Default::default()
        };

        assert_eq!(registrar.register(&mut host), Registration::Unchanged);
        assert!(host.created.is_empty());
        assert!(host.updated.is_empty());
    }

    #[test]
    fn test_register_defers_until_collection_loaded() {
        let dir = temp_dir("defer");
        let path = write_card(&dir, b"card v4");
        let registrar = CardRegistrar::new(path);

        let mut host = FakeHost {
            managed: true,
            loaded: false,
            ..Default::default()
        };

        assert_eq!(registrar.register(&mut host), Registration::Deferred);
        assert!(!registrar.is_registered());

        // Retry succeeds once the collection reports loaded.
        host.loaded = true;
        assert_eq!(registrar.register(&mut host), Registration::Created);
    }

    #[test]
    fn test_register_falls_back_to_extra_js() {
        let dir = temp_dir("extra");
        let path = write_card(&dir, b"card v5");
        let registrar = CardRegistrar::new(path);

        let mut host = FakeHost::default();
        assert_eq!(registrar.register(&mut host), Registration::ExtraJs);
        assert_eq!(host.extra_js, vec![FRONTEND_SCRIPT_URL.to_string()]);
        assert!(registrar.is_registered());
    }

    #[test]
    fn test_register_missing_asset() {
        let registrar = CardRegistrar::new(PathBuf::from("/nonexistent/card.js"));
        let mut host = FakeHost {
            managed: true,
            loaded: true,
            ..Default::default()
        };
        assert_eq!(registrar.register(&mut host), Registration::MissingAsset);
        assert!(!registrar.is_registered());
    }
}
