use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use log::debug;
use walkdir::WalkDir;

use super::codepoint::{bare_hex_name, normalize_codepoints};
use super::vendor::Vendor;
use crate::CloudError;

/// Source of raw emoji bitmaps keyed by canonical codepoint name and vendor.
pub trait AssetStore {
    fn contains(&self, unicode: &str, vendor: &Vendor) -> bool;
    fn load(&self, unicode: &str, vendor: &Vendor) -> Result<RgbaImage, CloudError>;
}

fn missing(unicode: &str, vendor: &Vendor) -> CloudError {
    CloudError::AssetMissing { unicode: unicode.to_owned(), vendor: vendor.to_string() }
}

/// Store with no assets; only bitmaps attached to items are available.
#[derive(Clone, Copy, Debug, Default)]
pub struct Preloaded;

impl AssetStore for Preloaded {
    fn contains(&self, _unicode: &str, _vendor: &Vendor) -> bool {
        false
    }

    fn load(&self, unicode: &str, vendor: &Vendor) -> Result<RgbaImage, CloudError> {
        Err(missing(unicode, vendor))
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    bitmaps: HashMap<(Vendor, String), RgbaImage>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        unicode: &str,
        vendor: Vendor,
        bitmap: RgbaImage,
    ) -> Result<(), CloudError> {
        let unicode = normalize_codepoints(unicode)?;
        self.bitmaps.insert((vendor, unicode), bitmap);
        Ok(())
    }
}

impl AssetStore for InMemoryStore {
    fn contains(&self, unicode: &str, vendor: &Vendor) -> bool {
        self.bitmaps.contains_key(&(vendor.clone(), unicode.to_owned()))
    }

    fn load(&self, unicode: &str, vendor: &Vendor) -> Result<RgbaImage, CloudError> {
        self.bitmaps
            .get(&(vendor.clone(), unicode.to_owned()))
            .cloned()
            .ok_or_else(|| missing(unicode, vendor))
    }
}

/// PNG files under `<root>/<vendor code>/`, named either `U+1F602.png` or
/// `1f602.png`.
#[derive(Clone, Debug)]
pub struct VendorDirectory {
    root: PathBuf,
}

impl VendorDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vendor_dir(&self, vendor: &Vendor) -> PathBuf {
        self.root.join(vendor.code())
    }

    /// First existing file for the emoji, if any.
    pub fn path_for(&self, unicode: &str, vendor: &Vendor) -> Option<PathBuf> {
        let dir = self.vendor_dir(vendor);
        [format!("{unicode}.png"), format!("{}.png", bare_hex_name(unicode))]
            .into_iter()
            .map(|file| dir.join(file))
            .find(|path| path.is_file())
    }

    /// Canonical names of every emoji available for `vendor`, sorted. Fails
    /// when the vendor directory cannot be read.
    pub fn list(&self, vendor: &Vendor) -> Result<Vec<String>, CloudError> {
        let mut names = Vec::new();
        for entry in WalkDir::new(self.vendor_dir(vendor)).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || !path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => match normalize_codepoints(stem) {
                    Ok(name) => names.push(name),
                    Err(_) => debug!("ignoring {}", path.display()),
                },
                None => debug!("ignoring {}", path.display()),
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Vendors that have a directory under the root.
    pub fn vendors(&self) -> Result<Vec<Vendor>, CloudError> {
        let mut vendors = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Some(vendor) =
                entry.file_name().to_str().and_then(|name| name.parse::<Vendor>().ok())
            {
                vendors.push(vendor);
            }
        }
        vendors.sort_by(|a, b| a.code().cmp(b.code()));
        Ok(vendors)
    }
}

impl AssetStore for VendorDirectory {
    fn contains(&self, unicode: &str, vendor: &Vendor) -> bool {
        self.path_for(unicode, vendor).is_some()
    }

    fn load(&self, unicode: &str, vendor: &Vendor) -> Result<RgbaImage, CloudError> {
        let path = self.path_for(unicode, vendor).ok_or_else(|| missing(unicode, vendor))?;
        debug!("loading {}", path.display());
        let bytes = fs::read(&path)?;
        Ok(image::load_from_memory(&bytes)?.into_rgba8())
    }
}
