use std::sync::OnceLock;

use image::RgbaImage;

use super::assets::AssetStore;
use super::codepoint::normalize_codepoints;
use super::vendor::Vendor;
use crate::CloudError;

/// One weighted emoji to place. Identity and weight never change after
/// construction; the bitmap is loaded at most once and then cached.
#[derive(Clone, Debug)]
pub struct EmojiItem {
    unicode: String,
    weight: f64,
    vendor: Vendor,
    bitmap: OnceLock<RgbaImage>,
}

impl EmojiItem {
    pub fn new(unicode: &str, weight: f64, vendor: Vendor) -> Result<Self, CloudError> {
        Ok(Self {
            unicode: normalize_codepoints(unicode)?,
            weight,
            vendor,
            bitmap: OnceLock::new(),
        })
    }

    /// Attaches a bitmap up front, bypassing any asset store. Replaces a
    /// bitmap that was already cached.
    pub fn with_bitmap(mut self, bitmap: RgbaImage) -> Self {
        self.bitmap = OnceLock::from(bitmap);
        self
    }

    /// Builds items sharing one vendor from `(unicode, weight)` pairs.
    pub fn from_single_vendor<S: AsRef<str>>(
        pairs: impl IntoIterator<Item = (S, f64)>,
        vendor: &Vendor,
    ) -> Result<Vec<Self>, CloudError> {
        pairs
            .into_iter()
            .map(|(unicode, weight)| Self::new(unicode.as_ref(), weight, vendor.clone()))
            .collect()
    }

    /// Builds items from `(unicode, weight, vendor)` entries, each with its own
    /// vendor, and drops those `store` has no bitmap for.
    pub fn from_entries<S: AsRef<str>>(
        entries: impl IntoIterator<Item = (S, f64, Vendor)>,
        store: &dyn AssetStore,
    ) -> Result<Vec<Self>, CloudError> {
        let items = entries
            .into_iter()
            .map(|(unicode, weight, vendor)| Self::new(unicode.as_ref(), weight, vendor))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::filter_existing(items, store))
    }

    /// Keeps the items `store` has a bitmap for, or that already carry one.
    pub fn filter_existing(items: Vec<Self>, store: &dyn AssetStore) -> Vec<Self> {
        items.into_iter().filter(|item| item.exists(store)).collect()
    }

    pub fn unicode(&self) -> &str {
        &self.unicode
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn vendor(&self) -> &Vendor {
        &self.vendor
    }

    pub fn exists(&self, store: &dyn AssetStore) -> bool {
        self.bitmap.get().is_some() || store.contains(&self.unicode, &self.vendor)
    }

    /// Cached bitmap, if it was attached or loaded already.
    pub fn bitmap(&self) -> Option<&RgbaImage> {
        self.bitmap.get()
    }

    pub fn load_bitmap(&self, store: &dyn AssetStore) -> Result<&RgbaImage, CloudError> {
        if let Some(bitmap) = self.bitmap.get() {
            return Ok(bitmap);
        }
        let loaded = store.load(&self.unicode, &self.vendor)?;
        Ok(self.bitmap.get_or_init(|| loaded))
    }

    pub fn validate_weight(&self) -> Result<(), CloudError> {
        if self.weight.is_finite() && self.weight >= 0.0 {
            Ok(())
        } else {
            Err(CloudError::InvalidWeight { unicode: self.unicode.clone(), weight: self.weight })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use image::Rgba;

    use super::*;

    struct CountingStore {
        loads: Cell<usize>,
    }

    impl AssetStore for CountingStore {
        fn contains(&self, _unicode: &str, _vendor: &Vendor) -> bool {
            true
        }

        fn load(&self, _unicode: &str, _vendor: &Vendor) -> Result<RgbaImage, CloudError> {
            self.loads.set(self.loads.get() + 1);
            Ok(RgbaImage::from_pixel(2, 2, Rgba([1, 1, 1, 255])))
        }
    }

    #[test]
    fn bitmap_is_loaded_once() {
        let store = CountingStore { loads: Cell::new(0) };
        let item = EmojiItem::new("1f602", 1.0, Vendor::Twitter).unwrap();

        item.load_bitmap(&store).unwrap();
        item.load_bitmap(&store).unwrap();

        assert_eq!(store.loads.get(), 1);
        assert!(item.bitmap().is_some());
    }

    #[test]
    fn identity_is_normalized() {
        let item = EmojiItem::new("😂", 2.5, Vendor::Google).unwrap();
        assert_eq!(item.unicode(), "U+1F602");
        assert_eq!(item.weight(), 2.5);
        assert_eq!(item.vendor(), &Vendor::Google);
    }

    #[test]
    fn negative_and_nan_weights_are_invalid() {
        for weight in [-1.0, f64::NAN, f64::INFINITY] {
            let item = EmojiItem::new("1f602", weight, Vendor::Apple).unwrap();
            assert!(matches!(item.validate_weight(), Err(CloudError::InvalidWeight { .. })));
        }
        assert!(EmojiItem::new("1f602", 0.0, Vendor::Apple).unwrap().validate_weight().is_ok());
    }

    #[test]
    fn attached_bitmap_replaces_cached_one() {
        let store = CountingStore { loads: Cell::new(0) };
        let item = EmojiItem::new("1f602", 1.0, Vendor::Twitter).unwrap();
        item.load_bitmap(&store).unwrap();

        let replaced = item.clone().with_bitmap(RgbaImage::new(5, 3));

        assert_eq!(replaced.bitmap().map(|b| b.dimensions()), Some((5, 3)));
        assert_eq!(item.bitmap().map(|b| b.dimensions()), Some((2, 2)));
    }

    #[test]
    fn entries_keep_their_own_vendor() {
        let mut store = crate::InMemoryStore::new();
        store.insert("1f600", Vendor::Twitter, RgbaImage::new(1, 1)).unwrap();
        store.insert("1f601", Vendor::Google, RgbaImage::new(1, 1)).unwrap();

        let items = EmojiItem::from_entries(
            [
                ("1f600", 1.0, Vendor::Twitter),
                ("1f601", 2.0, Vendor::Google),
                ("1f602", 3.0, Vendor::Google),
            ],
            &store,
        )
        .unwrap();

        let kept: Vec<_> = items.iter().map(|item| (item.unicode(), item.vendor())).collect();
        assert_eq!(kept, vec![("U+1F600", &Vendor::Twitter), ("U+1F601", &Vendor::Google)]);
    }

    #[test]
    fn entries_reject_malformed_codepoints() {
        let err = EmojiItem::from_entries([("", 1.0, Vendor::Apple)], &crate::Preloaded);
        assert!(matches!(err, Err(CloudError::InvalidCodepoint(_))));
    }

    #[test]
    fn filter_existing_keeps_attached_bitmaps() {
        let items = EmojiItem::from_single_vendor([("1f600", 1.0), ("1f601", 2.0)], &Vendor::Apple)
            .unwrap();
        let mut items = items.into_iter();
        let attached = items.next().unwrap().with_bitmap(RgbaImage::new(1, 1));
        let bare = items.next().unwrap();

        let kept = EmojiItem::filter_existing(vec![attached, bare], &crate::Preloaded);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].unicode(), "U+1F600");
    }
}
