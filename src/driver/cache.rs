use crate::surface::WindowHandle;

#[derive(Debug, Clone)]
struct Entry<T> {
    window: WindowHandle,
    refs: T,
}

/// Window-stamped cache of resolved control references
///
/// The whole bundle is valid for exactly one main window. Looking it up for
/// any other handle misses, so a restarted target can never be driven
/// through references into its previous window. The generation counts
/// resolutions over the driver's life; it shows up in logs to tell a
/// re-resolution storm from a single restart.
#[derive(Debug, Clone)]
pub(crate) struct RefCache<T> {
    entry: Option<Entry<T>>,
    generation: u64,
}

impl<T> Default for RefCache<T> {
    fn default() -> Self {
        RefCache {
            entry: None,
            generation: 0,
        }
    }
}

impl<T> RefCache<T> {
    /// References for `window`, if they were resolved for that window
    pub fn get_for(&self, window: WindowHandle) -> Option<&T> {
        self.entry
            .as_ref()
            .filter(|e| e.window == window)
            .map(|e| &e.refs)
    }

    /// Store freshly resolved references, dropping any previous bundle;
    /// returns the new generation
    pub fn replace(&mut self, window: WindowHandle, refs: T) -> u64 {
        self.generation += 1;
        self.entry = Some(Entry { window, refs });
        self.generation
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_window_stamped() {
        let mut cache = RefCache::default();
        assert_eq!(cache.get_for(WindowHandle(1)), None);

        cache.replace(WindowHandle(1), "refs");
        assert_eq!(cache.get_for(WindowHandle(1)), Some(&"refs"));
        assert_eq!(cache.get_for(WindowHandle(2)), None);
    }

    #[test]
    fn test_generation_survives_clear() {
        let mut cache = RefCache::default();
        assert_eq!(cache.replace(WindowHandle(1), 1), 1);
        assert_eq!(cache.replace(WindowHandle(2), 2), 2);
        assert_eq!(cache.get_for(WindowHandle(1)), None);

        cache.clear();
        assert_eq!(cache.get_for(WindowHandle(2)), None);
        assert_eq!(cache.replace(WindowHandle(1), 3), 3);
    }
}
