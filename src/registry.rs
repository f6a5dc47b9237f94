//! Cached, selectable lists of remote resource names (notebooks, logs).

/// Items, the operator's selection, and whether a load is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryState<T> {
    items: Vec<T>,
    selected: Option<T>,
    // Loads may overlap; `loading` stays true until the last one settles.
    in_flight: usize,
}

impl<T> Default for RegistryState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected: None,
            in_flight: 0,
        }
    }
}

impl<T: Clone + PartialEq> RegistryState<T> {
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn selected(&self) -> Option<&T> {
        self.selected.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn begin_load(&mut self) {
        self.in_flight += 1;
    }

    /// Mark one load as settled, successful or not.
    pub fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Replace the items with a freshly loaded list. Duplicates are dropped,
    /// keeping first occurrence. An empty selection defaults to the first item;
    /// an existing one is kept even if the new list no longer contains it.
    pub fn replace(&mut self, loaded: Vec<T>) {
        let mut items: Vec<T> = Vec::with_capacity(loaded.len());
        for item in loaded {
            if !items.contains(&item) {
                items.push(item);
            }
        }
        if self.selected.is_none() {
            self.selected = items.first().cloned();
        }
        self.items = items;
    }

    /// No membership check: the list is operator-visible.
    pub fn select(&mut self, item: Option<T>) {
        self.selected = item;
    }

    /// True when something is selected that the latest list does not contain.
    pub fn selection_is_stale(&self) -> bool {
        self.selected
            .as_ref()
            .map(|s| !self.items.contains(s))
            .unwrap_or(false)
    }

    /// The item `step` places away from the selection, wrapping around.
    /// With no (or a stale) selection this is the first item.
    pub fn neighbor(&self, step: isize) -> Option<&T> {
        if self.items.is_empty() {
            return None;
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|s| self.items.iter().position(|i| i == s));
        let Some(idx) = current else {
            return self.items.first();
        };
        let len = self.items.len() as isize;
        let next = (idx as isize + step).rem_euclid(len) as usize;
        self.items.get(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn first_load_selects_first_item() {
        let mut reg = RegistryState::<String>::default();
        reg.begin_load();
        assert!(reg.loading());
        reg.replace(names(&["a.ipynb", "b.ipynb"]));
        reg.settle();
        assert!(!reg.loading());
        assert_eq!(reg.items(), names(&["a.ipynb", "b.ipynb"]).as_slice());
        assert_eq!(reg.selected().map(String::as_str), Some("a.ipynb"));
    }

    #[test]
    fn reload_keeps_operator_selection() {
        let mut reg = RegistryState::<String>::default();
        reg.replace(names(&["a", "b"]));
        reg.select(Some("b".into()));
        reg.replace(names(&["c", "a", "b"]));
        assert_eq!(reg.selected().map(String::as_str), Some("b"));
        assert!(!reg.selection_is_stale());
    }

    #[test]
    fn vanished_selection_is_kept_but_stale() {
        let mut reg = RegistryState::<String>::default();
        reg.replace(names(&["a", "b"]));
        reg.select(Some("b".into()));
        reg.replace(names(&["c"]));
        assert_eq!(reg.selected().map(String::as_str), Some("b"));
        assert!(reg.selection_is_stale());

        // Clearing the selection lets the next load pick its default.
        reg.select(None);
        reg.replace(names(&["c", "d"]));
        assert_eq!(reg.selected().map(String::as_str), Some("c"));
    }

    #[test]
    fn empty_load_leaves_selection_empty() {
        let mut reg = RegistryState::<String>::default();
        reg.replace(Vec::new());
        assert!(reg.selected().is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn duplicates_are_dropped_in_order() {
        let mut reg = RegistryState::<String>::default();
        reg.replace(names(&["x", "y", "x", "z", "y"]));
        assert_eq!(reg.items(), names(&["x", "y", "z"]).as_slice());
    }

    #[test]
    fn overlapping_loads_keep_loading_until_last_settles() {
        let mut reg = RegistryState::<String>::default();
        reg.begin_load();
        reg.begin_load();
        reg.settle();
        assert!(reg.loading());
        reg.settle();
        reg.settle();
        assert!(!reg.loading());
    }

    #[test]
    fn neighbor_wraps_both_ways() {
        let mut reg = RegistryState::<String>::default();
        reg.replace(names(&["a", "b", "c"]));
        assert_eq!(reg.neighbor(1).map(String::as_str), Some("b"));
        assert_eq!(reg.neighbor(-1).map(String::as_str), Some("c"));
        reg.select(Some("c".into()));
        assert_eq!(reg.neighbor(1).map(String::as_str), Some("a"));
        reg.select(Some("gone".into()));
        assert_eq!(reg.neighbor(1).map(String::as_str), Some("a"));
    }
}
