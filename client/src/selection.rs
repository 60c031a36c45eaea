use indexmap::IndexSet;

/// Repositories chosen for the next bulk update, in the order they were
/// picked.
///
/// The selection is keyed by name only and survives page changes, so names
/// picked on other pages stay selected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Selection {
    names: IndexSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name` if absent, remove it if present. Returns whether it is now
    /// selected.
    pub fn toggle(&mut self, name: &str) -> bool {
        if self.names.shift_remove(name) {
            false
        } else {
            self.names.insert(name.to_string());
            true
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}
