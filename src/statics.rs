//! Symbol mapping for the `static` segment.

use indexmap::IndexMap;

/// Hack keeps statics in RAM[16..=255].
pub const STATIC_CAPACITY: usize = 240;

/// Static slots of one module, in the order they were first referenced.
#[derive(Debug, Clone)]
pub struct StaticTable {
    module: String,
    slots: IndexMap<u16, String>,
}

impl StaticTable {
    pub fn new(module: &str) -> Self {
        StaticTable {
            module: module.to_string(),
            slots: IndexMap::new(),
        }
    }

    /// Returns the symbol for `index`, allocating it on first reference.
    ///
    /// `None` means the module already owns [`STATIC_CAPACITY`] distinct
    /// slots and `index` is not one of them.
    pub fn resolve(&mut self, index: u16) -> Option<&str> {
        if !self.slots.contains_key(&index) {
            if self.slots.len() >= STATIC_CAPACITY {
                return None;
            }
            let symbol = format!("{}.temp.{}", self.module, index);
            log::debug!("allocating static {} as {}", index, symbol);
            self.slots.insert(index, symbol);
        }
        self.slots.get(&index).map(String::as_str)
    }

    /// Allocated `(index, symbol)` pairs in first-use order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.slots.iter().map(|(index, symbol)| (*index, symbol.as_str()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
