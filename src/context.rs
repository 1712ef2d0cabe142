use crate::statics::StaticTable;

/// Per-module translation state.
///
/// Holds the module name (the namespace for static symbols and branch
/// labels), the static table and the counter that keeps comparison labels
/// unique inside the module.
#[derive(Debug, Clone)]
pub struct TranslationContext {
    module: String,
    statics: StaticTable,
    label_counter: usize,
}

impl TranslationContext {
    pub fn new(module: impl Into<String>) -> Self {
        let module = module.into();
        TranslationContext {
            statics: StaticTable::new(&module),
            module,
            label_counter: 0,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn statics(&self) -> &StaticTable {
        &self.statics
    }

    pub(crate) fn statics_mut(&mut self) -> &mut StaticTable {
        &mut self.statics
    }

    pub(crate) fn next_label(&mut self) -> usize {
        let tmp = self.label_counter;
        self.label_counter += 1;
        tmp
    }
}
