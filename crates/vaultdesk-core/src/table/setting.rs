// ── Table settings panel ──
//
// Column visibility and page-size choice for one table.

use indexmap::IndexMap;

/// Page sizes offered by every table.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub label: String,
    pub visible: bool,
    /// Mandatory columns are not selectable and can never be hidden.
    pub selectable: bool,
}

impl Column {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            visible: true,
            selectable: true,
        }
    }

    /// A column that is always shown.
    pub fn mandatory(label: impl Into<String>) -> Self {
        Self {
            selectable: false,
            ..Self::new(label)
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSetting {
    pub columns: IndexMap<String, Column>,
    pub page_size_options: Vec<u32>,
    /// The selected entry of `page_size_options`.
    pub page_size: u32,
    pub open: bool,
    initial_columns: IndexMap<String, Column>,
}

impl TableSetting {
    pub fn new(columns: IndexMap<String, Column>) -> Self {
        let page_size_options = PAGE_SIZE_OPTIONS.to_vec();
        Self {
            initial_columns: columns.clone(),
            columns,
            page_size: PAGE_SIZE_OPTIONS[0],
            page_size_options,
            open: false,
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Show or hide a selectable column. Returns `false` for unknown and
    /// mandatory columns, which are left untouched.
    pub fn set_visible(&mut self, key: &str, visible: bool) -> bool {
        match self.columns.get_mut(key) {
            Some(column) if column.selectable => {
                column.visible = visible;
                true
            }
            _ => false,
        }
    }

    /// Visible column keys joined with commas, in column order.
    pub fn visible_columns(&self) -> String {
        self.columns
            .iter()
            .filter(|(_, c)| c.visible)
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn count_visible_columns(&self) -> usize {
        self.columns.values().filter(|c| c.visible).count()
    }

    /// Make exactly the listed selectable columns visible; mandatory
    /// columns keep their state whatever the list says.
    pub fn show_only<S: AsRef<str>>(&mut self, keys: &[S]) {
        for (key, column) in &mut self.columns {
            if column.selectable {
                column.visible = keys.iter().any(|k| k.as_ref() == key);
            }
        }
    }

    /// Select the option equal to `size`, or the first option if none is.
    pub fn select_page_size(&mut self, size: u32) -> u32 {
        self.page_size = self
            .page_size_options
            .iter()
            .copied()
            .find(|option| *option == size)
            .or_else(|| self.page_size_options.first().copied())
            .unwrap_or(size);
        self.page_size
    }

    /// First page-size option and the initial column visibility.
    pub fn reset(&mut self) {
        if let Some(first) = self.page_size_options.first() {
            self.page_size = *first;
        }
        for (key, column) in &mut self.columns {
            if let Some(initial) = self.initial_columns.get(key) {
                column.visible = initial.visible;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setting() -> TableSetting {
        TableSetting::new(
            [
                ("code".to_owned(), Column::mandatory("Code")),
                ("name".to_owned(), Column::new("Name")),
                ("branch".to_owned(), Column::new("Branch").hidden()),
                ("notes".to_owned(), Column::new("Notes")),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn visible_columns_in_order() {
        let s = setting();
        assert_eq!(s.visible_columns(), "code,name,notes");
        assert_eq!(s.count_visible_columns(), 3);
    }

    #[test]
    fn mandatory_columns_ignore_show_only() {
        let mut s = setting();
        s.show_only(&["branch"]);
        assert_eq!(s.visible_columns(), "code,branch");
        assert!(!s.set_visible("code", false));
        assert!(s.columns["code"].visible);
    }

    #[test]
    fn page_size_falls_back_to_first_option() {
        let mut s = setting();
        assert_eq!(s.select_page_size(50), 50);
        assert_eq!(s.select_page_size(33), 10);
    }

    #[test]
    fn reset_restores_initial_visibility() {
        let mut s = setting();
        s.show_only::<&str>(&[]);
        s.select_page_size(100);
        s.toggle();
        s.reset();
        assert_eq!(s.visible_columns(), "code,name,notes");
        assert_eq!(s.page_size, 10);
        assert!(s.open);
    }
}
