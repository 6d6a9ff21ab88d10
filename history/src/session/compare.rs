//! Two-slot selection of analyses for side-by-side comparison.

/// How many ids are currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Empty,
    One,
    Two,
}

/// Ordered, oldest-first selection of at most two record ids. Selecting a
/// third id drops the oldest one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    ids: Vec<String>,
}

impl ComparisonSelection {
    pub const MAX: usize = 2;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: impl Into<String>) -> SelectionState {
        let id = id.into();
        if let Some(index) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(index);
        } else {
            if self.ids.len() >= Self::MAX {
                self.ids.remove(0);
            }
            self.ids.push(id);
        }
        self.state()
    }

    pub fn state(&self) -> SelectionState {
        match self.ids.len() {
            0 => SelectionState::Empty,
            1 => SelectionState::One,
            _ => SelectionState::Two,
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    pub fn pair(&self) -> Option<(&str, &str)> {
        match self.ids.as_slice() {
            [first, second] => Some((first.as_str(), second.as_str())),
            _ => None,
        }
    }

    /// Comparison can only run with exactly two selections.
    pub fn is_ready(&self) -> bool {
        self.state() == SelectionState::Two
    }

    pub fn label(&self) -> String {
        format!("Compare Selected ({}/{})", self.ids.len(), Self::MAX)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
