//! Cursor movement in the process picker and the bindings list

use super::state::App;

impl App {
    /// Moves the picker cursor up by one row.
    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// Moves the picker cursor down by one row.
    pub fn move_down(&mut self) {
        if self.selected_index < self.filtered_processes.len().saturating_sub(1) {
            self.selected_index += 1;
        }
    }

    /// Moves the picker cursor up by one page.
    pub fn page_up(&mut self, visible_rows: usize) {
        self.selected_index = self.selected_index.saturating_sub(visible_rows);
    }

    /// Moves the picker cursor down by one page.
    pub fn page_down(&mut self, visible_rows: usize) {
        self.selected_index = (self.selected_index + visible_rows)
            .min(self.filtered_processes.len().saturating_sub(1));
    }

    pub fn jump_to_start(&mut self) {
        self.selected_index = 0;
    }

    pub fn jump_to_end(&mut self) {
        self.selected_index = self.filtered_processes.len().saturating_sub(1);
    }

    /// Moves the highlight in the bindings list up.
    pub fn binding_up(&mut self) {
        self.binding_index = self.binding_index.saturating_sub(1);
    }

    /// Moves the highlight in the bindings list down.
    pub fn binding_down(&mut self) {
        let count = self.selected_bindings().len();
        if self.binding_index + 1 < count {
            self.binding_index += 1;
        }
    }
}
