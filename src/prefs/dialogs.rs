//! Native file and directory pickers.

use std::path::PathBuf;

/// File pickers offered by the host. `None` means the user cancelled.
pub trait HostDialogs: Send + Sync {
    fn pick_directory(&self, title: &str) -> Option<PathBuf>;

    fn pick_file(&self, title: &str, filter_name: &str, extensions: &[&str]) -> Option<PathBuf>;
}

/// Pickers backed by `rfd`
#[derive(Debug, Clone, Copy, Default)]
pub struct RfdDialogs;

impl HostDialogs for RfdDialogs {
    fn pick_directory(&self, title: &str) -> Option<PathBuf> {
        rfd::FileDialog::new().set_title(title).pick_folder()
    }

    fn pick_file(&self, title: &str, filter_name: &str, extensions: &[&str]) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(title);
        if !extensions.is_empty() {
            dialog = dialog.add_filter(filter_name, extensions);
        }
        dialog.pick_file()
    }
}
