use super::ports::NamingBuilder;
use crate::types::{Candidate, Title};
use std::path::PathBuf;

/// `{Title} ({Year}).{ext}` directly under the title folder.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardNamingBuilder;

impl NamingBuilder for StandardNamingBuilder {
    fn build_file_name(&self, title: &Title, _candidate: &Candidate) -> anyhow::Result<String> {
        let raw = match title.year {
            Some(year) => format!("{} ({})", title.name.trim(), year),
            None => title.name.trim().to_string(),
        };
        let name = sanitize_filename::sanitize(&raw);
        if name.trim().is_empty() {
            anyhow::bail!("Title {} has no usable name for a file", title.id);
        }
        Ok(name)
    }

    fn build_file_path(
        &self,
        title: &Title,
        file_name: &str,
        extension: &str,
    ) -> anyhow::Result<PathBuf> {
        let extension = extension.trim_start_matches('.');
        let file = if extension.is_empty() {
            file_name.to_string()
        } else {
            format!("{file_name}.{extension}")
        };
        Ok(title.path.join(file))
    }
}
