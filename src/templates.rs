use crate::errors::RenderError;
use anyhow::Context;
use std::collections::HashMap;
use std::path::Path;

/// In-memory set of HTML pages, read from disk once at startup.
pub struct TemplateStore {
    pages: HashMap<String, String>,
}

impl TemplateStore {
    /// Loads every `*.html` file under `dir`, keyed by file stem.
    /// Fails if the directory is unreadable or holds no pages, which
    /// aborts startup before the server accepts traffic.
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref();
        let mut pages = HashMap::new();

        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read template directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("html") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            pages.insert(name.to_string(), contents);
        }

        if pages.is_empty() {
            anyhow::bail!("no .html templates found in {}", dir.display());
        }

        Ok(Self { pages })
    }

    pub fn render(&self, name: &str) -> Result<String, RenderError> {
        self.pages
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::MissingPage(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_renders_pages() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>home</html>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let templates = TemplateStore::load(dir.path()).unwrap();

        assert_eq!(templates.render("index").unwrap(), "<html>home</html>");
        assert!(matches!(
            templates.render("notes"),
            Err(RenderError::MissingPage(_))
        ));
    }

    #[test]
    fn missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");

        assert!(TemplateStore::load(&gone).is_err());
    }

    #[test]
    fn empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();

        assert!(TemplateStore::load(dir.path()).is_err());
    }
}
