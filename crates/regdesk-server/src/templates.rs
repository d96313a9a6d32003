use anyhow::{Context, Result};
use minijinja::Environment;
use std::path::Path;

/// Logical template names mapped to their files on disk.
const TEMPLATE_FILES: &[(&str, &str)] = &[
    ("home", "index.html"),
    ("registration", "registration.html"),
];

/// In-memory template registry, compiled once at startup and immutable
/// afterwards.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Read and compile every required template from `dir`. A missing or
    /// syntactically invalid template file fails the load.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| minijinja::AutoEscape::Html);

        for &(name, file) in TEMPLATE_FILES {
            let path = dir.join(file);
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read template {}", path.display()))?;
            env.add_template_owned(name.to_string(), source)
                .with_context(|| format!("failed to compile template '{}'", name))?;
        }

        Ok(Self { env })
    }

    /// Render a template by logical name. Both views are static today, so
    /// the rendering context is intentionally empty.
    pub fn render(&self, name: &str) -> Result<String> {
        let tmpl = self.env.get_template(name)?;
        Ok(tmpl.render(minijinja::context! {})?)
    }
}
