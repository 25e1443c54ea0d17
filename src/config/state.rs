// Application state module
// Bundles everything handlers need, built once at startup

use crate::config::Config;
use crate::content::ContentRoot;
use crate::template::TemplateSet;

/// Shared application state
///
/// Constructed in main after config, content root and templates are
/// resolved, then passed around as `Arc<AppState>`. Read-only for the
/// lifetime of the process.
pub struct AppState {
    pub config: Config,
    pub content_root: ContentRoot,
    pub templates: TemplateSet,
}

impl AppState {
    pub fn new(config: Config, content_root: ContentRoot, templates: TemplateSet) -> Self {
        Self {
            config,
            content_root,
            templates,
        }
    }
}
