use serde::Deserialize;

#[derive(Deserialize, Debug, Default)]
pub struct HookModel {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct HookWorkspace {
    #[serde(default)]
    pub current_dir: Option<String>,
    #[serde(default)]
    pub project_dir: Option<String>,
}

/// Statusline payload piped to us on stdin. Every field is optional; the
/// status line degrades instead of failing on a partial payload.
#[derive(Deserialize, Debug, Default)]
pub struct HookJson {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub model: HookModel,
    #[serde(default)]
    pub workspace: HookWorkspace,
}

impl HookJson {
    pub fn model_display_name(&self) -> &str {
        self.model.display_name.as_deref().unwrap_or("Claude")
    }
}
