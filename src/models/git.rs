/// What the git segment shows about the working directory's repository.
#[derive(Default, Debug, Clone)]
pub struct GitInfo {
    /// Local branch name; `None` when HEAD is detached
    pub branch: Option<String>,
    pub short_commit: Option<String>,
    /// `None` when the dirty check itself failed
    pub is_clean: Option<bool>,
    pub ahead: Option<usize>,
    pub behind: Option<usize>,
}

impl GitInfo {
    /// Branch name, else the short commit of a detached HEAD.
    pub fn label(&self) -> &str {
        self.branch
            .as_deref()
            .or(self.short_commit.as_deref())
            .unwrap_or("-")
    }
}
