/// How a context percentage was obtained, from most to least trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMethod {
    ClaudeSystem,
    RealTokensWithCache,
    RealTokensBasic,
    EnhancedEstimate,
    Default,
    NoTranscript,
    FileMissing,
    Error,
}

impl ContextMethod {
    pub fn is_real_tokens(&self) -> bool {
        matches!(self, Self::RealTokensWithCache | Self::RealTokensBasic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClaudeSystem => "claude_system",
            Self::RealTokensWithCache => "real_tokens_with_cache",
            Self::RealTokensBasic => "real_tokens_basic",
            Self::EnhancedEstimate => "enhanced_estimate",
            Self::Default => "default",
            Self::NoTranscript => "no_transcript",
            Self::FileMissing => "file_missing",
            Self::Error => "error",
        }
    }
}

/// Warning emitted by Claude Code itself in a system message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextWarning {
    Low,
    AutoCompact,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextInfo {
    pub percent: f64,
    pub method: ContextMethod,
    pub accurate: bool,
    pub warning: Option<ContextWarning>,
    pub tokens_used: Option<u64>,
    pub cache_tokens: Option<u64>,
    pub messages: Option<usize>,
    pub content_length: Option<usize>,
}

impl ContextInfo {
    /// Placeholder reading used when nothing better is known.
    pub fn fallback(method: ContextMethod) -> Self {
        Self {
            percent: 15.0,
            method,
            accurate: false,
            warning: None,
            tokens_used: None,
            cache_tokens: None,
            messages: None,
            content_length: None,
        }
    }
}
