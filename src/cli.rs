#[derive(clap::Parser, Debug)]
#[command(name = "context-monitor", version, about = "Claude Code status line with usage window tracking")]
pub struct Args {
    /// Force Claude data path(s), comma-separated. Defaults to ~/.claude and ~/.config/claude
    #[arg(long, env = "CLAUDE_CONFIG_DIR")]
    pub claude_config_dir: Option<String>,

    /// Emit JSON instead of the colored status line
    #[arg(long)]
    pub json: bool,

    /// Token budget per 5-hour block used for the usage percentage (default 88000)
    #[arg(long, env = "CLAUDE_TOKEN_BUDGET")]
    pub token_budget: Option<u64>,

    /// How far back to read usage events, in hours (default 192)
    #[arg(long, env = "CLAUDE_SCAN_LOOKBACK_HOURS")]
    pub lookback_hours: Option<u64>,

    /// Skip repository inspection
    #[arg(long)]
    pub no_git: bool,

    /// Debug mode: log scan and block details to stderr
    #[arg(long, env = "CLAUDE_DEBUG")]
    pub debug: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }
}
