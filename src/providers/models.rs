// Known model identifiers and public API endpoints
// Author: kelexine (https://github.com/kelexine)

/// OpenAI Chat Completions models
pub mod openai {
    pub const API_BASE_URL: &str = "https://api.openai.com/v1";

    // GPT-4o (flagship multimodal)
    pub const GPT_4O: &str = "gpt-4o";
    pub const GPT_4O_MINI: &str = "gpt-4o-mini";

    // GPT-4 Turbo
    pub const GPT_4_TURBO: &str = "gpt-4-turbo";

    // GPT-3.5
    pub const GPT_3_5_TURBO: &str = "gpt-3.5-turbo";

    // o-series reasoning models
    pub const O1: &str = "o1";
    pub const O1_MINI: &str = "o1-mini";
    pub const O3_MINI: &str = "o3-mini";

    pub const ALL: &[&str] = &[
        GPT_4O,
        GPT_4O_MINI,
        GPT_4_TURBO,
        GPT_3_5_TURBO,
        O1,
        O1_MINI,
        O3_MINI,
    ];
}

/// Anthropic Messages API models
pub mod anthropic {
    pub const API_BASE_URL: &str = "https://api.anthropic.com/v1";
    pub const API_VERSION: &str = "2023-06-01";

    // Haiku: fastest and most compact
    pub const CLAUDE_HAIKU_4_5: &str = "claude-haiku-4-5-20251001";

    // Sonnet: balanced performance and speed
    pub const CLAUDE_SONNET_4_5: &str = "claude-sonnet-4-5";
    pub const CLAUDE_SONNET_4_6: &str = "claude-sonnet-4-6";

    // Opus: most capable
    pub const CLAUDE_OPUS_4_6: &str = "claude-opus-4-6";

    pub const ALL: &[&str] = &[
        CLAUDE_HAIKU_4_5,
        CLAUDE_SONNET_4_5,
        CLAUDE_SONNET_4_6,
        CLAUDE_OPUS_4_6,
    ];
}
