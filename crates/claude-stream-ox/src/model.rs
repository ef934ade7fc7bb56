/// Model identifiers. Requests take `impl Into<String>`, so unlisted models
/// can still be named directly.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
pub enum Model {
    // Claude 4 models
    #[strum(to_string = "claude-opus-4-1-20250805")]
    ClaudeOpus41,
    #[strum(to_string = "claude-opus-4-20250514")]
    ClaudeOpus4,
    #[strum(to_string = "claude-sonnet-4-20250514")]
    ClaudeSonnet4,

    // Claude 3.x models
    #[strum(to_string = "claude-3-7-sonnet-20250219")]
    Claude37Sonnet20250219,
    #[strum(to_string = "claude-3-5-sonnet-20241022")]
    Claude35Sonnet20241022,
    #[strum(to_string = "claude-3-5-sonnet-latest")]
    Claude35SonnetLatest,
    #[strum(to_string = "claude-3-5-haiku-20241022")]
    Claude35Haiku20241022,
    #[strum(to_string = "claude-3-5-haiku-latest")]
    Claude35HaikuLatest,
    #[strum(to_string = "claude-3-opus-20240229")]
    Claude3Opus20240229,
    #[strum(to_string = "claude-3-sonnet-20240229")]
    Claude3Sonnet20240229,
    #[strum(to_string = "claude-3-haiku-20240307")]
    Claude3Haiku20240307,

    // Completion-endpoint models
    #[strum(to_string = "claude-2.1")]
    Claude21,
    #[strum(to_string = "claude-2.0")]
    Claude20,
    #[strum(to_string = "claude-instant-1.2")]
    ClaudeInstant12,
    #[strum(to_string = "claude-v1")]
    ClaudeV1,
    #[strum(to_string = "claude-v1-100k")]
    ClaudeV1_100k,
    #[strum(to_string = "claude-v1.3")]
    ClaudeV1_3,
    #[strum(to_string = "claude-v1.3-100k")]
    ClaudeV1_3_100k,
    #[strum(to_string = "claude-v1.2")]
    ClaudeV1_2,
    #[strum(to_string = "claude-v1.0")]
    ClaudeV1_0,
    #[strum(to_string = "claude-instant-v1")]
    ClaudeInstantV1,
    #[strum(to_string = "claude-instant-v1-100k")]
    ClaudeInstantV1_100k,
    #[strum(to_string = "claude-instant-v1.1")]
    ClaudeInstantV1_1,
    #[strum(to_string = "claude-instant-v1.1-100k")]
    ClaudeInstantV1_1_100k,
    #[strum(to_string = "claude-instant-v1.0")]
    ClaudeInstantV1_0,
}

impl Model {
    /// Whether the model is served by the legacy completion endpoint only.
    pub fn is_completion_only(self) -> bool {
        matches!(
            self,
            Self::ClaudeV1
                | Self::ClaudeV1_100k
                | Self::ClaudeV1_3
                | Self::ClaudeV1_3_100k
                | Self::ClaudeV1_2
                | Self::ClaudeV1_0
                | Self::ClaudeInstantV1
                | Self::ClaudeInstantV1_100k
                | Self::ClaudeInstantV1_1
                | Self::ClaudeInstantV1_1_100k
                | Self::ClaudeInstantV1_0
        )
    }
}

impl Model {
    /// The Bedrock model ID serving this model. Legacy v1 variants map to
    /// their family's single Bedrock model; `-latest` aliases have none.
    pub fn bedrock_id(self) -> Option<&'static str> {
        let id = match self {
            Self::ClaudeOpus41 => "anthropic.claude-opus-4-1-20250805-v1:0",
            Self::ClaudeOpus4 => "anthropic.claude-opus-4-20250514-v1:0",
            Self::ClaudeSonnet4 => "anthropic.claude-sonnet-4-20250514-v1:0",
            Self::Claude37Sonnet20250219 => "anthropic.claude-3-7-sonnet-20250219-v1:0",
            Self::Claude35Sonnet20241022 => "anthropic.claude-3-5-sonnet-20241022-v2:0",
            Self::Claude35Haiku20241022 => "anthropic.claude-3-5-haiku-20241022-v1:0",
            Self::Claude3Opus20240229 => "anthropic.claude-3-opus-20240229-v1:0",
            Self::Claude3Sonnet20240229 => "anthropic.claude-3-sonnet-20240229-v1:0",
            Self::Claude3Haiku20240307 => "anthropic.claude-3-haiku-20240307-v1:0",
            Self::Claude21 => "anthropic.claude-v2:1",
            Self::Claude20 => "anthropic.claude-v2",
            Self::ClaudeV1
            | Self::ClaudeV1_100k
            | Self::ClaudeV1_3
            | Self::ClaudeV1_3_100k
            | Self::ClaudeV1_2
            | Self::ClaudeV1_0 => "anthropic.claude-v1",
            Self::ClaudeInstant12
            | Self::ClaudeInstantV1
            | Self::ClaudeInstantV1_100k
            | Self::ClaudeInstantV1_1
            | Self::ClaudeInstantV1_1_100k
            | Self::ClaudeInstantV1_0 => "anthropic.claude-instant-v1",
            Self::Claude35SonnetLatest | Self::Claude35HaikuLatest => return None,
        };
        Some(id)
    }
}

impl From<Model> for String {
    fn from(model: Model) -> Self {
        model.to_string()
    }
}
