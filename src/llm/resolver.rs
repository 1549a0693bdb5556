use serde::Serialize;

const REASONING_PREFIX: &str = "o1";
const MESSAGES_PREFIX: &str = "claude-";

/// Short names that map directly to a provider identifier.
static CANONICAL_MODELS: &[(&str, &str)] = &[
    ("claude-3-5-sonnet", "claude-3-5-sonnet-20241022"),
    ("claude-3-5-haiku", "claude-3-5-haiku-20241022"),
];

/// Shortened or legacy family names.
static MODEL_ALIASES: &[(&str, &str)] = &[
    ("claude-sonnet", "claude-3-5-sonnet-20241022"),
    ("claude-haiku", "claude-3-5-haiku-20241022"),
    ("claude-3-sonnet", "claude-3-sonnet-20240229"),
    ("claude-3-haiku", "claude-3-haiku-20240307"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Chat completions with a system message and temperature.
    Chat,
    /// Chat completions for reasoning models: user message only, no temperature.
    Reasoning,
    /// Messages API.
    Messages,
}

/// Decided from the short name, before any aliasing.
pub fn select_provider(short_name: &str) -> ProviderKind {
    if short_name.starts_with(REASONING_PREFIX) {
        ProviderKind::Reasoning
    } else if short_name.starts_with(MESSAGES_PREFIX) {
        ProviderKind::Messages
    } else {
        ProviderKind::Chat
    }
}

pub fn resolve(short_name: &str) -> String {
    let lookup = |table: &[(&str, &'static str)]| {
        table
            .iter()
            .find(|(short, _)| *short == short_name)
            .map(|(_, id)| *id)
    };

    lookup(CANONICAL_MODELS)
        .or_else(|| lookup(MODEL_ALIASES))
        .map(str::to_string)
        .unwrap_or_else(|| short_name.to_string())
}

/// A model as the rest of the pipeline sees it: the user-facing name (used for
/// pricing), the identifier sent on the wire, and the adapter that speaks to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelChoice {
    pub short_name: String,
    pub provider_id: String,
    pub provider: ProviderKind,
}

impl ModelChoice {
    pub fn new(short_name: impl Into<String>) -> Self {
        let short_name = short_name.into();
        let provider = select_provider(&short_name);
        let provider_id = resolve(&short_name);
        Self {
            short_name,
            provider_id,
            provider,
        }
    }
}
