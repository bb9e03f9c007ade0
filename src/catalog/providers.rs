//! Static provider branding table.
//!
//! Providers are never fetched: they are derived from the identifier prefix of
//! each model and looked up here. Unknown prefixes get a synthesized name and
//! the generic branding.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::model::Provider;

/// Color applied to providers missing from the branding table.
pub const UNKNOWN_PROVIDER_COLOR: &str = "#6B7280";

/// Icon applied to providers missing from the branding table.
pub const UNKNOWN_PROVIDER_ICON: &str = "unknown";

/// Provider id used when a model identifier has no `/`.
pub const UNKNOWN_PROVIDER_ID: &str = "unknown";

struct Branding {
    name: &'static str,
    color: &'static str,
    icon: &'static str,
}

const BRANDING: &[(&str, Branding)] = &[
    ("openai", Branding { name: "OpenAI", color: "#10A37F", icon: "openai" }),
    ("anthropic", Branding { name: "Anthropic", color: "#D97757", icon: "anthropic" }),
    ("google", Branding { name: "Google", color: "#4285F4", icon: "google" }),
    ("meta-llama", Branding { name: "Meta", color: "#0668E1", icon: "meta" }),
    ("mistralai", Branding { name: "Mistral AI", color: "#FA520F", icon: "mistral" }),
    ("cohere", Branding { name: "Cohere", color: "#39594D", icon: "cohere" }),
    ("deepseek", Branding { name: "DeepSeek", color: "#4D6BFE", icon: "deepseek" }),
    ("x-ai", Branding { name: "xAI", color: "#000000", icon: "xai" }),
    ("qwen", Branding { name: "Qwen", color: "#615CED", icon: "qwen" }),
    ("microsoft", Branding { name: "Microsoft", color: "#00A4EF", icon: "microsoft" }),
    ("amazon", Branding { name: "Amazon", color: "#FF9900", icon: "amazon" }),
    ("nvidia", Branding { name: "NVIDIA", color: "#76B900", icon: "nvidia" }),
    ("perplexity", Branding { name: "Perplexity", color: "#20808D", icon: "perplexity" }),
    ("ai21", Branding { name: "AI21 Labs", color: "#E91E63", icon: "ai21" }),
    ("nousresearch", Branding { name: "Nous Research", color: "#8B5CF6", icon: "nous" }),
    ("moonshotai", Branding { name: "Moonshot AI", color: "#16191E", icon: "moonshot" }),
    ("z-ai", Branding { name: "Z.AI", color: "#2D5BFF", icon: "zai" }),
    ("openrouter", Branding { name: "OpenRouter", color: "#6467F2", icon: "openrouter" }),
];

static BRANDING_TABLE: Lazy<HashMap<&'static str, &'static Branding>> =
    Lazy::new(|| BRANDING.iter().map(|(id, b)| (*id, b)).collect());

/// Look up a provider by identifier, synthesizing one for unknown identifiers.
pub fn lookup_provider(provider_id: &str) -> Provider {
    match BRANDING_TABLE.get(provider_id) {
        Some(branding) => Provider {
            id: provider_id.to_string(),
            name: branding.name.to_string(),
            color: branding.color.to_string(),
            icon: Some(branding.icon.to_string()),
        },
        None => Provider {
            id: provider_id.to_string(),
            name: title_case_provider_id(provider_id),
            color: UNKNOWN_PROVIDER_COLOR.to_string(),
            icon: Some(UNKNOWN_PROVIDER_ICON.to_string()),
        },
    }
}

/// Whether the provider id has an entry in the branding table.
pub fn is_known_provider(provider_id: &str) -> bool {
    BRANDING_TABLE.contains_key(provider_id)
}

/// "arcee-ai" -> "Arcee Ai"
fn title_case_provider_id(provider_id: &str) -> String {
    provider_id
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
