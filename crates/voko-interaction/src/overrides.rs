//! Connection-time agent overrides for the three resume scenarios.
//!
//! The base system prompt is fetched from the platform (single source of
//! truth); this module only appends scenario-specific context and picks the
//! opening line. Prompt addenda are rendered with minijinja templates.

use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;

use voko_core::error::{Result, VokoError};
use voko_core::persisted::{Language, PersistedState};
use voko_core::resume::ResumeScenario;

/// `conversation_config_override` payload of the initiation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationOverrides {
    pub agent: AgentOverrides,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOverrides {
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<PromptOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptOverride {
    pub prompt: String,
}

const MID_DRAFT_TEMPLATE: &str = r#"{{ base_prompt }}{{ language_instruction }}

## Session Context (Resuming Mid-Session)
The user was in the middle of a coaching session. Current state:
{{ state_json }}
{%- if understanding %}

Your understanding: {{ understanding }}
{%- endif %}
{%- if user_context %}

Accumulated user context: {{ user_context }}
{%- endif %}

Continue coaching from where you left off. Don't re-introduce yourself. Call update_todos immediately with the current todos, and update_workspace to restore the screen, then continue the conversation."#;

const RETURNING_TEMPLATE: &str = r#"{{ base_prompt }}{{ language_instruction }}

## Returning User Context
This user has worked with you before. Here's what you know about them:

{{ user_context }}
{%- if objectives %}

Previous OKRs drafted:
{%- for objective in objectives %}
{{ loop.index }}. "{{ objective }}"
{%- endfor %}
{%- endif %}

Skip the initial introductions - you already know this user. Greet them warmly and ask what they'd like to work on next. Call update_todos immediately with a fresh coaching roadmap."#;

const GERMAN_INSTRUCTION: &str =
    "\n\n## Language\nRespond in German (Deutsch). The user's interface is set to German.";

/// How many archived objectives the returning-user prompt summarizes.
const HISTORY_LIMIT: usize = 5;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("mid_draft", MID_DRAFT_TEMPLATE)
        .expect("mid_draft template is valid");
    env.add_template("returning", RETURNING_TEMPLATE)
        .expect("returning template is valid");
    env
});

fn welcome_back_message(language: Language) -> &'static str {
    match language {
        Language::De => "Willkommen zurück! Lass uns da weitermachen, wo wir aufgehört haben.",
        Language::En => "Welcome back! Let's continue where we left off.",
    }
}

fn returning_message(language: Language) -> &'static str {
    match language {
        Language::De => {
            "Schön, dich wieder zu sehen! Was möchtest du dieses Mal angehen — ein neues OKR für dasselbe Team, oder etwas ganz anderes?"
        }
        Language::En => {
            "Great to see you again! What would you like to work on this time — a new OKR for the same team, or something different?"
        }
    }
}

fn language_instruction(language: Language) -> &'static str {
    match language {
        Language::De => GERMAN_INSTRUCTION,
        Language::En => "",
    }
}

fn render(name: &str, ctx: minijinja::Value) -> Result<String> {
    let template = TEMPLATES
        .get_template(name)
        .map_err(|err| VokoError::internal(format!("missing template {name}: {err}")))?;
    template
        .render(ctx)
        .map_err(|err| VokoError::internal(format!("failed to render {name}: {err}")))
}

/// Builds the connection overrides for a selected resume scenario.
///
/// The fresh-user scenario only forces the language preference; the agent's
/// own configured prompt and introduction apply.
pub fn build_overrides(
    scenario: ResumeScenario,
    state: &PersistedState,
    base_prompt: &str,
) -> Result<ConversationOverrides> {
    let language = state.language;

    let agent = match scenario {
        ResumeScenario::MidDraft => {
            let draft = &state.current_session;
            let state_json = serde_json::to_string(&json!({
                "impact": draft.impact,
                "outcome": draft.outcome,
                "output": draft.output,
            }))?;

            let prompt = render(
                "mid_draft",
                minijinja::context! {
                    base_prompt => base_prompt,
                    language_instruction => language_instruction(language),
                    state_json => state_json,
                    understanding => draft.understanding,
                    user_context => state.user_context,
                },
            )?;

            AgentOverrides {
                language: language.code().to_string(),
                first_message: Some(welcome_back_message(language).to_string()),
                prompt: Some(PromptOverride { prompt }),
            }
        }

        ResumeScenario::Returning => {
            let objectives: Vec<&str> = state.recent_objectives(HISTORY_LIMIT);

            let prompt = render(
                "returning",
                minijinja::context! {
                    base_prompt => base_prompt,
                    language_instruction => language_instruction(language),
                    user_context => state.user_context,
                    objectives => objectives,
                },
            )?;

            AgentOverrides {
                language: language.code().to_string(),
                first_message: Some(returning_message(language).to_string()),
                prompt: Some(PromptOverride { prompt }),
            }
        }

        ResumeScenario::Fresh => AgentOverrides {
            language: language.code().to_string(),
            first_message: None,
            prompt: None,
        },
    };

    Ok(ConversationOverrides { agent })
}
