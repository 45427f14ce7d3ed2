use super::custom_id::CallbackId;
use super::definition::{EmojiRef, InteractiveComponent};
use crate::discord::payload::{
    ActionRow, Button, PartialEmoji, RowComponent, SelectOption, StringSelect,
    COMPONENT_STRING_SELECT,
};
use crate::shared::{GuildId, StepId};

// Display row limit imposed by the platform, distinct from the validation
// limit even though both are currently five.
const MAX_BUTTONS_PER_ROW: usize = 5;
const DEFAULT_SELECT_PLACEHOLDER: &str = "Select an option";

fn wire_emoji(emoji: &Option<EmojiRef>) -> Option<PartialEmoji> {
    match emoji {
        Some(e) if e.id.is_some() => Some(PartialEmoji {
            id: e.id.clone(),
            name: e.name.clone(),
        }),
        Some(e) if !e.name.is_empty() => Some(PartialEmoji {
            id: None,
            name: e.name.clone(),
        }),
        _ => None,
    }
}

/// Translates an `Action` step's components into renderable action rows whose
/// callback identifiers carry (guild, step, selector).
pub fn render_components(
    guild_id: &GuildId,
    step_id: &StepId,
    components: &[InteractiveComponent],
) -> Vec<ActionRow> {
    let mut rows = Vec::new();

    for component in components {
        match component {
            InteractiveComponent::ButtonGroup { options } => {
                for chunk in options.chunks(MAX_BUTTONS_PER_ROW) {
                    let buttons = chunk
                        .iter()
                        .map(|option| {
                            RowComponent::Button(Button::primary(
                                option.label.clone(),
                                CallbackId::for_option(
                                    guild_id.clone(),
                                    step_id.clone(),
                                    option.value.clone(),
                                )
                                .encode(),
                                wire_emoji(&option.emoji),
                            ))
                        })
                        .collect();
                    rows.push(ActionRow::new(buttons));
                }
            }
            InteractiveComponent::Dropdown {
                placeholder,
                multi_select,
                options,
            } => {
                let option_count = options.len().min(u8::MAX as usize) as u8;
                let select = StringSelect {
                    kind: COMPONENT_STRING_SELECT,
                    custom_id: CallbackId::for_dropdown(guild_id.clone(), step_id.clone())
                        .encode(),
                    placeholder: if placeholder.trim().is_empty() {
                        DEFAULT_SELECT_PLACEHOLDER.to_string()
                    } else {
                        placeholder.clone()
                    },
                    min_values: if *multi_select { 0 } else { 1 },
                    max_values: if *multi_select { option_count } else { 1 },
                    options: options
                        .iter()
                        .map(|option| SelectOption {
                            label: option.label.clone(),
                            value: option.value.to_string(),
                            description: option
                                .description
                                .clone()
                                .filter(|d| !d.trim().is_empty()),
                            emoji: wire_emoji(&option.emoji),
                        })
                        .collect(),
                };
                rows.push(ActionRow::new(vec![RowComponent::StringSelect(select)]));
            }
        }
    }

    rows
}
