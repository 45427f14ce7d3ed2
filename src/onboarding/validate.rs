use super::custom_id::DROPDOWN_SELECTOR;
use super::definition::{InteractiveComponent, Step};
use std::collections::BTreeSet;

pub const MAX_STEPS: usize = 20;
pub const MIN_DELAY_SECONDS: u64 = 1;
pub const MAX_DELAY_SECONDS: u64 = 300;
pub const MAX_BUTTON_OPTIONS: usize = 5;
pub const MAX_DROPDOWN_OPTIONS: usize = 25;

/// Checks the structural limits of an edited step list before it is
/// persisted. Returns every violation, not just the first; an empty list
/// means the edit is acceptable.
pub fn validate_steps(steps: &[Step]) -> Vec<String> {
    let mut violations = Vec::new();

    if steps.len() > MAX_STEPS {
        violations.push(format!(
            "at most {MAX_STEPS} steps are allowed, found {}",
            steps.len()
        ));
    }

    let mut seen_ids = BTreeSet::new();
    for (index, step) in steps.iter().enumerate() {
        if !seen_ids.insert(step.id().clone()) {
            violations.push(format!("step {index}: duplicate step id `{}`", step.id()));
        }

        match step {
            Step::Message { .. } => {}
            Step::Delay { seconds, .. } => {
                if *seconds < MIN_DELAY_SECONDS || *seconds > MAX_DELAY_SECONDS {
                    violations.push(format!(
                        "step {index}: delay must be between {MIN_DELAY_SECONDS} and {MAX_DELAY_SECONDS} seconds"
                    ));
                }
            }
            Step::Action { components, .. } => {
                for (component_index, component) in components.iter().enumerate() {
                    validate_component(index, component_index, component, &mut violations);
                }
            }
        }
    }

    violations
}

fn validate_component(
    step_index: usize,
    component_index: usize,
    component: &InteractiveComponent,
    violations: &mut Vec<String>,
) {
    match component {
        InteractiveComponent::ButtonGroup { options } => {
            if options.len() > MAX_BUTTON_OPTIONS {
                violations.push(format!(
                    "step {step_index}: component {component_index}: at most {MAX_BUTTON_OPTIONS} button options are allowed, found {}",
                    options.len()
                ));
            }
            for option in options {
                if option.value.as_str() == DROPDOWN_SELECTOR {
                    violations.push(format!(
                        "step {step_index}: component {component_index}: button option value `{DROPDOWN_SELECTOR}` is reserved"
                    ));
                }
            }
        }
        InteractiveComponent::Dropdown { options, .. } => {
            if options.len() > MAX_DROPDOWN_OPTIONS {
                violations.push(format!(
                    "step {step_index}: component {component_index}: at most {MAX_DROPDOWN_OPTIONS} dropdown options are allowed, found {}",
                    options.len()
                ));
            }
        }
    }

    let mut seen_values = BTreeSet::new();
    for option in component.options() {
        if !seen_values.insert(option.value.clone()) {
            violations.push(format!(
                "step {step_index}: component {component_index}: duplicate option value `{}`",
                option.value
            ));
        }
        if option.label.trim().is_empty() {
            violations.push(format!(
                "step {step_index}: component {component_index}: option `{}` must have a label",
                option.value
            ));
        }
        if option.role_id.trim().is_empty() {
            violations.push(format!(
                "step {step_index}: component {component_index}: option `{}` must reference a role",
                option.value
            ));
        }
    }
}
