use colored::*;
use setu_core::schemes::DEFAULT_SCHEME;
use setu_core::{SchemeCatalog, SchemeTemplate};

use crate::state::{FormPhase, PortalFormState};

const WIDTH: usize = 56;

/// Parses `#rrggbb` into its components
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some((r, g, b))
}

fn header_line(text: &str, color: &str) -> String {
    let padded = format!(" {:<width$}", text, width = WIDTH - 1);
    match parse_hex_color(color) {
        Some((r, g, b)) => padded.white().bold().on_truecolor(r, g, b).to_string(),
        None => padded.white().bold().to_string(),
    }
}

fn themed(text: &str, color: &str) -> ColoredString {
    match parse_hex_color(color) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

/// Renders the portal form as terminal text.
///
/// Every field the template declares is listed; fields with a value are
/// shown in the filled style, the rest show their placeholder.
pub fn render_form(state: &PortalFormState, catalog: &SchemeCatalog) -> String {
    let fallback;
    let template: &SchemeTemplate = match catalog
        .get(&state.active_scheme)
        .or_else(|| catalog.get(DEFAULT_SCHEME))
    {
        Some(t) => t,
        None => {
            fallback = SchemeTemplate {
                title: state.active_scheme.clone(),
                subtitle: String::new(),
                theme_color: String::new(),
                header_color: String::new(),
                fields: Vec::new(),
            };
            &fallback
        }
    };

    let mut out = String::new();
    out.push_str(&header_line(
        "🇮🇳 Government of Bharat • Public Service Portal",
        &template.header_color,
    ));
    out.push('\n');
    out.push_str(&format!("Status: {}\n", status_text(state.phase)));
    out.push('\n');
    out.push_str(&format!("{}\n", themed(&template.title, &template.theme_color).bold()));
    if !template.subtitle.is_empty() {
        out.push_str(&format!("{}\n", template.subtitle.dimmed()));
    }
    out.push_str(&format!("{}\n", "─".repeat(WIDTH).dimmed()));

    for field in &template.fields {
        out.push_str(&format!("{}\n", field.label.to_uppercase().dimmed()));
        match state.values.get(&field.key) {
            Some(value) => out.push_str(&format!(
                "  {} {}\n",
                "✎".yellow(),
                value.bold().on_bright_yellow().black()
            )),
            None => out.push_str(&format!("  {}\n", field.placeholder.bright_black())),
        }
    }

    out.push_str(&format!("{}\n", "─".repeat(WIDTH).dimmed()));
    out.push_str(&format!("[ {} ]\n", button_text(state.phase)));
    out.push_str(&format!(
        "{}\n",
        "Government of Bharat • Department of E-Governance • Managed by NIC".dimmed()
    ));
    out
}

fn status_text(phase: FormPhase) -> ColoredString {
    match phase {
        FormPhase::Draft => phase.label().dimmed(),
        FormPhase::AgentAccessing | FormPhase::FormFilling => phase.label().yellow().bold(),
        FormPhase::Submitted => phase.label().green().bold(),
    }
}

fn button_text(phase: FormPhase) -> ColoredString {
    match phase {
        FormPhase::Draft | FormPhase::Submitted => phase.button_label().dimmed(),
        _ => phase.button_label().white().bold().on_truecolor(0xff, 0x99, 0x33),
    }
}
