use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use pulldown_cmark::{Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag};
use setu_channels::{MessageSender, WhatsAppMessage};
use setu_portal::{FormPhase, PortalEvent};
use std::time::Duration;

/// Print an assistant turn, rendering its markdown
pub fn print_assistant(text: &str) {
    let rendered = render_markdown(text);
    println!("{}: {}", "Yojana Setu AI".blue().bold(), rendered.trim_end());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

pub fn print_warning(message: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), message);
}

pub fn print_success(message: &str) {
    println!("{} {}", "✔".green().bold(), message.green());
}

/// Spinner shown while a backend call is outstanding
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn print_banner(title: &str, subtitle: &str) {
    println!();
    println!("{}", title.bright_white().bold().on_truecolor(0xff, 0x99, 0x33));
    if !subtitle.is_empty() {
        println!("{}", subtitle.dimmed());
    }
    println!();
}

pub fn print_whatsapp_message(message: &WhatsAppMessage) {
    let time = format!("[{}]", message.timestamp).dimmed();
    let text = if message.is_audio {
        message.text.italic().to_string()
    } else {
        message.text.clone()
    };
    match message.sender {
        MessageSender::User => println!("{} {}: {}", time, "You".green().bold(), text),
        MessageSender::Ai => println!("{} {}: {}", time, "Yojana-Setu".truecolor(0x07, 0x5e, 0x54).bold(), text),
    }
}

/// One line describing a portal event, as printed beside the chat
pub fn format_portal_event(event: &PortalEvent) -> String {
    let tag = "[Portal]".truecolor(0xff, 0x99, 0x33).bold();
    match event {
        PortalEvent::PhaseChanged { scheme, phase } => {
            let phase_text = match phase {
                FormPhase::Submitted => phase.label().green().bold(),
                _ => phase.label().yellow(),
            };
            format!("{} {}: {}", tag, scheme.bold(), phase_text)
        }
        PortalEvent::FieldFilled { key, value } => {
            format!("{}   ✎ {} = {}", tag, key.dimmed(), value)
        }
        PortalEvent::Ignored { scheme } => {
            format!("{} {}", tag, format!("Unknown scheme '{}', form left as is", scheme).red())
        }
    }
}

/// Show usage for the top-level commands
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "yojana-setu register".green().bold());
    println!("    Create your citizen account, then chat with the caseworker");
    println!();
    println!("  {}", "yojana-setu chat".green().bold());
    println!("    Chat with the AI caseworker; it can open and fill the portal for you");
    println!();
    println!("  {}", "yojana-setu whatsapp".green().bold());
    println!("    Tier 1: WhatsApp AI emulator");
    println!();
    println!("  {}", "yojana-setu ivr".green().bold());
    println!("    Tier 2/3: IVR Voice Bot emulator");
    println!();
    println!("  {}", "yojana-setu portal --scheme \"PM Kisan\" --details '{...}'".green().bold());
    println!("    Watch the portal fill a form by itself");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --backend-url <URL>  Caseworker backend (default http://localhost:8000)");
    println!("  --config <PATH>      Configuration file");
    println!("  --help               Show this help message");
    println!();
}

pub fn print_chat_help() {
    println!("{}", "Commands:".cyan());
    println!("  /portal   Show or hide the government portal");
    println!("  /status   Print the portal form");
    println!("  /help     Show this list");
    println!("  exit      Leave the chat");
    println!();
}

/// Render markdown for the terminal
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = MdParser::new_ext(markdown, options);

    let mut in_code_block = false;
    let mut bold = false;
    let mut in_item = false;
    let mut output = String::new();

    for event in parser {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => match level {
                HeadingLevel::H1 | HeadingLevel::H2 => {
                    output.push_str(&format!("\n{} ", "#".bright_cyan().bold()))
                }
                _ => output.push('\n'),
            },
            MdEvent::End(Tag::Heading(..)) => {
                output.push('\n');
            }
            MdEvent::Start(Tag::Paragraph) => {
                if !in_item && !output.is_empty() && !output.ends_with("\n\n") {
                    if output.ends_with('\n') {
                        output.push('\n');
                    } else {
                        output.push_str("\n\n");
                    }
                }
            }
            MdEvent::End(Tag::Paragraph) => {
                output.push('\n');
            }
            MdEvent::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                output.push('\n');
                output.push_str(&"─".repeat(40).dimmed().to_string());
                output.push('\n');
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                output.push_str(&"─".repeat(40).dimmed().to_string());
                output.push('\n');
                in_code_block = false;
            }
            MdEvent::Start(Tag::List(_)) => {
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::End(Tag::List(_)) => {}
            MdEvent::Start(Tag::Item) => {
                in_item = true;
                output.push_str(&format!("{}  ", "•".yellow()));
            }
            MdEvent::End(Tag::Item) => {
                in_item = false;
                if !output.ends_with('\n') {
                    output.push('\n');
                }
            }
            MdEvent::Start(Tag::Strong) => bold = true,
            MdEvent::End(Tag::Strong) => bold = false,
            MdEvent::Code(ref code) => {
                output.push_str(&format!("{}", code.on_bright_black().white()));
            }
            MdEvent::Text(ref text) => {
                if in_code_block {
                    output.push_str(&text.dimmed().to_string());
                } else if bold {
                    output.push_str(&text.bold().to_string());
                } else {
                    output.push_str(text);
                }
            }
            MdEvent::SoftBreak => output.push(' '),
            MdEvent::HardBreak => output.push('\n'),
            MdEvent::TaskListMarker(done) => {
                output.push_str(if done { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    output
}
