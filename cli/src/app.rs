use anyhow::{bail, Context, Result};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use setu_core::directive::parse_details;
use setu_core::session::adapters::FileSessionStore;
use setu_core::session::{forget_identity, persist_identity, AppSession, Identity};
use setu_core::{
    Backend, ChatDispatcher, DispatchError, RegistrationRequest, SchemeCatalog, SetuClient,
    SetuConfig,
};
use setu_ipc::{portal_channel, AutoFillPayload};
use setu_portal::render::render_form;
use setu_portal::{
    FillTimings, PortalEvent, PortalRevealer, PortalSurface, SharedFormState,
};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::emulators::{run_ivr, run_whatsapp};
use crate::output::{
    format_portal_event, print_assistant, print_banner, print_chat_help, print_error,
    print_success, print_usage_instructions, print_warning, spinner,
};

/// Everything a surface needs, built once in `main`
pub struct AppContext {
    pub config: SetuConfig,
    pub client: SetuClient,
    pub store: FileSessionStore,
    pub catalog: Arc<SchemeCatalog>,
}

impl AppContext {
    pub fn backend(&self) -> Arc<dyn Backend> {
        Arc::new(self.client.clone())
    }

    /// Identity from the session store, guest when absent or unreadable
    pub async fn session(&self) -> AppSession {
        match AppSession::load(&self.store).await {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not read session file: {}", e);
                AppSession::guest()
            }
        }
    }
}

/// Reads one line after `label`. None on end of input.
pub fn read_input(label: &ColoredString) -> Result<Option<String>> {
    print!("{}: ", label);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

pub fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

pub async fn run_command(ctx: &AppContext, command: Command) -> Result<()> {
    match command {
        Command::Register {
            username,
            email,
            phone,
        } => run_register(ctx, username, email, phone).await,
        Command::Chat => run_chat(ctx).await,
        Command::Whatsapp => run_whatsapp(ctx).await,
        Command::Ivr => run_ivr(ctx).await,
        Command::Portal { scheme, details } => run_portal_demo(ctx, &scheme, &details).await,
        Command::Schemes => {
            print_schemes(&ctx.catalog);
            Ok(())
        }
        Command::Logout => run_logout(ctx).await,
        // Handled before the context exists
        Command::InitConfig { .. } => Ok(()),
    }
}

/// Home screen: pick a surface until the user quits
pub async fn run_home_menu(ctx: &AppContext) -> Result<()> {
    let items = [
        "Advanced Agentic Demo: register and let the AI apply on the portal",
        "Continue to chat",
        "Tier 1: WhatsApp AI",
        "Tier 2/3: IVR Voice Bot",
        "Browse schemes",
        "Log out",
        "Help",
        "Quit",
    ];

    loop {
        print_banner(
            " Yojana-Setu ",
            "The Voice-First AI Caseworker for Rural India",
        );
        let choice = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("Choose a channel")
            .items(&items)
            .default(0)
            .interact()
            .context("Failed to read menu selection")?;

        let result = match choice {
            0 => run_register(ctx, None, None, None).await,
            1 => run_chat(ctx).await,
            2 => run_whatsapp(ctx).await,
            3 => run_ivr(ctx).await,
            4 => {
                print_schemes(&ctx.catalog);
                Ok(())
            }
            5 => run_logout(ctx).await,
            6 => {
                print_usage_instructions();
                Ok(())
            }
            _ => break,
        };

        if let Err(e) = result {
            print_error(&format!("{:#}", e));
        }
    }

    Ok(())
}

fn ask(prompt: &str, given: Option<String>) -> Result<String> {
    match given {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()
            .map(|value| value.trim().to_string())
            .context("Failed to read registration field"),
    }
}

/// Registration surface: on success the identity is stored and chat starts
pub async fn run_register(
    ctx: &AppContext,
    username: Option<String>,
    email: Option<String>,
    phone: Option<String>,
) -> Result<()> {
    print_banner(" Yojana-Setu ", "Create your Citizen Account");

    let request = RegistrationRequest {
        username: ask("Pura Naam (Full Name)", username)?,
        email: ask("Email Address", email)?,
        phone: ask("Mobile Number", phone)?,
    };

    let progress = spinner("Creating account...");
    let result = ctx.client.register(&request).await;
    progress.finish_and_clear();

    if let Err(e) = result {
        print_error(&format!("Registration failed: {}", e));
        return Ok(());
    }

    let identity = Identity {
        name: request.username,
        phone: request.phone,
        email: Some(request.email),
    };
    persist_identity(&ctx.store, &identity)
        .await
        .context("Failed to save identity")?;
    info!("Registered {}", identity.phone);
    print_success(&format!("Welcome, {}!", identity.name));

    run_chat(ctx).await
}

async fn run_logout(ctx: &AppContext) -> Result<()> {
    forget_identity(&ctx.store)
        .await
        .context("Failed to clear identity")?;
    print_success("Logged out. You will chat as a guest.");
    Ok(())
}

fn print_schemes(catalog: &SchemeCatalog) {
    println!("{}", "Schemes on the portal:".cyan().bold());
    for (name, template) in catalog.iter() {
        let keys: Vec<&str> = template.fields.iter().map(|f| f.key.as_str()).collect();
        println!("  {} {}", "•".yellow(), name.bold());
        println!("    {} ({})", template.title, template.subtitle.dimmed());
        println!("    fields: {}", keys.join(", ").dimmed());
    }
    println!();
}

/// Prints portal events while the portal is visible; the final form is
/// printed once a cycle is submitted.
async fn print_portal_events(
    mut events: mpsc::UnboundedReceiver<PortalEvent>,
    visible: watch::Receiver<bool>,
    state: SharedFormState,
    catalog: Arc<SchemeCatalog>,
) {
    while let Some(event) = events.recv().await {
        if !*visible.borrow() {
            debug!("Portal hidden, not printing {:?}", event);
            continue;
        }
        println!("{}", format_portal_event(&event));
        if let PortalEvent::PhaseChanged { phase, .. } = &event {
            if phase.is_terminal() {
                println!("{}", render_form(&state.snapshot(), &catalog));
            }
        }
    }
}

/// Chat surface with the embedded portal
pub async fn run_chat(ctx: &AppContext) -> Result<()> {
    let session = ctx.session().await;

    let (link, endpoint) = portal_channel(8);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let portal = PortalSurface::new(ctx.catalog.clone(), FillTimings::from(&ctx.config.portal))
        .with_events(events_tx)
        .spawn(endpoint);

    let revealer = Arc::new(PortalRevealer::new(link, ctx.config.portal.reveal_timeout()));
    let printer = tokio::spawn(print_portal_events(
        events_rx,
        revealer.subscribe_visibility(),
        portal.state(),
        ctx.catalog.clone(),
    ));

    let dispatcher =
        ChatDispatcher::new(ctx.backend(), session).with_directive_handler(revealer.clone());

    let who = if dispatcher.session().is_guest() {
        "Guest".to_string()
    } else {
        dispatcher.session().name().to_string()
    };
    print_banner(" Yojana Setu AI ", &format!("Chatting as {}", who));
    print_chat_help();
    for turn in dispatcher.transcript() {
        print_assistant(&turn.content);
    }
    println!();

    let you = "You".green().bold();
    while let Some(input) = read_input(&you)? {
        if input.is_empty() {
            continue;
        }
        if is_exit(&input) {
            println!("Exiting chat session.");
            break;
        }
        match input.as_str() {
            "/portal" => {
                let note = if revealer.toggle_visibility() {
                    "Portal shown."
                } else {
                    "Portal hidden."
                };
                println!("{}", note.dimmed());
                continue;
            }
            "/status" => {
                println!("{}", render_form(&portal.snapshot(), &ctx.catalog));
                continue;
            }
            "/help" => {
                print_chat_help();
                continue;
            }
            _ => {}
        }

        let progress = spinner("Analyzing Profile...");
        let outcome = dispatcher.send(&input).await;
        progress.finish_and_clear();

        match outcome {
            Ok(outcome) => {
                print_assistant(&outcome.reply.content);
                if let Some(directive) = outcome.directive {
                    println!(
                        "{}",
                        format!("Opening the {} portal...", directive.scheme_name).dimmed()
                    );
                }
            }
            Err(DispatchError::EmptyMessage) => {}
            Err(e) => print_warning(&e.to_string()),
        }
        println!();
    }

    // Let an in-progress reveal finish or time out before tearing down
    if let Some(Err(e)) = revealer.settle().await {
        debug!("Last reveal did not reach the portal: {}", e);
    }
    drop(portal);
    printer.abort();
    Ok(())
}

/// Standalone portal: reveal with a typed payload and wait for the cycle
pub async fn run_portal_demo(ctx: &AppContext, scheme: &str, details: &str) -> Result<()> {
    let details = parse_details(details).context("--details must be a flat JSON object")?;
    if !ctx.catalog.contains(scheme) {
        let known: Vec<&str> = ctx.catalog.names().collect();
        bail!("Unknown scheme '{}'. Known schemes: {}", scheme, known.join(", "));
    }

    let (link, endpoint) = portal_channel(8);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let portal = PortalSurface::new(ctx.catalog.clone(), FillTimings::from(&ctx.config.portal))
        .with_events(events_tx)
        .spawn(endpoint);

    let revealer = PortalRevealer::new(link, ctx.config.portal.reveal_timeout());
    revealer.reveal(AutoFillPayload {
        scheme: scheme.to_string(),
        details,
    });
    match revealer.settle().await {
        Some(Ok(())) => {}
        Some(Err(e)) => bail!("Portal did not accept the form: {}", e),
        None => bail!("Portal reveal was cancelled"),
    }

    println!("{}", render_form(&portal.snapshot(), &ctx.catalog));
    while let Some(event) = events_rx.recv().await {
        println!("{}", format_portal_event(&event));
        if let PortalEvent::PhaseChanged { phase, .. } = &event {
            if phase.is_terminal() {
                break;
            }
        }
    }
    println!();
    println!("{}", render_form(&portal.snapshot(), &ctx.catalog));
    Ok(())
}

/// Writes the default configuration unless one exists
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        print_warning(&format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ));
        return Ok(());
    }
    SetuConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    print_success(&format!("Wrote {}", path.display()));
    Ok(())
}
