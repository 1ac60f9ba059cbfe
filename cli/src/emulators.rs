use anyhow::Result;
use colored::*;
use setu_channels::{CallStatus, IvrError, IvrSession, WhatsAppChat};
use tokio::sync::mpsc;

use crate::app::{is_exit, read_input, AppContext};
use crate::output::{print_banner, print_whatsapp_message, print_warning};

/// WhatsApp-style thread; `/mic` toggles the simulated recorder
pub async fn run_whatsapp(ctx: &AppContext) -> Result<()> {
    let mut chat = WhatsAppChat::new(ctx.backend(), &ctx.config.channels);

    print_banner(" Yojana Setu AI ", "Tier 1: WhatsApp AI • online");
    println!("{}", "Type a message, /mic to record a voice note, exit to leave.".dimmed());
    for message in chat.messages() {
        print_whatsapp_message(message);
    }

    let you = "You".green().bold();
    while let Some(input) = read_input(&you)? {
        if is_exit(&input) {
            break;
        }
        if input == "/mic" {
            let before = chat.messages().len();
            if chat.toggle_recording() {
                println!("{}", "🎙  Recording... type /mic again to send".red());
            } else {
                for message in &chat.messages()[before..] {
                    print_whatsapp_message(message);
                }
            }
            continue;
        }
        if let Some(reply) = chat.send(&input).await {
            print_whatsapp_message(reply);
        }
    }
    Ok(())
}

/// IVR call; log lines are printed as they happen
pub async fn run_ivr(ctx: &AppContext) -> Result<()> {
    let (log_tx, mut log_rx) = mpsc::unbounded_channel();
    let mut call = IvrSession::new(ctx.backend(), &ctx.config.channels).with_observer(log_tx);
    let printer = tokio::spawn(async move {
        while let Some(entry) = log_rx.recv().await {
            println!("{}", entry.to_string().truecolor(0x4a, 0xde, 0x80));
        }
    });

    print_banner(" 📞 Yojana-Setu IVR ", "Tier 2/3: IVR Voice Bot");
    println!(
        "{}",
        "/call to dial, /end to hang up, /log for the call log, exit to leave. Speak by typing while connected."
            .dimmed()
    );

    let prompt = "☎".cyan().bold();
    while let Some(input) = read_input(&prompt)? {
        if input.is_empty() {
            continue;
        }
        if is_exit(&input) {
            break;
        }
        match input.as_str() {
            "/call" => {
                if !call.start_call() {
                    print_warning(&format!("Call already {}", call.status()));
                }
            }
            "/end" => {
                if !call.end_call() {
                    print_warning("No call in progress");
                }
            }
            "/log" => {
                for entry in call.log() {
                    println!("{}", entry);
                }
            }
            _ => match call.speak(&input).await {
                Ok(()) => {}
                Err(IvrError::NotConnected) if call.status() == CallStatus::Calling => {
                    print_warning("Still connecting, please wait...");
                }
                Err(e) => print_warning(&format!("{}. Use /call first.", e)),
            },
        }
    }

    if call.status() != CallStatus::Idle {
        call.end_call();
    }
    drop(call);
    // Drain lines written by the hang-up before leaving
    if let Err(e) = printer.await {
        tracing::debug!("IVR log printer stopped: {}", e);
    }
    Ok(())
}
