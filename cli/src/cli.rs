use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Terminal client for the Yojana-Setu AI caseworker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "SETU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the caseworker backend
    #[arg(long, env = "SETU_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a citizen account, then start chatting
    Register {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Chat with the caseworker; directives open the mock portal
    Chat,

    /// WhatsApp-style emulator
    Whatsapp,

    /// IVR call emulator
    Ivr,

    /// Run the mock portal's auto-fill for one scheme
    Portal {
        /// Scheme name, e.g. "PM Kisan"
        #[arg(long)]
        scheme: String,

        /// JSON object of field values
        #[arg(long, default_value = "{}")]
        details: String,
    },

    /// List the schemes the portal knows
    Schemes,

    /// Forget the stored citizen identity
    Logout,

    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

impl Command {
    /// Whether the command talks to the backend at all
    pub fn needs_backend(&self) -> bool {
        matches!(
            self,
            Command::Register { .. } | Command::Chat | Command::Whatsapp | Command::Ivr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_portal_command() {
        let args = Args::try_parse_from([
            "yojana-setu",
            "--backend-url",
            "http://127.0.0.1:9000",
            "portal",
            "--scheme",
            "PM Kisan",
            "--details",
            r#"{"aadhar":"1234"}"#,
        ])
        .unwrap();

        assert_eq!(args.backend_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert_eq!(
            args.command,
            Some(Command::Portal {
                scheme: "PM Kisan".to_string(),
                details: r#"{"aadhar":"1234"}"#.to_string(),
            })
        );
        assert!(!args.command.unwrap().needs_backend());
    }

    #[test]
    fn test_no_command_means_home_menu() {
        let args = Args::try_parse_from(["yojana-setu"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn test_register_fields_are_optional() {
        let args = Args::try_parse_from(["yojana-setu", "register", "--phone", "9000000001"])
            .unwrap();
        let command = args.command.unwrap();
        assert!(command.needs_backend());
        assert_eq!(
            command,
            Command::Register {
                username: None,
                email: None,
                phone: Some("9000000001".to_string()),
            }
        );
    }

    #[test]
    fn test_init_config_flag() {
        let args = Args::try_parse_from(["yojana-setu", "init-config", "--force"]).unwrap();
        assert_eq!(args.command, Some(Command::InitConfig { force: true }));
    }
}
