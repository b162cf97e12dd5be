use crate::prompt::{ContractRequest, CustomContractRequest, GenerationRequest};
use crate::template;

/// A client command parsed from one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Templates,
    Generate(ContractRequest),
    Show,
    Xp,
    Connect,
    Disconnect,
    Wallet,
    Login {
        email: String,
        display_name: Option<String>,
    },
    Logout,
    WhoAmI,
    Deploy,
    History,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  templates                                 List contract templates
  generate <number|name>                    Generate a contract for a template
  custom <name> | <type> | [requirements]   Generate a custom contract
  show                                      Show the current contract
  xp                                        Show XP details
  connect | disconnect | wallet             Manage the wallet account
  login <email> [display name]              Sign in
  logout | whoami                           Sign out / show the signed-in user
  deploy                                    Deploy the current contract
  history                                   List recorded deployments
  help | quit";

/// Parse one line of client input.
///
/// Errors carry the message to show the user.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "templates" | "list" => Ok(Command::Templates),
        "generate" | "gen" => {
            let name = template::resolve(rest)
                .ok_or_else(|| format!("Unknown template '{rest}'. Try `templates`."))?;
            GenerationRequest::new(&name)
                .map(|request| Command::Generate(request.into()))
                .map_err(|e| e.to_string())
        }
        "custom" => {
            let mut fields = rest.splitn(3, '|').map(str::trim);
            let name = fields.next().unwrap_or_default();
            let kind = fields.next().unwrap_or_default();
            let requirements = fields.next();
            CustomContractRequest::new(name, kind, requirements)
                .map(|request| Command::Generate(request.into()))
                .map_err(|e| format!("{e}. Usage: custom <name> | <type> | [requirements]"))
        }
        "show" => Ok(Command::Show),
        "xp" => Ok(Command::Xp),
        "connect" => Ok(Command::Connect),
        "disconnect" => Ok(Command::Disconnect),
        "wallet" => Ok(Command::Wallet),
        "login" => {
            let (email, display_name) = match rest.split_once(char::is_whitespace) {
                Some((email, name)) => (email, Some(name.trim().to_string())),
                None => (rest, None),
            };
            if email.is_empty() {
                return Err("Usage: login <email> [display name]".to_string());
            }
            Ok(Command::Login {
                email: email.to_string(),
                display_name: display_name.filter(|name| !name.is_empty()),
            })
        }
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::WhoAmI),
        "deploy" => Ok(Command::Deploy),
        "history" => Ok(Command::History),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{other}'. Try `help`.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate_by_index_and_name() {
        let expected = Command::Generate(GenerationRequest::new("ERC20 Token").unwrap().into());
        assert_eq!(parse("generate 1").unwrap(), expected);
        assert_eq!(parse("  generate   erc20 token ").unwrap(), expected);
    }

    #[test]
    fn test_parse_generate_requires_template() {
        assert!(parse("generate").is_err());
        assert!(parse("generate 99").is_err());
    }

    #[test]
    fn test_parse_custom() {
        let Command::Generate(ContractRequest::Custom(request)) =
            parse("custom Vault | Timelock | release after 30 days").unwrap()
        else {
            panic!("expected a custom request");
        };
        assert_eq!(request.name(), "Vault");
        assert_eq!(request.kind(), "Timelock");
        assert_eq!(request.requirements(), Some("release after 30 days"));
    }

    #[test]
    fn test_parse_custom_missing_type() {
        let err = parse("custom Vault").unwrap_err();
        assert!(err.starts_with("name and type are required"));
    }

    #[test]
    fn test_parse_login() {
        assert_eq!(
            parse("login ada@example.com Ada Lovelace").unwrap(),
            Command::Login {
                email: "ada@example.com".to_string(),
                display_name: Some("Ada Lovelace".to_string())
            }
        );
        assert_eq!(
            parse("login ada@example.com").unwrap(),
            Command::Login {
                email: "ada@example.com".to_string(),
                display_name: None
            }
        );
        assert!(parse("login").is_err());
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse("templates").unwrap(), Command::Templates);
        assert_eq!(parse("DEPLOY").unwrap(), Command::Deploy);
        assert_eq!(parse("exit").unwrap(), Command::Quit);
        assert!(parse("dance").is_err());
    }
}
