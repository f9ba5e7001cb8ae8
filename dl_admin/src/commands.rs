use draft_league::{SettingsOverrides, draft::SpeciesId};
use thiserror::Error;

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No command word was given.
    #[error("Missing command. Run with --help to see available commands")]
    MissingCommand,
    /// A required positional argument is absent.
    #[error("'{command}' requires {what} (e.g., '{usage}')")]
    MissingArgument {
        command: String,
        what: &'static str,
        usage: &'static str,
    },
    /// Leftover arguments after a complete command.
    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),
    /// A `key=value` setting could not be read.
    #[error("Invalid setting '{0}'. Use team=N, draw=N, steal=N or TIER=SCALE")]
    InvalidSetting(String),
    /// Battle outcome other than win or loss.
    #[error("Invalid result '{0}'. Use 'win' or 'loss'")]
    InvalidOutcome(String),
    /// Unrecognized command.
    #[error("Unrecognized command '{0}'. Run with --help to see available commands")]
    UnrecognizedCommand(String),
}

/// One operator action against the tournament file.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create {
        name: String,
        overrides: SettingsOverrides,
    },
    List,
    Show {
        name: String,
    },
    Clear,
    Register {
        name: String,
        player: String,
    },
    Player {
        name: String,
        player: String,
    },
    Start {
        name: String,
    },
    Choose {
        name: String,
        player: String,
        choices: Vec<SpeciesId>,
    },
    Pair {
        name: String,
        first: String,
        second: String,
    },
    Result {
        name: String,
        player: String,
        won: bool,
    },
    Steal {
        name: String,
        player: String,
        stolen: Vec<SpeciesId>,
        swapped: Vec<SpeciesId>,
    },
    Swap {
        name: String,
        player: String,
        kept: Vec<SpeciesId>,
    },
    Usage {
        tier: String,
        species: SpeciesId,
    },
    Random {
        tier: String,
        species: Option<SpeciesId>,
    },
}

/// Parse the positional arguments left after flags into a [`Command`].
///
/// Species lists are comma separated; `-` stands for an empty list.
pub fn parse_command<S: AsRef<str>>(args: &[S]) -> Result<Command, ParseError> {
    let parts: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let Some((&word, rest)) = parts.split_first() else {
        return Err(ParseError::MissingCommand);
    };
    let mut rest = Positional {
        command: word,
        parts: rest,
    };

    let command = match word {
        "list" => Command::List,
        "clear" => Command::Clear,
        "create" => {
            let name = rest.next("a tournament name", "create cup1 team=6 gen8ou=0.6")?;
            let overrides = parse_settings(rest.drain())?;
            Command::Create { name, overrides }
        }
        "show" => Command::Show {
            name: rest.next("a tournament name", "show cup1")?,
        },
        "start" => Command::Start {
            name: rest.next("a tournament name", "start cup1")?,
        },
        "register" | "player" => {
            const USAGE: &str = "register cup1 ash";
            let name = rest.next("a tournament name", USAGE)?;
            let player = rest.next("a player id", USAGE)?;
            if word == "register" {
                Command::Register { name, player }
            } else {
                Command::Player { name, player }
            }
        }
        "choose" => {
            const USAGE: &str = "choose cup1 ash Pikachu,Eevee";
            Command::Choose {
                name: rest.next("a tournament name", USAGE)?,
                player: rest.next("a player id", USAGE)?,
                choices: species_list(&rest.next("a species list", USAGE)?),
            }
        }
        "pair" => {
            const USAGE: &str = "pair cup1 ash gary";
            Command::Pair {
                name: rest.next("a tournament name", USAGE)?,
                first: rest.next("two player ids", USAGE)?,
                second: rest.next("two player ids", USAGE)?,
            }
        }
        "result" => {
            const USAGE: &str = "result cup1 ash win";
            let name = rest.next("a tournament name", USAGE)?;
            let player = rest.next("a player id", USAGE)?;
            let won = match rest.next("an outcome", USAGE)?.as_str() {
                "win" | "won" => true,
                "loss" | "lost" => false,
                other => return Err(ParseError::InvalidOutcome(other.to_string())),
            };
            Command::Result { name, player, won }
        }
        "steal" => {
            const USAGE: &str = "steal cup1 ash Onix Pikachu";
            Command::Steal {
                name: rest.next("a tournament name", USAGE)?,
                player: rest.next("a player id", USAGE)?,
                stolen: species_list(&rest.next("the stolen species", USAGE)?),
                swapped: species_list(&rest.next("the swapped species", USAGE)?),
            }
        }
        "swap" => {
            const USAGE: &str = "swap cup1 gary Pikachu";
            Command::Swap {
                name: rest.next("a tournament name", USAGE)?,
                player: rest.next("a player id", USAGE)?,
                kept: species_list(&rest.next("the kept species", USAGE)?),
            }
        }
        "usage" => {
            const USAGE: &str = "usage gen8ou Pikachu";
            Command::Usage {
                tier: rest.next("a tier", USAGE)?,
                species: rest.next("a species", USAGE)?,
            }
        }
        "random" => Command::Random {
            tier: rest.next("a tier", "random gen8ou")?,
            species: rest.next_opt(),
        },
        other => return Err(ParseError::UnrecognizedCommand(other.to_string())),
    };

    match rest.parts.first() {
        Some(extra) => Err(ParseError::UnexpectedArgument(extra.to_string())),
        None => Ok(command),
    }
}

struct Positional<'a> {
    command: &'a str,
    parts: &'a [&'a str],
}

impl<'a> Positional<'a> {
    fn next(&mut self, what: &'static str, usage: &'static str) -> Result<String, ParseError> {
        match self.parts.split_first() {
            Some((first, rest)) => {
                self.parts = rest;
                Ok(first.to_string())
            }
            None => Err(ParseError::MissingArgument {
                command: self.command.to_string(),
                what,
                usage,
            }),
        }
    }

    fn next_opt(&mut self) -> Option<String> {
        let (first, rest) = self.parts.split_first()?;
        self.parts = rest;
        Some(first.to_string())
    }

    fn drain(&mut self) -> &'a [&'a str] {
        std::mem::take(&mut self.parts)
    }
}

/// Parse `team=N draw=N steal=N TIER=SCALE ...`
fn parse_settings(parts: &[&str]) -> Result<SettingsOverrides, ParseError> {
    let mut overrides = SettingsOverrides::default();
    for part in parts {
        let invalid = || ParseError::InvalidSetting(part.to_string());
        let (key, value) = part.split_once('=').ok_or_else(invalid)?;
        match key {
            "team" => overrides.team_size = Some(value.parse().map_err(|_| invalid())?),
            "draw" => overrides.draw_size = Some(value.parse().map_err(|_| invalid())?),
            "steal" => overrides.steal_size = Some(value.parse().map_err(|_| invalid())?),
            "" => return Err(invalid()),
            tier => {
                let scale: f64 = value.parse().map_err(|_| invalid())?;
                overrides = overrides.with_tier(tier, scale);
            }
        }
    }
    Ok(overrides)
}

fn species_list(raw: &str) -> Vec<SpeciesId> {
    if raw == "-" {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Result<Command, ParseError> {
        let args: Vec<&str> = line.split_ascii_whitespace().collect();
        parse_command(&args)
    }

    #[test]
    fn test_parse_list_and_clear() {
        assert_eq!(parse("list"), Ok(Command::List));
        assert_eq!(parse("clear"), Ok(Command::Clear));
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse(""), Err(ParseError::MissingCommand));
    }

    #[test]
    fn test_parse_create_with_settings() {
        let cmd = parse("create cup1 team=2 draw=3 steal=1 gen8ou=0.6 gen8uu=1").unwrap();
        assert_eq!(
            cmd,
            Command::Create {
                name: "cup1".to_string(),
                overrides: SettingsOverrides::with_sizes(2, 3)
                    .with_steal_size(1)
                    .with_tier("gen8ou", 0.6)
                    .with_tier("gen8uu", 1.0),
            }
        );
    }

    #[test]
    fn test_parse_create_without_settings_uses_defaults() {
        let Command::Create { overrides, .. } = parse("create cup1").unwrap() else {
            panic!("expected create");
        };
        assert_eq!(overrides, SettingsOverrides::default());
    }

    #[test]
    fn test_parse_create_with_bad_setting() {
        for bad in ["team=six", "gen8ou", "=1", "gen8ou=high"] {
            assert_eq!(
                parse(&format!("create cup1 {bad}")),
                Err(ParseError::InvalidSetting(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_parse_choose_species_list() {
        let cmd = parse("choose cup1 ash Pikachu,Eevee,").unwrap();
        assert_eq!(
            cmd,
            Command::Choose {
                name: "cup1".to_string(),
                player: "ash".to_string(),
                choices: vec!["Pikachu".to_string(), "Eevee".to_string()],
            }
        );
    }

    #[test]
    fn test_parse_steal_with_empty_lists() {
        let cmd = parse("steal cup1 ash - -").unwrap();
        assert_eq!(
            cmd,
            Command::Steal {
                name: "cup1".to_string(),
                player: "ash".to_string(),
                stolen: vec![],
                swapped: vec![],
            }
        );
    }

    #[test]
    fn test_parse_result_outcomes() {
        assert!(matches!(parse("result cup1 ash win"), Ok(Command::Result { won: true, .. })));
        assert!(matches!(parse("result cup1 ash loss"), Ok(Command::Result { won: false, .. })));
        assert_eq!(
            parse("result cup1 ash draw"),
            Err(ParseError::InvalidOutcome("draw".to_string()))
        );
    }

    #[test]
    fn test_parse_missing_argument() {
        let err = parse("pair cup1 ash").unwrap_err();
        assert!(matches!(err, ParseError::MissingArgument { ref command, .. } if command == "pair"));
        assert!(err.to_string().contains("pair cup1 ash gary"));
    }

    #[test]
    fn test_parse_extra_argument() {
        assert_eq!(
            parse("show cup1 cup2"),
            Err(ParseError::UnexpectedArgument("cup2".to_string()))
        );
    }

    #[test]
    fn test_parse_unrecognized_command() {
        assert_eq!(
            parse("fold"),
            Err(ParseError::UnrecognizedCommand("fold".to_string()))
        );
    }

    #[test]
    fn test_parse_usage_lookups() {
        assert_eq!(
            parse("usage gen8ou Pikachu"),
            Ok(Command::Usage {
                tier: "gen8ou".to_string(),
                species: "Pikachu".to_string(),
            })
        );
        assert!(matches!(
            parse("usage gen8ou"),
            Err(ParseError::MissingArgument { what: "a species", .. })
        ));

        assert_eq!(
            parse("random gen8ou"),
            Ok(Command::Random {
                tier: "gen8ou".to_string(),
                species: None,
            })
        );
        assert_eq!(
            parse("random gen8ou Eevee"),
            Ok(Command::Random {
                tier: "gen8ou".to_string(),
                species: Some("Eevee".to_string()),
            })
        );
        assert_eq!(
            parse("random gen8ou Eevee Onix"),
            Err(ParseError::UnexpectedArgument("Onix".to_string()))
        );
    }
}
