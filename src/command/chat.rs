//! Types to make chat commands less of a pain in the butt.

use twilight_model::application::command::CommandOptionType;
use twilight_model::application::interaction::application_command::{
    CommandData, CommandDataOption, CommandOptionValue,
};

use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// An easy way to index into a chat input interaction's arguments.
pub struct Arguments<'a> {
    top: &'a CommandData,
}

impl<'a> Arguments<'a> {
    /// Create a new `Arguments`.
    pub fn new(top: &'a CommandData) -> Arguments<'a> {
        Arguments { top }
    }

    /// The name of the command.
    pub fn name(&self) -> &'a str {
        &self.top.name
    }

    /// Gets an integer argument.
    pub fn get_integer(&self, name: &str) -> Result<Option<i64>, ArgError> {
        self.get(name)
            .map(|option| match option.value {
                CommandOptionValue::Integer(value) => Ok(value),
                ref value => Err(ArgError::InvalidType(value.kind())),
            })
            .transpose()
    }

    /// Gets an integer argument that must be present.
    pub fn require_integer(&self, name: &'static str) -> Result<i64, ArgError> {
        self.get_integer(name)?.ok_or(ArgError::Missing(name))
    }

    fn get(&self, name: &str) -> Option<&'a CommandDataOption> {
        self.top.options.iter().find(|option| option.name == name)
    }
}

/// An error returned by any of the `Arguments::get_*` functions.
#[derive(Debug)]
pub enum ArgError {
    InvalidType(CommandOptionType),
    Missing(&'static str),
}

impl Display for ArgError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ArgError::InvalidType(ty) => write!(f, "unexpected type {:?}", ty),
            ArgError::Missing(name) => write!(f, "missing argument `{}`", name),
        }
    }
}

impl Error for ArgError {}

#[cfg(test)]
mod tests {
    use super::*;

    use twilight_model::application::command::CommandType;
    use twilight_model::id::Id;

    fn command_data(name: &str, options: Vec<CommandDataOption>) -> CommandData {
        CommandData {
            guild_id: None,
            id: Id::new(1),
            name: name.to_owned(),
            kind: CommandType::ChatInput,
            options,
            resolved: None,
            target_id: None,
        }
    }

    #[test]
    fn reads_integers() {
        let data = command_data(
            "race_start",
            vec![CommandDataOption {
                name: String::from("goal"),
                value: CommandOptionValue::Integer(7),
            }],
        );
        let args = Arguments::new(&data);

        assert_eq!(args.name(), "race_start");
        assert_eq!(args.get_integer("goal").unwrap(), Some(7));
        assert_eq!(args.get_integer("other").unwrap(), None);
    }

    #[test]
    fn rejects_wrong_types() {
        let data = command_data(
            "race_start",
            vec![CommandDataOption {
                name: String::from("goal"),
                value: CommandOptionValue::String(String::from("seven")),
            }],
        );
        let args = Arguments::new(&data);

        assert!(matches!(
            args.get_integer("goal"),
            Err(ArgError::InvalidType(CommandOptionType::String))
        ));
        assert!(matches!(
            Arguments::new(&command_data("race_start", Vec::new())).require_integer("goal"),
            Err(ArgError::Missing("goal"))
        ));
    }
}
