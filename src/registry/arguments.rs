use crate::errors::ProbeError;
use crate::registry::types::{stringify, ValueType};
use crate::utils::prompt::Prompter;
use colored::Colorize;
use serde_json::{Map, Value};
use std::fmt;

/// A declared, resolvable parameter of a request. Environment/session
/// injection happens one level up; an `Argument` is always user-facing.
#[derive(Debug, Clone)]
pub enum Argument {
    Required(RequiredArgument),
    Defaulted(DefaultedArgument),
}

#[derive(Debug, Clone)]
pub struct RequiredArgument {
    pub name: String,
    pub value_type: ValueType,
}

#[derive(Debug, Clone)]
pub struct DefaultedArgument {
    pub name: String,
    pub value_type: ValueType,
    /// Stored raw as declared; casting applies to user input, never to the
    /// declared default itself.
    pub default: Value,
}

impl Argument {
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Argument::Required(RequiredArgument {
            name: name.into(),
            value_type,
        })
    }

    pub fn defaulted(name: impl Into<String>, value_type: ValueType, default: Value) -> Self {
        Argument::Defaulted(DefaultedArgument {
            name: name.into(),
            value_type,
            default,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Argument::Required(arg) => &arg.name,
            Argument::Defaulted(arg) => &arg.name,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Argument::Required(arg) => arg.value_type,
            Argument::Defaulted(arg) => arg.value_type,
        }
    }

    /// Resolves this argument to a typed value. Supplied values always win,
    /// even over an explicit use-defaults request; a supplied value that
    /// fails to cast is the caller's error and propagates. Missing values
    /// fall back to the default or to interactive prompting.
    pub fn get_value(
        &self,
        supplied: &Map<String, Value>,
        use_defaults: bool,
        prompter: &dyn Prompter,
    ) -> Result<Value, ProbeError> {
        if let Some(raw) = supplied.get(self.name()) {
            return Ok(self.value_type().cast(raw)?);
        }
        match self {
            Argument::Required(_) => self.prompt_loop(prompter, false).map(|value| {
                // nullable=false means the loop always yields a value
                value.unwrap_or(Value::Null)
            }),
            Argument::Defaulted(arg) => {
                if use_defaults {
                    return Ok(arg.default.clone());
                }
                match self.prompt_loop(prompter, true)? {
                    Some(value) => Ok(value),
                    None => Ok(arg.default.clone()),
                }
            }
        }
    }

    /// Prompts until the input casts. A cast failure is reported and the
    /// prompt retried indefinitely; the operator drives termination. With
    /// `nullable`, empty input means "take the default" on every attempt.
    fn prompt_loop(
        &self,
        prompter: &dyn Prompter,
        nullable: bool,
    ) -> Result<Option<Value>, ProbeError> {
        let label = self.to_string();
        loop {
            let raw = self.value_type().read_input(prompter, &label)?;
            if nullable && raw.is_empty() {
                return Ok(None);
            }
            match self.value_type().cast(&Value::String(raw.clone())) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => {
                    println!("{}", err.to_string().red());
                }
            }
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Required(arg) => {
                if arg.value_type.is_constrained() {
                    write!(f, "{} [type: {}]", arg.name, arg.value_type)
                } else {
                    write!(f, "{}", arg.name)
                }
            }
            Argument::Defaulted(arg) => {
                let default = arg
                    .value_type
                    .repr_value(&arg.default)
                    .unwrap_or_else(|_| stringify(&arg.default));
                if arg.value_type.is_constrained() {
                    write!(f, "{} [default: {}, type: {}]", arg.name, default, arg.value_type)
                } else {
                    write!(f, "{} [default: {}]", arg.name, default)
                }
            }
        }
    }
}
