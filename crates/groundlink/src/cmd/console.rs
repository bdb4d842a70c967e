//! Operator line syntax.
//!
//! ```text
//! group.name value   set a variable
//! group.name         query a variable
//! .name value        same group as last time
//! group. value       same name as last time
//! value              last variable again
//! (empty)            query the last variable
//! k u e d ...        shortcuts
//! ```

use std::sync::Arc;

use groundlink_registry::{Registry, Update, Value};

use crate::exit::{registry_error, CliError, CliResult, USAGE};

const SYNTAX: &str = "invalid format, expected '[[group].[name] ]value'";

fn shortcut(token: &str) -> Option<(&'static str, &'static str, Option<Value>)> {
    let entry = match token {
        "k" => ("switches", "softKill", Some(Value::Bool(true))),
        "u" => ("switches", "softKill", Some(Value::Bool(false))),
        "e" => ("controller", "enabled", Some(Value::Bool(true))),
        "d" => ("controller", "enabled", Some(Value::Bool(false))),
        "ye" => ("yawConf", "enabled", Some(Value::Bool(true))),
        "pe" => ("pitchConf", "enabled", Some(Value::Bool(true))),
        "re" => ("rollConf", "enabled", Some(Value::Bool(true))),
        "yd" => ("yawConf", "enabled", Some(Value::Bool(false))),
        "pd" => ("pitchConf", "enabled", Some(Value::Bool(false))),
        "rd" => ("rollConf", "enabled", Some(Value::Bool(false))),
        "yaw" => ("placement", "yaw", None),
        "pitch" => ("placement", "pitch", None),
        "roll" => ("placement", "roll", None),
        _ => return None,
    };
    Some(entry)
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Turns operator lines into updates, remembering the last variable used.
pub struct Console {
    registry: Arc<Registry>,
    last_group: String,
    last_name: String,
}

impl Console {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            last_group: String::new(),
            last_name: String::new(),
        }
    }

    /// Parse one line. `Ok(None)` when there is nothing to send.
    pub fn parse(&mut self, line: &str) -> CliResult<Option<Update>> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let valid = |part: &str| part.is_empty() || is_identifier(part);
        let path = head
            .split_once('.')
            .filter(|&(group, name)| valid(group) && valid(name));

        let (group, name, value) = match path {
            Some((group, name)) => {
                if rest.contains(char::is_whitespace) {
                    return Err(CliError::new(USAGE, SYNTAX));
                }
                (group, name, rest)
            }
            None => {
                if !rest.is_empty() {
                    return Err(CliError::new(USAGE, SYNTAX));
                }
                if let Some((group, name, value)) = shortcut(head) {
                    if value.is_none() {
                        self.remember(group, name);
                    }
                    return self.bind(group, name, value).map(Some);
                }
                ("", "", head)
            }
        };

        let group = if group.is_empty() {
            self.last_group.clone()
        } else {
            group.to_string()
        };
        let name = if name.is_empty() {
            self.last_name.clone()
        } else {
            name.to_string()
        };
        if group.is_empty() || name.is_empty() {
            if line.is_empty() {
                return Ok(None);
            }
            return Err(CliError::new(USAGE, "no variable selected yet"));
        }
        self.remember(&group, &name);

        let value = if value.is_empty() {
            None
        } else {
            Some(Value::parse(value).ok_or_else(|| {
                CliError::new(USAGE, format!("cannot parse value '{value}'"))
            })?)
        };
        self.bind(&group, &name, value).map(Some)
    }

    fn remember(&mut self, group: &str, name: &str) {
        self.last_group = group.to_string();
        self.last_name = name.to_string();
    }

    fn bind(&self, group: &str, name: &str, value: Option<Value>) -> CliResult<Update> {
        self.registry
            .bind(group, name, value)
            .map_err(|err| registry_error("bind", err))
    }
}
