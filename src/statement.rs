//! Parameterized statement templates.
//!
//! A template is plain query text with named placeholders: `?name?` renders
//! as the escaped, single-quoted value of `name`, `?name!` renders the value
//! verbatim (for identifiers or raw SQL fragments). Parsing happens once at
//! construction; building the final query string happens on demand against a
//! concrete connection and is memoized until a parameter changes.

use std::cell::RefCell;
use std::fmt;

use log::trace;

use crate::connection::Connection;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
struct Parameter {
    value: Option<String>,
    unescaped: bool,
}

#[derive(Debug, Default)]
struct BuildCache {
    query: String,
    connection: usize,
    valid: bool,
}

/// A compiled query template: literal code fragments interleaved with
/// name-addressable parameter slots.
#[derive(Debug, Default)]
pub struct Statement {
    code: Vec<String>,
    parameters: Vec<(String, Parameter)>,
    cache: RefCell<BuildCache>,
}

impl Statement {
    /// Parse a template. Fails on an unterminated `?name` parameter.
    pub fn new(template: &str) -> Result<Self> {
        let mut statement = Self::default();
        statement.assign(template)?;
        Ok(statement)
    }

    /// Replace the template, reparsing it. On failure the statement is left
    /// unchanged.
    pub fn assign(&mut self, template: &str) -> Result<()> {
        let (code, parameters) = parse(template)?;
        self.code = code;
        self.parameters = parameters;
        self.invalidate();
        Ok(())
    }

    /// Build the final query string against the given connection's escaping
    /// rules. Memoized until a parameter changes, the template is
    /// reassigned, or a different connection is used.
    pub fn query(&self, connection: &Connection) -> Result<String> {
        let connection_id = connection as *const Connection as usize;
        {
            let cache = self.cache.borrow();
            if cache.valid && cache.connection == connection_id {
                return Ok(cache.query.clone());
            }
        }
        let built = self.build(connection)?;
        trace!("built statement: {built}");
        *self.cache.borrow_mut() = BuildCache {
            query: built.clone(),
            connection: connection_id,
            valid: true,
        };
        Ok(built)
    }

    /// Index of the named parameter, if the template contains it.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|(n, _)| n == name)
    }

    /// Set a parameter value by name or index; the value is stored as its
    /// text rendering.
    pub fn set<K: ParameterKey, V: fmt::Display>(&mut self, key: K, value: V) -> Result<()> {
        let index = key.resolve(self)?;
        self.parameters[index].1.value = Some(value.to_string());
        self.invalidate();
        Ok(())
    }

    /// Clear a parameter's value, keeping the slot registered. An unset
    /// escaped parameter renders as `null`; an unset unescaped parameter
    /// contributes nothing.
    pub fn set_null<K: ParameterKey>(&mut self, key: K) -> Result<()> {
        let index = key.resolve(self)?;
        self.parameters[index].1.value = None;
        self.invalidate();
        Ok(())
    }

    /// Number of parameter slots.
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Whether the statement holds no template at all.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.parameters.is_empty()
    }

    /// Drop the template and all parameters.
    pub fn clear(&mut self) {
        self.code.clear();
        self.parameters.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.cache.get_mut().valid = false;
    }

    fn build(&self, connection: &Connection) -> Result<String> {
        let fragments = self.code.len();
        let parameters = self.parameters.len();
        if fragments.abs_diff(parameters) > 1 {
            return Err(Error::StatementMismatch {
                fragments,
                parameters,
            });
        }
        let mut out = String::new();
        for i in 0..fragments.max(parameters) {
            if let Some(fragment) = self.code.get(i) {
                out.push_str(fragment);
            }
            if let Some((_, parameter)) = self.parameters.get(i) {
                match (&parameter.value, parameter.unescaped) {
                    (Some(value), true) => out.push_str(value),
                    (Some(value), false) => {
                        out.push('\'');
                        out.push_str(&connection.escape_str(value)?);
                        out.push('\'');
                    }
                    (None, true) => {}
                    (None, false) => out.push_str("null"),
                }
            }
        }
        Ok(out)
    }
}

/// Scan the template character by character. `?` toggles parameter mode and
/// flushes the text scanned since the last toggle; `!` inside parameter mode
/// closes the slot as unescaped. Code fragments and parameter slots strictly
/// alternate, so empty fragments between adjacent parameters are kept.
fn parse(template: &str) -> Result<(Vec<String>, Vec<(String, Parameter)>)> {
    let mut code = Vec::new();
    let mut parameters: Vec<(String, Parameter)> = Vec::new();
    let mut start = 0;
    let mut in_parameter = false;
    for (i, c) in template.char_indices() {
        match c {
            '?' => {
                let text = &template[start..i];
                if in_parameter {
                    parameters.push((text.to_owned(), Parameter::default()));
                } else {
                    code.push(text.to_owned());
                }
                in_parameter = !in_parameter;
                start = i + 1;
            }
            '!' if in_parameter => {
                parameters.push((
                    template[start..i].to_owned(),
                    Parameter {
                        value: None,
                        unescaped: true,
                    },
                ));
                in_parameter = false;
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_parameter {
        return Err(Error::UnclosedParameter {
            query: template.to_owned(),
        });
    }
    if start < template.len() {
        code.push(template[start..].to_owned());
    }
    Ok((code, parameters))
}

/// Lookup key for a parameter slot: a name or a 0-based index.
pub trait ParameterKey {
    fn resolve(&self, statement: &Statement) -> Result<usize>;
}

impl ParameterKey for usize {
    fn resolve(&self, statement: &Statement) -> Result<usize> {
        if *self < statement.parameters.len() {
            Ok(*self)
        } else {
            Err(Error::ParameterIndexOutOfBounds {
                index: *self,
                count: statement.parameters.len(),
            })
        }
    }
}

impl ParameterKey for &str {
    fn resolve(&self, statement: &Statement) -> Result<usize> {
        statement.find(self).ok_or_else(|| Error::UnknownParameter {
            name: (*self).to_owned(),
        })
    }
}
