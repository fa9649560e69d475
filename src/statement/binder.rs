//! Translates named placeholders into Postgres positional parameters.
//!
//! Only the three window parameters are recognised. `::` casts, text inside
//! single or double quotes and SQL comments are copied verbatim. A name used
//! more than once maps to the same position.

use std::fmt;

/// Window parameter a stored statement may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementParameter {
    StartDate,
    EndDate,
    DayRange,
}

impl StatementParameter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start_date" => Some(Self::StartDate),
            "end_date" => Some(Self::EndDate),
            "day_range" => Some(Self::DayRange),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::StartDate => "start_date",
            Self::EndDate => "end_date",
            Self::DayRange => "day_range",
        }
    }
}

impl fmt::Display for StatementParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.name())
    }
}

/// Statement text with `$n` placeholders and the parameter for each `n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundStatement {
    pub sql: String,
    /// `parameters[n - 1]` is bound to `$n`
    pub parameters: Vec<StatementParameter>,
}

pub fn bind_named_parameters(sql: &str) -> BoundStatement {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut parameters: Vec<StatementParameter> = Vec::new();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(q) = quote {
            out.push(c);
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }

        match c {
            '-' if chars.get(i + 1) == Some(&'-') => {
                let end = chars[i..]
                    .iter()
                    .position(|&c| c == '\n')
                    .map_or(chars.len(), |offset| i + offset + 1);
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let end = block_comment_end(&chars, i);
                out.extend(&chars[i..end]);
                i = end;
            }
            '\'' | '"' => {
                quote = Some(c);
                out.push(c);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_')
                {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();

                match StatementParameter::from_name(&name) {
                    Some(parameter) => {
                        let position = match parameters.iter().position(|p| *p == parameter) {
                            Some(existing) => existing + 1,
                            None => {
                                parameters.push(parameter);
                                parameters.len()
                            }
                        };
                        out.push('$');
                        out.push_str(&position.to_string());
                        i = end;
                    }
                    None => {
                        out.push(':');
                        i += 1;
                    }
                }
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    BoundStatement {
        sql: out,
        parameters,
    }
}

/// Index just past the block comment opened at `start`. Block comments
/// nest in Postgres; an unterminated one runs to the end of the text.
fn block_comment_end(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match (chars[i], chars.get(i + 1)) {
            ('/', Some('*')) => {
                depth += 1;
                i += 2;
            }
            ('*', Some('/')) => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    chars.len()
}
