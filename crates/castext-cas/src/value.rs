//! Values returned by an evaluator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value of an evaluated expression.
///
/// `Display` renders the value back in the evaluator's input syntax, so a
/// value can be re-bound as an expression (this is how `foreach` binds its
/// iteration variables).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CasValue {
    /// `true` or `false`
    Bool(bool),
    /// An ordered list, `[a,b,c]`
    List(Vec<CasValue>),
    /// A set, `{a,b,c}`
    Set(Vec<CasValue>),
    /// Any other value, in input syntax
    Atom(String),
}

impl CasValue {
    /// Build an atom from input syntax.
    pub fn atom(text: impl Into<String>) -> Self {
        CasValue::Atom(text.into())
    }

    /// The boolean this value represents, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CasValue::Bool(b) => Some(*b),
            CasValue::Atom(text) => match text.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// The elements of a list or set.
    pub fn elements(&self) -> Option<&[CasValue]> {
        match self {
            CasValue::List(items) | CasValue::Set(items) => Some(items),
            _ => None,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[CasValue]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for CasValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CasValue::Bool(b) => write!(f, "{b}"),
            CasValue::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            CasValue::Set(items) => {
                f.write_str("{")?;
                write_joined(f, items)?;
                f.write_str("}")
            }
            CasValue::Atom(text) => f.write_str(text),
        }
    }
}

/// One parameter of a plot call, such as the range `[x,-2,3]` or the option
/// `[alt,"A cubic"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotParameter {
    /// The parameter name: the plot variable or the option name
    pub name: String,
    /// The remaining elements, in input syntax
    pub values: Vec<String>,
}

/// A request to render a plot, produced when an expression evaluates to a
/// `plot(..)` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotRequest {
    /// The expressions to draw, in input syntax
    pub expressions: Vec<String>,
    /// Ranges and options, in call order
    pub parameters: Vec<PlotParameter>,
}

impl PlotParameter {
    /// The parameter in input syntax: `[x,-2,3]`, or the bare name.
    pub fn to_input(&self) -> String {
        if self.values.is_empty() {
            self.name.clone()
        } else {
            format!("[{},{}]", self.name, self.values.join(","))
        }
    }
}

impl PlotRequest {
    /// The drawn expressions in input syntax, as a list when there are several.
    pub fn drawn(&self) -> String {
        match self.expressions.as_slice() {
            [single] => single.clone(),
            many => format!("[{}]", many.join(",")),
        }
    }

    /// The input syntax of the call this request came from.
    pub fn call(&self) -> String {
        let mut args = vec![self.drawn()];
        args.extend(self.parameters.iter().map(PlotParameter::to_input));
        format!("plot({})", args.join(","))
    }
}

/// A successful evaluation: the value plus its LaTeX display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The evaluated value
    pub value: CasValue,
    /// LaTeX rendering of the value, without math delimiters
    pub display: String,
    /// Set when the value is a plot to be rendered by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<PlotRequest>,
}

impl Evaluation {
    /// Pair a value with its display form.
    pub fn new(value: CasValue, display: impl Into<String>) -> Self {
        Self {
            value,
            display: display.into(),
            plot: None,
        }
    }

    /// Attach the plot request this value describes.
    pub fn with_plot(mut self, plot: Option<PlotRequest>) -> Self {
        self.plot = plot;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<CasValue> {
        values.iter().map(|v| CasValue::atom(v.to_string())).collect()
    }

    #[test]
    fn test_display_round_trips_input_syntax() {
        assert_eq!(CasValue::Bool(false).to_string(), "false");
        assert_eq!(CasValue::List(ints(&[1, 2, 3])).to_string(), "[1,2,3]");
        assert_eq!(CasValue::Set(ints(&[4, 5])).to_string(), "{4,5}");
        assert_eq!(
            CasValue::List(vec![CasValue::List(ints(&[1, 2])), CasValue::List(ints(&[3]))])
                .to_string(),
            "[[1,2],[3]]"
        );
        assert_eq!(CasValue::atom("sin(x)").to_string(), "sin(x)");
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(CasValue::Bool(true).as_bool(), Some(true));
        assert_eq!(CasValue::atom(" false ").as_bool(), Some(false));
        assert_eq!(CasValue::atom("unknown").as_bool(), None);
        assert_eq!(CasValue::List(vec![]).as_bool(), None);
    }

    #[test]
    fn test_elements() {
        let list = CasValue::List(ints(&[1, 2]));
        assert_eq!(list.elements().map(<[CasValue]>::len), Some(2));
        assert!(CasValue::atom("x").elements().is_none());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(CasValue::Bool(true)).unwrap();
        assert_eq!(json["type"], "bool");
        assert_eq!(json["value"], true);
    }

    #[test]
    fn test_plot_request_call() {
        let request = PlotRequest {
            expressions: vec!["x^3".into()],
            parameters: vec![
                PlotParameter {
                    name: "x".into(),
                    values: vec!["-2".into(), "3".into()],
                },
                PlotParameter {
                    name: "grid2d".into(),
                    values: vec![],
                },
            ],
        };
        assert_eq!(request.call(), "plot(x^3,[x,-2,3],grid2d)");
    }
}
