/*
 * plots.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Plot rendering.
//!
//! A segment whose value is a `plot(..)` call is not displayed as maths.
//! The engine checks the plot options, settles the alt text and hands the
//! [`Plot`] to a [`PlotRenderer`]; the renderer's output replaces the segment.
//! Plot problems are reported as warnings and never fail validation.

use castext_cas::{PlotParameter, PlotRequest};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Options a renderer understands, besides ranges such as `[x,-2,3]`.
const SUPPORTED_OPTIONS: &[&str] = &[
    "alt",
    "adapt_depth",
    "axes",
    "box",
    "color",
    "grid2d",
    "label",
    "legend",
    "logx",
    "logy",
    "nticks",
    "point_type",
    "style",
    "xlabel",
    "xtics",
    "y",
    "ylabel",
    "ytics",
    "yx_ratio",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlotError {
    #[error("Plot error: the alt tag definition must be a string, but is not.")]
    AltNotAString,

    #[error("Plot error: the following plot options are not supported: {}.", .0.join(", "))]
    UnsupportedOptions(Vec<String>),

    #[error("Plot error: {0}")]
    Render(String),
}

/// A checked plot, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plot {
    pub request: PlotRequest,
    /// Alt text, either given with `[alt,"..."]` or generated from the call.
    pub alt: String,
}

impl Plot {
    /// Check the options of `request` and settle the alt text.
    pub fn from_request(request: PlotRequest) -> Result<Plot, PlotError> {
        let mut alt = None;
        let mut unsupported = Vec::new();
        for parameter in request.parameters.iter().filter(|p| !is_range(p)) {
            match parameter.name.as_str() {
                "alt" => alt = Some(alt_text(parameter)?),
                name if SUPPORTED_OPTIONS.contains(&name) => {}
                name => unsupported.push(name.to_string()),
            }
        }
        if !unsupported.is_empty() {
            return Err(PlotError::UnsupportedOptions(unsupported));
        }

        let alt = alt.unwrap_or_else(|| {
            let parameters: Vec<String> = request
                .parameters
                .iter()
                .map(PlotParameter::to_input)
                .collect();
            format!(
                "Auto-generated plot of {} with parameters [{}]",
                request.drawn(),
                parameters.join(",")
            )
        });
        Ok(Plot { request, alt })
    }

    /// Identifier derived from the plot call; equal calls share an id.
    pub fn id(&self) -> String {
        let digest = Sha256::digest(self.request.call().as_bytes());
        let hex = format!("{digest:x}");
        hex[..16].to_string()
    }
}

/// `[x,-2,3]` names a plot variable and its range.
fn is_range(parameter: &PlotParameter) -> bool {
    parameter.values.len() == 2 && !SUPPORTED_OPTIONS.contains(&parameter.name.as_str())
}

fn alt_text(parameter: &PlotParameter) -> Result<String, PlotError> {
    match parameter.values.as_slice() {
        [value] if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') => {
            Ok(value[1..value.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\"))
        }
        _ => Err(PlotError::AltNotAString),
    }
}

/// Trait for turning a checked plot into output text.
pub trait PlotRenderer {
    /// Produce the text that replaces the plot segment.
    fn render(&self, plot: &Plot) -> Result<String, PlotError>;
}

/// Renderer that emits an `<img>` tag for where the image of each plot
/// would be served. It draws nothing itself.
#[derive(Debug, Clone)]
pub struct PlaceholderPlots {
    base_url: String,
}

impl PlaceholderPlots {
    pub fn new(base_url: impl Into<String>) -> Self {
        PlaceholderPlots {
            base_url: base_url.into(),
        }
    }
}

impl Default for PlaceholderPlots {
    fn default() -> Self {
        Self::new("plots")
    }
}

impl PlotRenderer for PlaceholderPlots {
    fn render(&self, plot: &Plot) -> Result<String, PlotError> {
        Ok(format!(
            "<img src='{}/plot-{}.png' alt='{}' />",
            self.base_url.trim_end_matches('/'),
            plot.id(),
            escape_attribute(&plot.alt)
        ))
    }
}

fn escape_attribute(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parameter(name: &str, values: &[&str]) -> PlotParameter {
        PlotParameter {
            name: name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn request(parameters: Vec<PlotParameter>) -> PlotRequest {
        PlotRequest {
            expressions: vec!["x^3".to_string()],
            parameters,
        }
    }

    #[test]
    fn test_generated_alt_text() {
        let plot = Plot::from_request(request(vec![parameter("x", &["-2", "3"])])).unwrap();
        assert_eq!(plot.alt, "Auto-generated plot of x^3 with parameters [[x,-2,3]]");
    }

    #[test]
    fn test_given_alt_text() {
        let plot = Plot::from_request(request(vec![
            parameter("x", &["-2", "3"]),
            parameter("alt", &["\"Hello \\\"World\\\"!\""]),
        ]))
        .unwrap();
        assert_eq!(plot.alt, "Hello \"World\"!");
    }

    #[test]
    fn test_alt_must_be_a_string() {
        let err = Plot::from_request(request(vec![parameter("alt", &["x"])])).unwrap_err();
        assert_eq!(err, PlotError::AltNotAString);
        assert_eq!(
            err.to_string(),
            "Plot error: the alt tag definition must be a string, but is not."
        );
    }

    #[test]
    fn test_unsupported_options() {
        let err = Plot::from_request(request(vec![
            parameter("x", &["-2", "3"]),
            parameter("notoption", &["\"\""]),
            parameter("grid2d", &[]),
            parameter("shade", &[]),
        ]))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Plot error: the following plot options are not supported: notoption, shade."
        );
    }

    #[test]
    fn test_placeholder_output() {
        let plot = Plot::from_request(request(vec![
            parameter("x", &["-2", "3"]),
            parameter("alt", &["\"it's <b>\""]),
        ]))
        .unwrap();
        let html = PlaceholderPlots::new("/media/").render(&plot).unwrap();
        assert_eq!(
            html,
            format!("<img src='/media/plot-{}.png' alt='it&#39;s &lt;b&gt;' />", plot.id())
        );
        assert_eq!(plot.id().len(), 16);

        let same = Plot::from_request(plot.request.clone()).unwrap();
        assert_eq!(same.id(), plot.id());
        let other = Plot::from_request(request(vec![parameter("x", &["0", "1"])])).unwrap();
        assert_ne!(other.id(), plot.id());
    }
}
