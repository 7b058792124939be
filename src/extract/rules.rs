//! Declarative extraction rules
//!
//! A rule maps one [`Field`] to a CSS selector, a [`Source`] describing how text
//! fragments are pulled from each matched node, an [`InputTransform`] and a chain of
//! [`OutputTransform`]s. Rules are plain configuration (deserializable from TOML) and are
//! compiled once into [`CompiledRules`] before the crawl starts.

use crate::extract::normalize::{normalized_join, DEFAULT_SEPARATOR};
use crate::ConfigError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Record fields that are filled from the detail document
///
/// `jobId`, `url` and `applyUrl` are not listed: they come from the response URL and
/// the page context, never from a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Company,
    Location,
    Description,
    Industry,
    BaseSalary,
    Benefits,
    Requirements,
    Skills,
    WorkHours,
    JobType,
    JobSector,
    Contact,
}

impl Field {
    /// Fields that must be present for a record to be built
    pub const REQUIRED: [Field; 4] = [
        Field::Title,
        Field::Company,
        Field::Location,
        Field::Description,
    ];

    /// Returns the record name of this field
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Company => "company",
            Self::Location => "location",
            Self::Description => "description",
            Self::Industry => "industry",
            Self::BaseSalary => "baseSalary",
            Self::Benefits => "benefits",
            Self::Requirements => "requirements",
            Self::Skills => "skills",
            Self::WorkHours => "workHours",
            Self::JobType => "jobType",
            Self::JobSector => "jobSector",
            Self::Contact => "contact",
        }
    }

    /// Returns true if a record cannot be built without this field
    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Returns true for free-text fields whose fragments are joined by default
    pub fn is_multi_fragment(&self) -> bool {
        matches!(
            self,
            Self::Description | Self::Requirements | Self::Skills | Self::Benefits
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where the text fragments of a matched node come from
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Source {
    /// Every descendant text node is one fragment
    #[default]
    Text,

    /// The value of an attribute
    Attr { name: String },

    /// First text node following a label node (`<strong>Salary:</strong> 30k`)
    FollowingText { label: String },

    /// Text of the first following sibling element named `tag`
    FollowingElement { label: String, tag: String },
}

/// Transform applied to raw fragments before the output chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputTransform {
    /// Pass raw fragments through unchanged
    Identity,

    /// Trim each fragment and drop whitespace-only ones
    Trim,
}

/// One step of a rule's output chain
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OutputTransform {
    /// Keep only the first fragment
    TakeFirst,

    /// Normalized join of all fragments
    Join {
        #[serde(default = "default_separator")]
        separator: String,
    },

    /// Replace each fragment by capture group 1 of `pattern`, dropping non-matches
    Capture { pattern: String },

    /// Trim each fragment, drop blank ones and append `suffix`
    Suffix { suffix: String },
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// Declarative rule for one record field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractionRule {
    /// The field this rule fills
    pub field: Field,

    /// CSS selector evaluated against the whole document
    pub selector: String,

    /// How fragments are read from each matched node
    #[serde(default)]
    pub source: Source,

    /// Input transform; defaults to `identity` for multi-fragment fields, `trim` otherwise
    #[serde(default)]
    pub input: Option<InputTransform>,

    /// Output chain; defaults to a single `join` for multi-fragment fields, take-first otherwise
    #[serde(default)]
    pub output: Vec<OutputTransform>,
}

impl ExtractionRule {
    /// Rule reading all descendant text of `selector`
    pub fn text(field: Field, selector: &str) -> Self {
        Self {
            field,
            selector: selector.to_string(),
            source: Source::Text,
            input: None,
            output: Vec::new(),
        }
    }

    /// Rule reading the text that follows a `<strong>` label
    pub fn labelled(field: Field, label: &str) -> Self {
        Self {
            source: Source::FollowingText {
                label: label.to_string(),
            },
            ..Self::text(field, "strong")
        }
    }

    /// Replaces the output chain
    pub fn with_output(mut self, output: Vec<OutputTransform>) -> Self {
        self.output = output;
        self
    }

    fn effective_input(&self) -> InputTransform {
        match self.input {
            Some(input) => input,
            None if self.field.is_multi_fragment() => InputTransform::Identity,
            None => InputTransform::Trim,
        }
    }

    fn effective_output(&self) -> Vec<OutputTransform> {
        if self.output.is_empty() && self.field.is_multi_fragment() {
            vec![OutputTransform::Join {
                separator: default_separator(),
            }]
        } else {
            self.output.clone()
        }
    }
}

/// The static set of extraction rules for one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub rules: Vec<ExtractionRule>,
}

impl RuleSet {
    /// Creates a rule set from explicit rules
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    /// Rules for simplylawjobs.com detail pages
    pub fn simply_law_jobs() -> Self {
        Self::new(vec![
            ExtractionRule::text(Field::Title, "h1.job_title"),
            ExtractionRule::text(
                Field::Company,
                r#"div.columns.small-12.medium-4.large-4.details a[target="_blank"]"#,
            ),
            ExtractionRule {
                source: Source::FollowingElement {
                    label: "Location:".to_string(),
                    tag: "a".to_string(),
                },
                ..ExtractionRule::text(Field::Location, "strong")
            },
            ExtractionRule::labelled(Field::BaseSalary, "Salary:"),
            ExtractionRule::labelled(Field::JobType, "Job type:"),
            ExtractionRule::labelled(Field::JobSector, "Job sector:"),
            ExtractionRule::labelled(Field::Contact, "Contact:"),
            ExtractionRule::labelled(Field::Requirements, "Experience:"),
            ExtractionRule::text(
                Field::Description,
                "div.description.allow-bulletpoints.hide-for-small",
            ),
        ])
    }

    /// Parses every selector and pattern
    ///
    /// Fails if a selector or regex is invalid, a field has more than one rule,
    /// or a required field has no rule at all.
    pub fn compile(&self) -> Result<CompiledRules, ConfigError> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            if !seen.insert(rule.field) {
                return Err(ConfigError::InvalidRule {
                    field: rule.field.to_string(),
                    message: "field has more than one rule".to_string(),
                });
            }
            compiled.push(CompiledRule::compile(rule)?);
        }

        for field in Field::REQUIRED {
            if !seen.contains(&field) {
                return Err(ConfigError::InvalidRule {
                    field: field.to_string(),
                    message: "required field has no rule".to_string(),
                });
            }
        }

        Ok(CompiledRules { rules: compiled })
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::simply_law_jobs()
    }
}

#[derive(Debug, Clone)]
enum CompiledOutput {
    TakeFirst,
    Join(String),
    Capture(Regex),
    Suffix(String),
}

impl CompiledOutput {
    fn apply(&self, values: Vec<String>) -> Vec<String> {
        match self {
            Self::TakeFirst => values.into_iter().take(1).collect(),
            Self::Join(separator) => vec![normalized_join(&values, separator)],
            Self::Capture(pattern) => values
                .iter()
                .filter_map(|value| {
                    let captures = pattern.captures(value)?;
                    captures.get(1).map(|m| m.as_str().to_string())
                })
                .collect(),
            Self::Suffix(suffix) => values
                .iter()
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}{}", value, suffix))
                .collect(),
        }
    }
}

/// A rule with its selector and patterns parsed
#[derive(Debug, Clone)]
pub struct CompiledRule {
    field: Field,
    selector: Selector,
    source: Source,
    input: InputTransform,
    output: Vec<CompiledOutput>,
}

impl CompiledRule {
    fn compile(rule: &ExtractionRule) -> Result<Self, ConfigError> {
        let selector =
            Selector::parse(&rule.selector).map_err(|e| ConfigError::InvalidSelector {
                selector: rule.selector.clone(),
                message: e.to_string(),
            })?;

        let output = rule
            .effective_output()
            .into_iter()
            .map(|step| match step {
                OutputTransform::TakeFirst => Ok(CompiledOutput::TakeFirst),
                OutputTransform::Join { separator } => Ok(CompiledOutput::Join(separator)),
                OutputTransform::Suffix { suffix } => Ok(CompiledOutput::Suffix(suffix)),
                OutputTransform::Capture { pattern } => {
                    let regex = Regex::new(&pattern).map_err(|e| ConfigError::InvalidRule {
                        field: rule.field.to_string(),
                        message: e.to_string(),
                    })?;
                    if regex.captures_len() < 2 {
                        return Err(ConfigError::InvalidRule {
                            field: rule.field.to_string(),
                            message: format!("pattern '{}' has no capture group", pattern),
                        });
                    }
                    Ok(CompiledOutput::Capture(regex))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            field: rule.field,
            selector,
            source: rule.source.clone(),
            input: rule.effective_input(),
            output,
        })
    }

    /// The field this rule fills
    pub fn field(&self) -> Field {
        self.field
    }

    /// Collects the raw fragments this rule matches in `document`
    pub fn fragments(&self, document: &Html) -> Vec<String> {
        let mut fragments = Vec::new();

        for node in document.select(&self.selector) {
            match &self.source {
                Source::Text => fragments.extend(node.text().map(str::to_string)),
                Source::Attr { name } => {
                    if let Some(value) = node.value().attr(name) {
                        fragments.push(value.to_string());
                    }
                }
                Source::FollowingText { label } => {
                    if !has_label(&node, label) {
                        continue;
                    }
                    let text = node.next_siblings().find_map(|sibling| {
                        sibling.value().as_text().map(|text| text.text.to_string())
                    });
                    fragments.extend(text);
                }
                Source::FollowingElement { label, tag } => {
                    if !has_label(&node, label) {
                        continue;
                    }
                    let element = node
                        .next_siblings()
                        .filter_map(ElementRef::wrap)
                        .find(|sibling| sibling.value().name() == tag.as_str());
                    fragments.extend(element.map(|el| el.text().collect::<String>()));
                }
            }
        }

        fragments
    }

    /// Runs the input transform and output chain over raw fragments
    ///
    /// Returns `None` when nothing non-empty is left.
    pub fn finish(&self, fragments: Vec<String>) -> Option<String> {
        let mut values = match self.input {
            InputTransform::Identity => fragments,
            InputTransform::Trim => fragments
                .into_iter()
                .map(|fragment| fragment.trim().to_string())
                .filter(|fragment| !fragment.is_empty())
                .collect(),
        };

        for step in &self.output {
            values = step.apply(values);
        }

        values
            .into_iter()
            .next()
            .filter(|value| !value.trim().is_empty())
    }

    /// Evaluates the rule against a document
    pub fn evaluate(&self, document: &Html) -> Option<String> {
        self.finish(self.fragments(document))
    }
}

fn has_label(node: &ElementRef<'_>, label: &str) -> bool {
    node.text().collect::<String>().contains(label)
}

/// A compiled, immutable rule set shared by every detail-page handler
#[derive(Debug, Clone)]
pub struct CompiledRules {
    rules: Vec<CompiledRule>,
}

impl CompiledRules {
    /// Iterates over the compiled rules
    pub fn iter(&self) -> impl Iterator<Item = &CompiledRule> {
        self.rules.iter()
    }

    /// Returns the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
