//! Path template parsing.
//!
//! Route indexes describe paths with PCRE-style named groups embedded in
//! otherwise literal paths:
//!
//! ```text
//! /wp/v2/posts/(?P<parent>[\d]+)/revisions/(?P<id>[\d]+)
//! ```
//!
//! A template is split on `/` (outside of groups) into segments, each either a
//! literal or exactly one named parameter. Patterns may contain character
//! classes, escapes, nested groups and even `/`.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use regex::Regex;

use crate::error::DescriptorError;

/// A named, pattern-constrained path parameter.
#[derive(Debug, Clone)]
pub struct PathParam {
    name: String,
    pattern: String,
    matcher: Regex,
}

impl PathParam {
    /// Parameter name, as declared in `(?P<name>...)`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The regular expression fragment, exactly as written in the template.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns `true` if `value` matches the whole pattern.
    pub fn accepts(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }
}

impl PartialEq for PathParam {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.pattern == other.pattern
    }
}

impl Eq for PathParam {}

/// One `/`-separated component of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    /// A fixed path segment such as `posts`.
    Literal(String),
    /// A named parameter such as `(?P<id>[\d]+)`.
    Param(PathParam),
}

impl PathToken {
    /// The setter name this token contributes: the literal text or the parameter name.
    pub fn name(&self) -> &str {
        match self {
            Self::Literal(text) => text,
            Self::Param(param) => param.name(),
        }
    }
}

/// A parsed path template.
///
/// ## Examples
///
/// ```rust
/// use wpapi::route::{PathTemplate, PathToken};
///
/// let template = PathTemplate::parse(r"/wp/v2/customendpoint/(?P<thing>[\w-]+)").unwrap();
/// assert_eq!(template.tokens().len(), 4);
/// assert!(matches!(&template.tokens()[3], PathToken::Param(p) if p.name() == "thing"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    tokens: Vec<PathToken>,
}

impl PathTemplate {
    /// Parses a path template.
    ///
    /// A trailing optional slash (`/?`) is dropped and empty segments are skipped.
    ///
    /// ## Errors
    ///
    /// Returns a [`DescriptorError`] when a group is unbalanced, unnamed, has an
    /// invalid name or pattern, or shares its segment with literal text.
    pub fn parse(template: &str) -> Result<Self, DescriptorError> {
        let body = template.strip_suffix("/?").unwrap_or(template);
        let mut chars = body.char_indices().peekable();
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut param: Option<PathParam> = None;

        while let Some((position, c)) = chars.next() {
            match c {
                '/' => flush_segment(template, &mut literal, &mut param, &mut tokens)?,
                '(' => {
                    let parsed = read_group(template, &mut chars, position)?;
                    if param.is_some() || !literal.is_empty() {
                        return Err(DescriptorError::MixedSegment {
                            route: template.to_string(),
                            segment: format!("{literal}(?P<{}>...)", parsed.name),
                        });
                    }
                    param = Some(parsed);
                }
                ')' => {
                    return Err(DescriptorError::UnbalancedGroup {
                        route: template.to_string(),
                        position,
                    })
                }
                _ => literal.push(c),
            }
        }
        flush_segment(template, &mut literal, &mut param, &mut tokens)?;

        Ok(Self {
            source: template.to_string(),
            tokens,
        })
    }

    /// The template string this was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// All tokens, in path order.
    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    /// The named parameters, in declaration order.
    pub fn params(&self) -> impl Iterator<Item = &PathParam> {
        self.tokens.iter().filter_map(|token| match token {
            PathToken::Param(param) => Some(param),
            PathToken::Literal(_) => None,
        })
    }

    /// Returns the tokens below `namespace`, or `None` when the template does
    /// not start with the namespace's segments.
    pub fn below_namespace(&self, namespace: &str) -> Option<&[PathToken]> {
        let mut rest = self.tokens.as_slice();
        for part in namespace.split('/').filter(|part| !part.is_empty()) {
            match rest.split_first() {
                Some((PathToken::Literal(text), tail)) if text == part => rest = tail,
                _ => return None,
            }
        }
        Some(rest)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn flush_segment(
    route: &str,
    literal: &mut String,
    param: &mut Option<PathParam>,
    tokens: &mut Vec<PathToken>,
) -> Result<(), DescriptorError> {
    match param.take() {
        Some(parsed) if !literal.is_empty() => Err(DescriptorError::MixedSegment {
            route: route.to_string(),
            segment: format!("(?P<{}>...){literal}", parsed.name),
        }),
        Some(parsed) => {
            tokens.push(PathToken::Param(parsed));
            Ok(())
        }
        None => {
            if !literal.is_empty() {
                tokens.push(PathToken::Literal(std::mem::take(literal)));
            }
            Ok(())
        }
    }
}

/// Reads a `(?P<name>pattern)` group whose opening parenthesis sits at `start`.
fn read_group(
    route: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    start: usize,
) -> Result<PathParam, DescriptorError> {
    let unbalanced = || DescriptorError::UnbalancedGroup {
        route: route.to_string(),
        position: start,
    };

    let unnamed = || DescriptorError::UnnamedGroup {
        route: route.to_string(),
        position: start,
    };

    // both `(?P<name>` and `(?<name>` are accepted
    match chars.next() {
        Some((_, '?')) => {}
        Some(_) => return Err(unnamed()),
        None => return Err(unbalanced()),
    }
    if let Some(&(_, 'P')) = chars.peek() {
        chars.next();
    }
    match chars.next() {
        Some((_, '<')) => {}
        Some(_) => return Err(unnamed()),
        None => return Err(unbalanced()),
    }

    let mut name = String::new();
    loop {
        match chars.next() {
            Some((_, '>')) => break,
            Some((_, c)) => name.push(c),
            None => return Err(unbalanced()),
        }
    }
    if !is_valid_name(&name) {
        return Err(DescriptorError::InvalidParamName {
            route: route.to_string(),
            name,
        });
    }

    let mut pattern = String::new();
    let mut depth = 1usize;
    let mut in_class = false;
    loop {
        let (_, c) = chars.next().ok_or_else(unbalanced)?;
        match c {
            '\\' => {
                let (_, escaped) = chars.next().ok_or_else(unbalanced)?;
                pattern.push(c);
                pattern.push(escaped);
                continue;
            }
            '[' if !in_class => {
                in_class = true;
                pattern.push(c);
                // `]` directly after `[` or `[^` is a literal member of the class
                if let Some(&(_, '^')) = chars.peek() {
                    pattern.push('^');
                    chars.next();
                }
                if let Some(&(_, ']')) = chars.peek() {
                    pattern.push(']');
                    chars.next();
                }
                continue;
            }
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        pattern.push(c);
    }

    let matcher = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
        DescriptorError::InvalidPattern {
            route: route.to_string(),
            name: name.clone(),
            source: Box::new(source),
        }
    })?;

    Ok(PathParam {
        name,
        pattern,
        matcher,
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(template: &PathTemplate) -> Vec<&str> {
        template.tokens().iter().map(PathToken::name).collect()
    }

    #[test]
    fn parses_literal_only_templates() {
        let template = PathTemplate::parse("/wp/v2/posts").unwrap();
        assert_eq!(names(&template), vec!["wp", "v2", "posts"]);
        assert_eq!(template.params().count(), 0);
    }

    #[test]
    fn parses_character_class_patterns() {
        let template = PathTemplate::parse(r"/wp/v2/customendpoint/(?P<thing>[\w-]+)").unwrap();
        let param = template.params().next().unwrap();
        assert_eq!(param.name(), "thing");
        assert_eq!(param.pattern(), r"[\w-]+");
        assert!(param.accepts("foo-bar"));
        assert!(!param.accepts("foo/bar"));
    }

    #[test]
    fn preserves_parameter_order() {
        let template =
            PathTemplate::parse(r"/wp/v2/posts/(?P<parent>[\d]+)/revisions/(?P<id>[\d]+)").unwrap();
        let params: Vec<_> = template.params().map(PathParam::name).collect();
        assert_eq!(params, vec!["parent", "id"]);
        assert_eq!(names(&template), vec!["wp", "v2", "posts", "parent", "revisions", "id"]);
    }

    #[test]
    fn keeps_slashes_and_nested_groups_inside_patterns() {
        let template =
            PathTemplate::parse(r"/wp/v2/plugins/(?P<plugin>[^.\/]+(?:\/[^.\/]+)?)").unwrap();
        assert_eq!(template.tokens().len(), 4);
        let param = template.params().next().unwrap();
        assert_eq!(param.pattern(), r"[^.\/]+(?:\/[^.\/]+)?");
        assert!(param.accepts("akismet/akismet"));
    }

    #[test]
    fn treats_leading_bracket_as_class_member() {
        let template = PathTemplate::parse(r"/ns/items/(?P<key>[])(]+)").unwrap();
        assert_eq!(template.params().next().unwrap().pattern(), "[])(]+");
    }

    #[test]
    fn drops_optional_trailing_slash() {
        let template = PathTemplate::parse("/wp/v2/settings/?").unwrap();
        assert_eq!(names(&template), vec!["wp", "v2", "settings"]);
    }

    #[test]
    fn rejects_unbalanced_groups() {
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<id>[\d]+"),
            Err(DescriptorError::UnbalancedGroup { .. })
        ));
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<id"),
            Err(DescriptorError::UnbalancedGroup { .. })
        ));
        assert!(matches!(
            PathTemplate::parse("/ns/items)"),
            Err(DescriptorError::UnbalancedGroup { .. })
        ));
    }

    #[test]
    fn accepts_named_groups_without_p() {
        let template = PathTemplate::parse(r"/ns/items/(?<id>\d+)").unwrap();
        assert_eq!(template.params().next().unwrap().name(), "id");
    }

    #[test]
    fn rejects_unnamed_groups() {
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/([\d]+)"),
            Err(DescriptorError::UnnamedGroup { .. })
        ));
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<>[\d]+)"),
            Err(DescriptorError::InvalidParamName { .. })
        ));
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<1id>[\d]+)"),
            Err(DescriptorError::InvalidParamName { .. })
        ));
    }

    #[test]
    fn rejects_invalid_patterns() {
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<id>[\d+)"),
            Err(DescriptorError::UnbalancedGroup { .. }) | Err(DescriptorError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<id>a{2,1})"),
            Err(DescriptorError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn rejects_mixed_segments() {
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/v(?P<id>[\d]+)"),
            Err(DescriptorError::MixedSegment { .. })
        ));
        assert!(matches!(
            PathTemplate::parse(r"/ns/items/(?P<id>[\d]+).json"),
            Err(DescriptorError::MixedSegment { .. })
        ));
    }

    #[test]
    fn strips_namespace_segments() {
        let template = PathTemplate::parse(r"/wp/v2/posts/(?P<id>[\d]+)").unwrap();
        let rest = template.below_namespace("wp/v2").unwrap();
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].name(), "posts");
        assert!(template.below_namespace("myplugin/v1").is_none());
        assert!(template.below_namespace("wp/v2/posts/extra/deep").is_none());
    }
}
