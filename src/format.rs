use std::{fmt, str::FromStr};

/// Errors from parsing an output format string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("format string must contain exactly one %s placeholder, found {0}")]
    PlaceholderCount(usize),

    #[error("unsupported directive %{0} in format string")]
    UnsupportedDirective(char),

    #[error("format string ends with a lone %")]
    TrailingPercent,
}

/// A format string with exactly one `%s` placeholder. `%%` stands for `%`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentifierFormat {
    prefix: String,
    suffix: String,
}

impl IdentifierFormat {
    /// Substitute `value` into the placeholder.
    pub fn render(&self, value: impl fmt::Display) -> String {
        format!("{}{value}{}", self.prefix, self.suffix)
    }

    /// Render every value and join the results with `delimiter`.
    ///
    /// Values containing the delimiter are not escaped.
    pub fn render_all<I>(&self, values: I, delimiter: &str) -> String
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        values
            .into_iter()
            .map(|value| self.render(value))
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

impl FromStr for IdentifierFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut prefix = String::new();
        let mut suffix = None;
        let mut placeholders = 0;

        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            let literal = match c {
                '%' => match chars.next() {
                    Some('%') => '%',
                    Some('s') => {
                        placeholders += 1;
                        suffix.get_or_insert_with(String::new);
                        continue;
                    }
                    Some(other) => return Err(FormatError::UnsupportedDirective(other)),
                    None => return Err(FormatError::TrailingPercent),
                },
                c => c,
            };
            suffix.as_mut().unwrap_or(&mut prefix).push(literal);
        }

        match (placeholders, suffix) {
            (1, Some(suffix)) => Ok(Self { prefix, suffix }),
            (count, _) => Err(FormatError::PlaceholderCount(count)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceIdentifier;

    #[test]
    fn default_renders_value_unchanged() {
        let format: IdentifierFormat = "%s".parse().unwrap();
        assert_eq!(format, IdentifierFormat::default());
        assert_eq!(format.render("apps/v1/Deployment"), "apps/v1/Deployment");
    }

    #[test]
    fn renders_with_prefix_and_delimiter() {
        let format: IdentifierFormat = "kubectl get %s".parse().unwrap();
        let ids = [ResourceIdentifier::new("apps", "v1", "Deployment")];
        assert_eq!(
            format.render_all(&ids, ", "),
            "kubectl get apps/v1/Deployment"
        );

        let ids = [
            ResourceIdentifier::new("", "v1", "Pod"),
            ResourceIdentifier::new("apps", "v1", "Deployment"),
        ];
        assert_eq!(
            format.render_all(&ids, ", "),
            "kubectl get core/v1/Pod, kubectl get apps/v1/Deployment"
        );
    }

    #[test]
    fn no_values_render_empty() {
        let format = IdentifierFormat::default();
        assert_eq!(format.render_all(Vec::<String>::new(), "\n"), "");
    }

    #[test]
    fn escaped_percent_is_literal() {
        let format: IdentifierFormat = "100%% [%s]".parse().unwrap();
        assert_eq!(format.render("core/v1/Pod"), "100% [core/v1/Pod]");
    }

    #[test]
    fn rejects_malformed_formats() {
        assert_eq!(
            "no placeholder".parse::<IdentifierFormat>(),
            Err(FormatError::PlaceholderCount(0))
        );
        assert_eq!(
            "%s and %s".parse::<IdentifierFormat>(),
            Err(FormatError::PlaceholderCount(2))
        );
        assert_eq!(
            "%d".parse::<IdentifierFormat>(),
            Err(FormatError::UnsupportedDirective('d'))
        );
        assert_eq!(
            "%s %".parse::<IdentifierFormat>(),
            Err(FormatError::TrailingPercent)
        );
    }
}
