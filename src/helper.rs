use std::io::{stdin, stdout, Write};

use crate::Result;

// Helper method for parsing tags
pub fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

/// Prompts on stdout and reads a y/yes confirmation from stdin.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N]: ", prompt);
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_tags() {
        let tags = parse_tags(Some("工作, 生活,  ,rust".to_string()));
        assert_eq!(tags, vec!["工作", "生活", "rust"]);
    }

    #[test]
    fn no_input_means_no_tags() {
        assert!(parse_tags(None).is_empty());
        assert!(parse_tags(Some("  ,  ".to_string())).is_empty());
    }
}
