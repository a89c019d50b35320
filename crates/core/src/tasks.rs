//! Doctor task extraction from the next-steps block.

use regex::Regex;
use std::sync::LazyLock;

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*\d+\.(.*)$").expect("valid regex"));

/// Extracts one task per numbered line, in line order.
///
/// Everything after the `N.` marker is the task, trimmed. Lines that are not numbered list
/// items are ignored.
pub fn extract_tasks(next_steps_block: &str) -> Vec<String> {
    next_steps_block
        .lines()
        .filter_map(|line| NUMBERED_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_numbered_lines() {
        let block = "### Next steps for the doctor\n\n1. Order CBC\n\n2. Follow up in 2 weeks";
        assert_eq!(
            extract_tasks(block),
            vec!["Order CBC".to_string(), "Follow up in 2 weeks".to_string()]
        );
    }

    #[test]
    fn test_tolerates_indent_and_missing_space() {
        let block = "   3.Recheck BP  \n\t10.   Refer to dietitian";
        assert_eq!(extract_tasks(block), vec!["Recheck BP", "Refer to dietitian"]);
    }

    #[test]
    fn test_ignores_non_numbered_lines() {
        let block = "Intro text\n- bullet\n1) paren\n1. Real task";
        assert_eq!(extract_tasks(block), vec!["Real task"]);
    }

    #[test]
    fn test_keeps_source_order_not_numbering() {
        let block = "2. Second\n1. First";
        assert_eq!(extract_tasks(block), vec!["Second", "First"]);
    }

    #[test]
    fn test_takes_rest_of_every_numbered_line() {
        let block = "2.5 mg daily\n4.\n5. Keep";
        assert_eq!(extract_tasks(block), vec!["5 mg daily", "", "Keep"]);
    }

    #[test]
    fn test_empty_block() {
        assert!(extract_tasks("").is_empty());
    }
}
