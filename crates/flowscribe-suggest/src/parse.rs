const OPEN_FENCE: &str = "```mermaid";
const CLOSE_FENCE: &str = "```";

/// Extract the body of the first ```` ```mermaid ```` block in raw LLM output.
/// Returns `None` when there is no complete, non-empty block.
pub fn extract_mermaid_block(raw: &str) -> Option<String> {
    let mut rest = raw;

    while let Some(start) = rest.find(OPEN_FENCE) {
        let after_tag = &rest[start + OPEN_FENCE.len()..];
        let newline = after_tag.find('\n')?;

        // ```mermaidjs and friends are different tags
        if after_tag[..newline].trim().is_empty() {
            let body = &after_tag[newline + 1..];
            let end = body.find(CLOSE_FENCE)?;
            let block = body[..end].trim();
            if block.is_empty() {
                return None;
            }
            return Some(block.to_string());
        }

        rest = after_tag;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_block_surrounded_by_prose() {
        let raw = "Sure! Here is your chart:\n```mermaid\ngraph TD;\n    A[Start] --> B[End];\n```\nLet me know.";
        assert_eq!(
            extract_mermaid_block(raw).as_deref(),
            Some("graph TD;\n    A[Start] --> B[End];")
        );
    }

    #[test]
    fn takes_the_first_mermaid_block() {
        let raw = "```mermaid\ngraph TD;\nA-->B\n```\n```mermaid\ngraph LR;\nC-->D\n```";
        assert_eq!(
            extract_mermaid_block(raw).as_deref(),
            Some("graph TD;\nA-->B")
        );
    }

    #[test]
    fn skips_blocks_with_other_tags() {
        let raw = "```python\nprint('hi')\n```\n```mermaidjs\nnope\n```\n```mermaid\ngraph TD;\nA-->B\n```";
        assert_eq!(
            extract_mermaid_block(raw).as_deref(),
            Some("graph TD;\nA-->B")
        );
    }

    #[test]
    fn handles_crlf_after_the_tag() {
        let raw = "```mermaid\r\ngraph TD;\r\nA-->B\r\n```";
        assert_eq!(
            extract_mermaid_block(raw).as_deref(),
            Some("graph TD;\r\nA-->B")
        );
    }

    #[test]
    fn missing_or_unterminated_block_is_none() {
        assert_eq!(extract_mermaid_block("graph TD;\nA-->B"), None);
        assert_eq!(extract_mermaid_block("```mermaid\ngraph TD;\nA-->B"), None);
        assert_eq!(extract_mermaid_block("```mermaid"), None);
    }

    #[test]
    fn empty_block_is_none() {
        assert_eq!(extract_mermaid_block("```mermaid\n   \n```"), None);
    }
}
