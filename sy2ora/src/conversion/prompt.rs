//! Instruction prompt sent to the model for each source file.

/// Build the conversion prompt for one Sybase source text.
///
/// The source is embedded verbatim; nothing about it is validated. The same input always yields
/// the same prompt.
pub fn build_prompt(source: &str) -> String {
    format!(
        "Convert the following Sybase SQL code into optimized Oracle SQL:\n\
         {source}\n\
         \n\
         Ensure:\n\
         - Convert identity column syntax IDENTITY(1,1) to Oracle's equivalent\n\
         - Use Oracle syntax for auto-increment columns\n\
         - Convert SELECT TOP n to Oracle ROWNUM syntax\n\
         - Use VARCHAR2 instead of VARCHAR\n\
         - Modern Oracle best practices\n\
         - No extra explanation, just code inside triple backticks: sql\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_deterministic() {
        let source = "SELECT TOP 5 * FROM orders";
        assert_eq!(build_prompt(source), build_prompt(source));
    }

    #[test]
    fn test_prompt_embeds_source_verbatim() {
        let source = "CREATE TABLE t (\n  id INT IDENTITY(1,1),\n  name VARCHAR(20)\n)";
        let prompt = build_prompt(source);

        assert!(prompt.contains(source));
        assert!(prompt.starts_with("Convert the following Sybase SQL code"));
    }

    #[test]
    fn test_prompt_lists_conversion_rules() {
        let prompt = build_prompt("");

        assert!(prompt.contains("IDENTITY(1,1)"));
        assert!(prompt.contains("ROWNUM"));
        assert!(prompt.contains("VARCHAR2 instead of VARCHAR"));
        assert!(prompt.contains("triple backticks: sql"));
    }

    #[test]
    fn test_prompt_accepts_non_sql_text() {
        let prompt = build_prompt("not sql at all {}");
        assert!(prompt.contains("not sql at all {}"));
    }
}
