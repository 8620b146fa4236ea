//! Argument helpers shared by the developer binaries.

/// Parse a numeric flag value such as `--limit 5`.
pub fn parse_count(value: &str, flag: &str) -> Result<usize, String> {
    value
        .parse()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, value))
}

/// Parse a numeric flag value, exiting with an error message if it is not a number.
pub fn count_or_exit(value: &str, flag: &str) -> usize {
    match parse_count(value, flag) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_values_parse() {
        assert_eq!(parse_count("12", "--limit"), Ok(12));
        assert_eq!(parse_count("0", "--max-depth"), Ok(0));
    }

    #[test]
    fn bad_values_are_reported_not_ignored() {
        assert_eq!(
            parse_count("many", "--limit"),
            Err("--limit expects a number, got 'many'".to_string())
        );
        assert!(parse_count("-3", "--max-states").is_err());
    }
}
