use crate::error::CliError;
use rules_engine::RuleSet;
use tracing::info;

/// One rule per line, or a pretty JSON array.
pub fn format_rules(rules: &RuleSet, as_json: bool) -> Result<String, CliError> {
    if as_json {
        return serde_json::to_string_pretty(rules).map_err(CliError::JsonSerialize);
    }
    Ok(rules.iter().map(|rule| format!("{rule}\n")).collect())
}

pub fn write_rules(rules: &RuleSet, as_json: bool, path: Option<String>) -> Result<(), CliError> {
    let content = format_rules(rules, as_json)?;
    match path {
        Some(path) => {
            std::fs::write(&path, content)?;
            info!("Wrote {} rule(s) to {}", rules.len(), path);
        }
        None => print!("{content}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> RuleSet {
        ["SELECT * FROM t WHERE a = 1", "SELECT * FROM t WHERE a IS NULL"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_plain_output_is_one_rule_per_line() {
        assert_eq!(
            format_rules(&sample(), false).unwrap(),
            "SELECT * FROM t WHERE a = 1\nSELECT * FROM t WHERE a IS NULL\n"
        );
        assert_eq!(format_rules(&RuleSet::new(), false).unwrap(), "");
    }

    #[test]
    fn test_rules_written_to_file_as_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");

        write_rules(&sample(), true, Some(path.display().to_string())).unwrap();

        let written: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample().into_vec());
    }
}
