use crate::engine::submission::{Artifact, Platform};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const RULE_SELF_REFERENCE: &str = "R2_SELF_REFERENCE";
pub const RULE_GS_ARRAYFORMULA: &str = "GS3_ARRAYFORMULA";
pub const RULE_XL_STRUCTURED_REF: &str = "XL3_STRUCTURED_REF";
pub const RULE_GS_OPEN_RANGE: &str = "GS4_OPEN_RANGE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    Pass,
    Fail,
    Warn,
}

impl RuleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warn => "warn",
        }
    }
}

impl std::fmt::Display for RuleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    SelfReference,
    AutoExpand,
    HardCodedRange,
    Structural,
    Gate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    pub rule_id: String,
    pub rule_name: String,
    pub category: RuleCategory,
    pub status: RuleStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

impl Validation {
    pub fn pass(rule_id: &str, rule_name: &str, category: RuleCategory) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            category,
            status: RuleStatus::Pass,
            reason: None,
            details: None,
        }
    }

    pub fn fail(rule_id: &str, rule_name: &str, category: RuleCategory, reason: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            category,
            status: RuleStatus::Fail,
            reason: Some(reason),
            details: None,
        }
    }

    pub fn warn(rule_id: &str, rule_name: &str, category: RuleCategory, reason: String) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            rule_name: rule_name.to_string(),
            category,
            status: RuleStatus::Warn,
            reason: Some(reason),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

pub fn validate_artifact(artifact: &Artifact) -> Vec<Validation> {
    let formula = artifact.content.trim();
    if !formula.starts_with('=') {
        return Vec::new();
    }

    let mut validations = Vec::new();

    if let Some(column) = artifact.placement.target_column() {
        let hits: Vec<(String, u32)> = cell_references(formula)
            .into_iter()
            .filter(|(col, _)| *col == column)
            .collect();
        if hits.is_empty() {
            validations.push(
                Validation::pass(RULE_SELF_REFERENCE, "formula self-reference", RuleCategory::SelfReference)
                    .with_details(json!({ "targetColumn": column })),
            );
        } else {
            let cells: Vec<String> = hits.iter().map(|(col, row)| format!("{col}{row}")).collect();
            validations.push(
                Validation::fail(
                    RULE_SELF_REFERENCE,
                    "formula self-reference",
                    RuleCategory::SelfReference,
                    format!(
                        "formula references {} inside its own target column {column}",
                        cells.join(", ")
                    ),
                )
                .with_details(json!({ "targetColumn": column, "references": cells })),
            );
        }
    }

    match artifact.platform {
        Platform::GoogleSheets => {
            if formula.to_ascii_uppercase().contains("ARRAYFORMULA(") {
                validations.push(Validation::pass(
                    RULE_GS_ARRAYFORMULA,
                    "auto-expanding construct",
                    RuleCategory::AutoExpand,
                ));
            }
            let bounded = bounded_ranges(formula);
            if !bounded.is_empty() {
                validations.push(
                    Validation::warn(
                        RULE_GS_OPEN_RANGE,
                        "hard-coded row bound",
                        RuleCategory::HardCodedRange,
                        format!(
                            "bounded range {} stops applying once data grows past the bound; prefer an open-ended range such as A2:A",
                            bounded.join(", ")
                        ),
                    )
                    .with_details(json!({ "boundedRanges": bounded })),
                );
            }
        }
        Platform::Excel => {
            if has_structured_reference(formula) {
                validations.push(Validation::pass(
                    RULE_XL_STRUCTURED_REF,
                    "auto-expanding construct",
                    RuleCategory::AutoExpand,
                ));
            }
        }
    }

    validations
}

// Conservative scan for A1-style cell tokens, `$`-absolute forms included.
pub(crate) fn cell_references(formula: &str) -> Vec<(String, u32)> {
    cell_reference_spans(formula)
        .into_iter()
        .map(|span| (span.column, span.row))
        .collect()
}

// A2:A100-style ranges where both endpoints carry a row bound.
pub(crate) fn bounded_ranges(formula: &str) -> Vec<String> {
    let chars: Vec<char> = formula.chars().collect();
    let refs = cell_reference_spans(formula);
    let mut ranges = Vec::new();
    for window in refs.windows(2) {
        let (left, right) = (&window[0], &window[1]);
        if left.end < chars.len() && chars[left.end] == ':' && right.start == left.end + 1 {
            ranges.push(format!(
                "{}{}:{}{}",
                left.column, left.row, right.column, right.row
            ));
        }
    }
    ranges
}

struct CellSpan {
    column: String,
    row: u32,
    start: usize,
    end: usize,
}

fn cell_reference_spans(formula: &str) -> Vec<CellSpan> {
    let chars: Vec<char> = formula.chars().collect();
    let mut spans = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let boundary_ok = i == 0
            || !(chars[i - 1].is_ascii_alphanumeric() || chars[i - 1] == '_' || chars[i - 1] == '$');
        if !boundary_ok {
            i += 1;
            continue;
        }
        let mut j = i;
        if chars[j] == '$' {
            j += 1;
        }
        let col_start = j;
        while j < chars.len() && chars[j].is_ascii_alphabetic() && j - col_start < 3 {
            j += 1;
        }
        if j == col_start {
            i += 1;
            continue;
        }
        let mut k = j;
        if k < chars.len() && chars[k] == '$' {
            k += 1;
        }
        let row_start = k;
        while k < chars.len() && chars[k].is_ascii_digit() {
            k += 1;
        }
        if k == row_start {
            i = j;
            continue;
        }
        if k < chars.len() && (chars[k].is_ascii_alphanumeric() || chars[k] == '_') {
            i = k;
            continue;
        }
        let row_text: String = chars[row_start..k].iter().collect();
        let Ok(row) = row_text.parse::<u32>() else {
            i = k;
            continue;
        };
        spans.push(CellSpan {
            column: chars[col_start..j]
                .iter()
                .collect::<String>()
                .to_ascii_uppercase(),
            row,
            start: i,
            end: k,
        });
        i = k;
    }
    spans
}

fn has_structured_reference(formula: &str) -> bool {
    let chars: Vec<char> = formula.chars().collect();
    for (idx, ch) in chars.iter().enumerate() {
        if *ch != '[' {
            continue;
        }
        let preceded = idx > 0 && (chars[idx - 1].is_ascii_alphanumeric() || chars[idx - 1] == '_');
        if !preceded {
            continue;
        }
        if chars[idx + 1..].iter().any(|c| *c == ']') {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{bounded_ranges, cell_references, has_structured_reference};

    #[test]
    fn cell_references_finds_absolute_and_relative_tokens() {
        let refs = cell_references("=SUM($A$1, B2) + C10");
        assert_eq!(
            refs,
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 2),
                ("C".to_string(), 10)
            ]
        );
    }

    #[test]
    fn cell_references_ignores_function_names_and_open_columns() {
        assert!(cell_references("=ARRAYFORMULA(A2:A)").len() == 1);
        assert!(cell_references("=TODAY()").is_empty());
    }

    #[test]
    fn bounded_ranges_detects_row_bounds_only() {
        assert_eq!(bounded_ranges("=SUM(A2:A100)"), vec!["A2:A100".to_string()]);
        assert!(bounded_ranges("=SUM(A2:A)").is_empty());
    }

    #[test]
    fn structured_reference_requires_table_prefix() {
        assert!(has_structured_reference("=SUM(Sales[Amount])"));
        assert!(!has_structured_reference("=SUM([Amount)"));
    }
}
