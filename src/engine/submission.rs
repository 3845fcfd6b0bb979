use crate::engine::run::Stage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Excel,
    GoogleSheets,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excel => "excel",
            Self::GoogleSheets => "google_sheets",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "excel" => Ok(Self::Excel),
            "google_sheets" | "google sheets" | "gsheets" => Ok(Self::GoogleSheets),
            _ => Err("platform must be one of: excel, google_sheets".to_string()),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Formula,
    Steps,
    Template,
    SchemaPlan,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Formula => "formula",
            Self::Steps => "steps",
            Self::Template => "template",
            Self::SchemaPlan => "schema_plan",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "formula" => Ok(Self::Formula),
            "steps" => Ok(Self::Steps),
            "template" => Ok(Self::Template),
            "schema_plan" | "schema plan" => Ok(Self::SchemaPlan),
            _ => Err("artifact type must be one of: formula, steps, template, schema_plan"
                .to_string()),
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub cell: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub column: Option<String>,
}

impl Placement {
    pub fn is_empty(&self) -> bool {
        self.sheet.is_none() && self.cell.is_none() && self.range.is_none() && self.column.is_none()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(sheet) = &self.sheet {
            parts.push(format!("sheet {sheet}"));
        }
        if let Some(cell) = &self.cell {
            parts.push(format!("cell {cell}"));
        }
        if let Some(range) = &self.range {
            parts.push(format!("range {range}"));
        }
        if let Some(column) = &self.column {
            parts.push(format!("column {column}"));
        }
        if parts.is_empty() {
            "no placement".to_string()
        } else {
            parts.join(", ")
        }
    }

    // Resolves the single column this placement targets, when one exists.
    pub fn target_column(&self) -> Option<String> {
        if let Some(column) = self.column.as_deref() {
            let letters = match column.split_once(':') {
                Some((left, right)) => {
                    let left = column_letters(left)?;
                    let right = column_letters(right)?;
                    if left != right {
                        return None;
                    }
                    left
                }
                None => column_letters(column)?,
            };
            return Some(letters);
        }
        if let Some(cell) = self.cell.as_deref() {
            return column_letters(cell);
        }
        if let Some(range) = self.range.as_deref() {
            let (left, right) = range.split_once(':')?;
            let left = column_letters(left)?;
            let right = column_letters(right)?;
            if left == right {
                return Some(left);
            }
        }
        None
    }
}

fn column_letters(token: &str) -> Option<String> {
    let token = token.trim().trim_start_matches('$');
    let letters: String = token
        .chars()
        .take_while(|ch| ch.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let rest = &token[letters.len()..];
    if !rest.chars().all(|ch| ch.is_ascii_digit() || ch == '$') {
        return None;
    }
    Some(letters.to_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub platform: Platform,
    #[serde(default)]
    pub placement: Placement,
    pub content: String,
    pub created_at: i64,
}

impl Artifact {
    pub fn is_executable(&self) -> bool {
        self.kind == ArtifactKind::Formula && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptanceTest {
    pub id: String,
    pub description: String,
    pub expected: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackPlan {
    pub condition: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployNotes {
    #[serde(default)]
    pub protect_ranges: Vec<String>,
    #[serde(default)]
    pub naming_conventions: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl DeployNotes {
    pub fn is_empty(&self) -> bool {
        self.protect_ranges.is_empty()
            && self.naming_conventions.is_empty()
            && self.permissions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextAction {
    #[serde(default)]
    pub system_will_validate: String,
    #[serde(default)]
    pub user_needs_to_provide: String,
    #[serde(default)]
    pub if_fail_agent_will: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub proposed_stage: Stage,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub acceptance_tests: Vec<AcceptanceTest>,
    #[serde(default)]
    pub fallback_plans: Vec<FallbackPlan>,
    #[serde(default)]
    pub deploy_notes: Option<DeployNotes>,
    #[serde(default)]
    pub next_action: Option<NextAction>,
    pub raw: String,
}

impl Submission {
    pub fn has_executable_artifact(&self) -> bool {
        self.artifacts.iter().any(Artifact::is_executable)
    }
}

#[cfg(test)]
mod tests {
    use super::Placement;

    #[test]
    fn target_column_resolves_from_column_cell_and_range() {
        let column = Placement {
            column: Some("c:c".to_string()),
            ..Placement::default()
        };
        assert_eq!(column.target_column(), Some("C".to_string()));

        let cell = Placement {
            cell: Some("$D$5".to_string()),
            ..Placement::default()
        };
        assert_eq!(cell.target_column(), Some("D".to_string()));

        let range = Placement {
            range: Some("E2:E".to_string()),
            ..Placement::default()
        };
        assert_eq!(range.target_column(), Some("E".to_string()));
    }

    #[test]
    fn target_column_rejects_multi_column_ranges() {
        let placement = Placement {
            range: Some("A1:B10".to_string()),
            ..Placement::default()
        };
        assert_eq!(placement.target_column(), None);
    }
}
