use crate::engine::run::Stage;
use crate::engine::submission::{
    AcceptanceTest, Artifact, ArtifactKind, DeployNotes, FallbackPlan, NextAction, Placement,
    Platform, Submission,
};

pub const MARKER_STATE: &str = "[STATE]";
pub const MARKER_ARTIFACTS: &str = "[ARTIFACTS]";
pub const MARKER_ACCEPTANCE_TESTS: &str = "[ACCEPTANCE_TESTS]";
pub const MARKER_FALLBACK: &str = "[FALLBACK]";
pub const MARKER_DEPLOY_NOTES: &str = "[DEPLOY_NOTES]";
pub const MARKER_NEXT_ACTION: &str = "[NEXT_ACTION]";

pub const SECTION_MARKERS: [&str; 6] = [
    MARKER_STATE,
    MARKER_ARTIFACTS,
    MARKER_ACCEPTANCE_TESTS,
    MARKER_FALLBACK,
    MARKER_DEPLOY_NOTES,
    MARKER_NEXT_ACTION,
];

pub const REQUIRED_MARKERS: [&str; 5] = [
    MARKER_STATE,
    MARKER_ARTIFACTS,
    MARKER_ACCEPTANCE_TESTS,
    MARKER_FALLBACK,
    MARKER_DEPLOY_NOTES,
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub success: bool,
    pub missing_blocks: Vec<String>,
    pub submission: Option<Submission>,
}

#[derive(Debug, Clone)]
pub struct SubmissionParser {
    default_platform: Platform,
}

impl SubmissionParser {
    pub fn new(default_platform: Platform) -> Self {
        Self { default_platform }
    }

    // Best-effort scan over model-produced text. Degrades, never fails hard
    // beyond reporting which required markers were absent.
    pub fn parse(&self, raw: &str, now: i64) -> ParseOutcome {
        let sections = locate_sections(raw);

        let missing_blocks: Vec<String> = REQUIRED_MARKERS
            .iter()
            .filter(|marker| !sections.iter().any(|s| s.marker == **marker))
            .map(|marker| marker.to_string())
            .collect();
        if !missing_blocks.is_empty() {
            return ParseOutcome {
                success: false,
                missing_blocks,
                submission: None,
            };
        }

        let proposed_stage = section_body(raw, &sections, MARKER_STATE)
            .map(parse_state)
            .unwrap_or(Stage::Executed);
        let artifacts = section_body(raw, &sections, MARKER_ARTIFACTS)
            .map(|text| parse_artifacts(text, self.default_platform, now))
            .unwrap_or_default();
        let acceptance_tests = section_body(raw, &sections, MARKER_ACCEPTANCE_TESTS)
            .map(parse_acceptance_tests)
            .unwrap_or_default();
        let fallback_plans = section_body(raw, &sections, MARKER_FALLBACK)
            .map(parse_fallback)
            .unwrap_or_default();
        let deploy_notes = section_body(raw, &sections, MARKER_DEPLOY_NOTES).map(parse_deploy_notes);
        let next_action = section_body(raw, &sections, MARKER_NEXT_ACTION).map(parse_next_action);

        ParseOutcome {
            success: true,
            missing_blocks: Vec::new(),
            submission: Some(Submission {
                proposed_stage,
                artifacts,
                acceptance_tests,
                fallback_plans,
                deploy_notes,
                next_action,
                raw: raw.to_string(),
            }),
        }
    }
}

struct SectionSpan {
    marker: &'static str,
    body_start: usize,
    body_end: usize,
}

fn locate_sections(raw: &str) -> Vec<SectionSpan> {
    let lower = raw.to_ascii_lowercase();
    let mut found: Vec<(usize, &'static str, usize)> = Vec::new();
    for marker in SECTION_MARKERS {
        if let Some(pos) = lower.find(&marker.to_ascii_lowercase()) {
            found.push((pos, marker, pos + marker.len()));
        }
    }
    found.sort_by_key(|(pos, _, _)| *pos);

    let mut spans = Vec::new();
    for (idx, (_, marker, body_start)) in found.iter().enumerate() {
        let body_end = found
            .get(idx + 1)
            .map(|(next_pos, _, _)| *next_pos)
            .unwrap_or(raw.len());
        spans.push(SectionSpan {
            marker: *marker,
            body_start: *body_start,
            body_end,
        });
    }
    spans
}

fn section_body<'a>(raw: &'a str, sections: &[SectionSpan], marker: &str) -> Option<&'a str> {
    sections
        .iter()
        .find(|section| section.marker == marker)
        .map(|section| &raw[section.body_start..section.body_end])
}

fn strip_bullet(line: &str) -> &str {
    line.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim_start()
}

fn parse_state(body: &str) -> Stage {
    let mut current_state = None;
    let mut next_state = None;
    for line in body.lines() {
        let line = strip_bullet(line);
        let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':')) else {
            continue;
        };
        let stage = Stage::parse(value).ok();
        match key.trim().to_ascii_lowercase().as_str() {
            "current_state" => current_state = stage.or(current_state),
            "next_state" => next_state = stage.or(next_state),
            _ => {}
        }
    }
    next_state.or(current_state).unwrap_or(Stage::Executed)
}

fn parse_artifacts(body: &str, default_platform: Platform, now: i64) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if !(trimmed.starts_with('-') || trimmed.starts_with('*')) {
            continue;
        }
        if let Some(artifact) = parse_artifact_entry(strip_bullet(line), default_platform, now) {
            artifacts.push(artifact);
        }
    }
    if !artifacts.is_empty() {
        return artifacts;
    }

    // No structured entries matched; salvage formula-looking substrings.
    for line in body.lines() {
        if let Some(formula) = scan_formula(line) {
            artifacts.push(Artifact {
                kind: ArtifactKind::Formula,
                platform: default_platform,
                placement: Placement::default(),
                content: formula.to_string(),
                created_at: now,
            });
        }
    }
    artifacts
}

fn parse_artifact_entry(entry: &str, default_platform: Platform, now: i64) -> Option<Artifact> {
    let lower = entry.to_ascii_lowercase();
    let (attrs, content) = match lower.find("content=") {
        Some(pos) => (&entry[..pos], entry[pos + "content=".len()..].trim()),
        None => (entry, ""),
    };

    let mut kind = None;
    let mut platform = None;
    let mut placement = Placement::default();
    let mut recognized = false;
    for token in attrs.split_whitespace() {
        let Some((key, value)) = token.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim().to_ascii_lowercase().as_str() {
            "type" => {
                kind = ArtifactKind::parse(value).ok().or(kind);
                recognized = true;
            }
            "platform" => {
                platform = Platform::parse(value).ok().or(platform);
                recognized = true;
            }
            "target_sheet" => {
                placement.sheet = Some(value.to_string());
                recognized = true;
            }
            "target_cell" => {
                placement.cell = Some(value.to_string());
                recognized = true;
            }
            "target_range" => {
                placement.range = Some(value.to_string());
                recognized = true;
            }
            "target_column" => {
                placement.column = Some(value.to_string());
                recognized = true;
            }
            _ => {}
        }
    }

    if !recognized && content.is_empty() {
        return None;
    }

    let kind = kind.unwrap_or({
        if content.starts_with('=') {
            ArtifactKind::Formula
        } else {
            ArtifactKind::Steps
        }
    });
    Some(Artifact {
        kind,
        platform: platform.unwrap_or(default_platform),
        placement,
        content: content.to_string(),
        created_at: now,
    })
}

fn scan_formula(line: &str) -> Option<&str> {
    for (idx, _) in line.match_indices('=') {
        let boundary_ok = idx == 0
            || line[..idx]
                .chars()
                .next_back()
                .map(|ch| ch.is_ascii_whitespace())
                .unwrap_or(true);
        if !boundary_ok {
            continue;
        }
        let candidate = line[idx..].trim();
        if candidate.len() > 1 {
            return Some(candidate);
        }
    }
    None
}

fn parse_acceptance_tests(body: &str) -> Vec<AcceptanceTest> {
    let mut tests = Vec::new();
    for line in body.lines() {
        let trimmed = line.trim();
        let description = if let Some(rest) = split_numbered_marker(trimmed) {
            rest
        } else if trimmed.starts_with(['-', '*', '•']) {
            strip_bullet(trimmed)
        } else {
            continue;
        };
        if description.is_empty() {
            continue;
        }
        tests.push(AcceptanceTest {
            id: format!("t-{}", tests.len() + 1),
            description: description.to_string(),
            expected: "pass".to_string(),
        });
    }
    tests
}

fn split_numbered_marker(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|ch| ch.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    let rest = rest.strip_prefix([')', '.', ':'])?;
    Some(rest.trim())
}

fn parse_fallback(body: &str) -> Vec<FallbackPlan> {
    let mut plans = Vec::new();
    for line in body.lines() {
        let line = strip_bullet(line);
        if line.is_empty() {
            continue;
        }
        let Some((condition, action)) = split_fallback(line) else {
            continue;
        };
        let condition = condition.trim();
        let action = action.trim();
        if condition.is_empty() || action.is_empty() {
            continue;
        }
        plans.push(FallbackPlan {
            condition: condition.to_string(),
            action: action.to_string(),
        });
    }
    plans
}

fn split_fallback(line: &str) -> Option<(&str, &str)> {
    let lower = line.to_ascii_lowercase();
    if lower.starts_with("if ") {
        if let Some(then_pos) = lower.find(" then ").filter(|pos| *pos >= 3) {
            return Some((&line[3..then_pos], &line[then_pos + " then ".len()..]));
        }
    }
    if let Some(pos) = line.find('→') {
        return Some((&line[..pos], &line[pos + '→'.len_utf8()..]));
    }
    if let Some(pos) = line.find("->") {
        return Some((&line[..pos], &line[pos + 2..]));
    }
    line.split_once(':')
}

fn parse_deploy_notes(body: &str) -> DeployNotes {
    let mut notes = DeployNotes::default();
    for line in body.lines() {
        let line = strip_bullet(line);
        let Some((key, value)) = line.split_once(':').or_else(|| line.split_once('=')) else {
            continue;
        };
        let items = split_list(value);
        match key.trim().to_ascii_lowercase().as_str() {
            "protect_ranges" => notes.protect_ranges = items,
            "naming_conventions" => notes.naming_conventions = items,
            "permissions" => notes.permissions = items,
            _ => {}
        }
    }
    notes
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_next_action(body: &str) -> NextAction {
    let mut next_action = NextAction::default();
    for line in body.lines() {
        let line = strip_bullet(line);
        let Some((key, value)) = line.split_once(':').or_else(|| line.split_once('=')) else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim().to_ascii_lowercase().as_str() {
            "system_will_validate" => next_action.system_will_validate = value,
            "user_needs_to_provide" => next_action.user_needs_to_provide = value,
            "if_fail_agent_will" => next_action.if_fail_agent_will = value,
            _ => {}
        }
    }
    next_action
}

#[cfg(test)]
mod tests {
    use super::{scan_formula, split_fallback, split_numbered_marker};

    #[test]
    fn numbered_markers_accept_paren_dot_and_colon() {
        assert_eq!(split_numbered_marker("1) totals match"), Some("totals match"));
        assert_eq!(split_numbered_marker("2. blanks ignored"), Some("blanks ignored"));
        assert_eq!(split_numbered_marker("3: errors surfaced"), Some("errors surfaced"));
        assert_eq!(split_numbered_marker("totals match"), None);
    }

    #[test]
    fn fallback_split_prefers_if_then_form() {
        assert_eq!(
            split_fallback("if the sheet is locked then ask the owner"),
            Some(("the sheet is locked", "ask the owner"))
        );
        assert_eq!(
            split_fallback("import breaks -> rerun the loader"),
            Some(("import breaks ", " rerun the loader"))
        );
    }

    #[test]
    fn formula_scan_requires_a_token_boundary() {
        assert_eq!(scan_formula("use =SUM(A2:A) here"), Some("=SUM(A2:A) here"));
        assert_eq!(scan_formula("key=value"), None);
    }
}
