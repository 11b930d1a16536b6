use std::fs;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::ValidateError;

pub const SKILL_FILE: &str = "SKILL.md";
const SKILL_FILE_LOWER: &str = "skill.md";
const FRONTMATTER_DELIMITER: &str = "---";

/// Checks one skill directory. An empty list means the skill is valid.
pub trait SkillValidator {
    fn validate(&self, dir: &Path) -> Vec<String>;
}

/// Validates the YAML frontmatter of a skill's `SKILL.md`.
pub struct FrontmatterValidator {
    schema: Validator,
}

impl FrontmatterValidator {
    pub fn new() -> Result<Self, ValidateError> {
        let schema_text = include_str!("../schemas/skill-frontmatter.schema.json");
        let schema: Value = serde_json::from_str(schema_text)
            .map_err(|err| ValidateError::Schema(err.to_string()))?;
        let schema =
            jsonschema::validator_for(&schema).map_err(|err| ValidateError::Schema(err.to_string()))?;
        Ok(Self { schema })
    }

    fn check_frontmatter(&self, dir: &Path, text: &str) -> Vec<String> {
        let frontmatter = match extract_frontmatter(text) {
            Ok(frontmatter) => frontmatter,
            Err(problem) => return vec![problem],
        };

        let data: Value = match serde_yml::from_str(frontmatter) {
            Ok(data) => data,
            Err(err) => return vec![format!("Invalid YAML in frontmatter: {err}")],
        };
        if !data.is_object() {
            return vec!["SKILL.md frontmatter must be a YAML mapping".to_string()];
        }

        let mut problems: Vec<String> = self
            .schema
            .iter_errors(&data)
            .map(|err| err.to_string())
            .collect();

        if let (Some(name), Some(dir_name)) = (
            data.get("name").and_then(Value::as_str),
            dir.file_name().and_then(|name| name.to_str()),
        ) {
            if name != dir_name {
                problems.push(format!(
                    "Skill name '{name}' must match directory name '{dir_name}'"
                ));
            }
        }

        problems
    }
}

impl SkillValidator for FrontmatterValidator {
    fn validate(&self, dir: &Path) -> Vec<String> {
        let Some(skill_file) = find_skill_file(dir) else {
            return vec![format!("Missing required file: {SKILL_FILE}")];
        };

        match fs::read_to_string(&skill_file) {
            Ok(text) => self.check_frontmatter(dir, &text),
            Err(err) => vec![format!("Failed to read {SKILL_FILE}: {err}")],
        }
    }
}

fn find_skill_file(dir: &Path) -> Option<std::path::PathBuf> {
    [SKILL_FILE, SKILL_FILE_LOWER]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Returns the text between the opening and closing `---` lines.
pub fn extract_frontmatter(text: &str) -> Result<&str, String> {
    let text = text.trim_start_matches('\u{feff}');
    let mut lines = text.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == FRONTMATTER_DELIMITER => {}
        _ => return Err("SKILL.md must start with YAML frontmatter (---)".to_string()),
    }

    let start = text.find('\n').map(|idx| idx + 1).unwrap_or(text.len());
    let mut offset = start;
    for line in lines {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            return Ok(&text[start..offset]);
        }
        offset += line.len();
    }

    Err("SKILL.md frontmatter not properly closed with ---".to_string())
}
