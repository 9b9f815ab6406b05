//! Build steps: per-layer configuration, merging and the fixed steps that
//! wrap every package.
//!
//! A layer's `build_steps` document has three optional arrays, `pre`,
//! `default` and `post`. Merging concatenates each bucket across layers in
//! layer order and then flattens them as `pre ++ default ++ post`. Steps are
//! image builder customizers and are otherwise kept as opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Placeholder the deployment replaces with the resources archive URI
pub const SOURCE_URI_PLACEHOLDER: &str = "[[[deployment:sourceURI]]]";

const ARCHIVE_DESTINATION: &str = r"C:\imagebuild_resources.zip";
const EXTRACT_DESTINATION: &str = r"C:\imagebuild_resources";
const SYSPREP_SCRIPT_URI: &str = "https://raw.githubusercontent.com/Azure/RDS-Templates/master/CustomImageTemplateScripts/CustomImageTemplateScripts_2024-03-27/AdminSysPrep.ps1";
const SYSPREP_SCRIPT_SHA256: &str =
    "1dcaba4823f9963c9e51c5ce0adce5f546f65ef6034c364ef7325a0451bd9de9";

/// One layer's build steps document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStepsConfig {
    #[serde(default)]
    pub pre: Vec<Value>,
    #[serde(default)]
    pub default: Vec<Value>,
    #[serde(default)]
    pub post: Vec<Value>,
}

impl BuildStepsConfig {
    pub fn total_count(&self) -> usize {
        self.pre.len() + self.default.len() + self.post.len()
    }
}

/// Flatten the configs of all layers into one ordered step list.
pub fn merge_build_steps<'a>(
    configs: impl IntoIterator<Item = &'a BuildStepsConfig>,
) -> Vec<Value> {
    let mut merged = BuildStepsConfig::default();
    for config in configs {
        merged.pre.extend(config.pre.iter().cloned());
        merged.default.extend(config.default.iter().cloned());
        merged.post.extend(config.post.iter().cloned());
    }

    let mut steps = merged.pre;
    steps.extend(merged.default);
    steps.extend(merged.post);
    steps
}

/// Every step must be an object with a non-empty string `type`.
pub fn validate_build_steps(steps: &[Value]) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        let Some(object) = step.as_object() else {
            return Err(Error::Validation {
                message: format!("build step {} must be an object", index + 1),
            });
        };
        match object.get("type").and_then(Value::as_str) {
            Some(step_type) if !step_type.trim().is_empty() => {}
            _ => {
                return Err(Error::Validation {
                    message: format!(
                        "build step {} must have a non-empty string \"type\"",
                        index + 1
                    ),
                })
            }
        }
    }
    Ok(())
}

/// Steps placed before and after the merged steps of every package.
///
/// The leading steps download the resources archive (verified against
/// `archive_sha256`) and extract it; the trailing steps remove it again and
/// generalize the machine.
pub fn hardcoded_build_steps(archive_sha256: &str) -> (Vec<Value>, Vec<Value>) {
    let pre = vec![
        json!({
            "type": "File",
            "name": "Download resources archive",
            "sourceUri": SOURCE_URI_PLACEHOLDER,
            "destination": ARCHIVE_DESTINATION,
            "sha256Checksum": archive_sha256,
        }),
        json!({
            "type": "PowerShell",
            "name": "Extract resources archive",
            "inline": [format!(
                "Expand-Archive -LiteralPath '{}' -DestinationPath '{}'",
                ARCHIVE_DESTINATION, EXTRACT_DESTINATION
            )],
            "runAsSystem": true,
            "runElevated": true,
        }),
    ];
    let post = vec![
        json!({
            "type": "PowerShell",
            "name": "Remove resources archive",
            "inline": [format!(
                "Remove-Item -Path \"{}\", \"{}\" -Recurse",
                EXTRACT_DESTINATION, ARCHIVE_DESTINATION
            )],
            "runAsSystem": true,
            "runElevated": true,
        }),
        json!({
            "type": "PowerShell",
            "name": "sysprep",
            "scriptUri": SYSPREP_SCRIPT_URI,
            "sha256Checksum": SYSPREP_SCRIPT_SHA256,
            "runAsSystem": true,
            "runElevated": true,
        }),
    ];
    (pre, post)
}

/// Wrap merged steps with the fixed leading and trailing steps.
pub fn package_build_steps(merged: Vec<Value>, archive_sha256: &str) -> Vec<Value> {
    let (mut steps, post) = hardcoded_build_steps(archive_sha256);
    steps.extend(merged);
    steps.extend(post);
    steps
}
