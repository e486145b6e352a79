//! Template configuration prompts and env generation
//!
//! A template config is a JSON tree whose leaves are objects carrying
//! an `"input"` key. Installation walks the tree, asks the user for
//! each leaf's value (or keeps the shipped default), and collects the
//! leaves flagged `"isEnv"` into `.env` material.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{GraftError, Result};
use crate::template::plugins::PLUGINS_KEY;

/// Key marking a config object as a prompt leaf.
const INPUT_KEY: &str = "input";
/// Optional human label shown instead of the leaf's key.
const PROMPT_KEY: &str = "prompt";
/// Marks a leaf as an environment variable source.
const IS_ENV_KEY: &str = "isEnv";

/// Name of the file collected env vars are written to.
pub const ENV_FILE: &str = ".env";

/// Walk the config and fill in every prompt leaf.
///
/// Interactive runs show each leaf's `"prompt"` text (falling back to
/// its key) with the shipped `"input"` as the default answer;
/// `assume_defaults` keeps shipped values untouched. Returns the env
/// vars collected from `"isEnv"` leaves as `(NAME, value)` pairs. A
/// var's name is the leaf's key chain joined with dots, uppercased,
/// spaces replaced by underscores. The `"plugins"` table is not
/// walked.
pub fn collect_inputs(config: &mut Value, assume_defaults: bool) -> Result<Vec<(String, String)>> {
    let mut env = Vec::new();
    let Some(map) = config.as_object_mut() else {
        return Ok(env);
    };
    let mut prefix = String::new();
    for (key, value) in map.iter_mut() {
        if key == PLUGINS_KEY {
            continue;
        }
        walk_value(key, value, &mut prefix, &mut env, assume_defaults)?;
    }
    Ok(env)
}

fn walk_value(
    key: &str,
    value: &mut Value,
    prefix: &mut String,
    env: &mut Vec<(String, String)>,
    assume_defaults: bool,
) -> Result<()> {
    let Some(object) = value.as_object_mut() else {
        return Ok(());
    };
    let mark = prefix.len();
    if !prefix.is_empty() {
        prefix.push('.');
    }
    prefix.push_str(&env_name(key));

    if object.contains_key(INPUT_KEY) {
        let label = object
            .get(PROMPT_KEY)
            .and_then(Value::as_str)
            .unwrap_or(key)
            .to_string();
        let shipped = object
            .get(INPUT_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let answer = if assume_defaults {
            shipped
        } else {
            prompt_for(&label, &shipped)?
        };
        if object
            .get(IS_ENV_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            env.push((prefix.clone(), answer.clone()));
        }
        object.insert(INPUT_KEY.to_string(), Value::String(answer));
    } else {
        for (child_key, child) in object.iter_mut() {
            walk_value(child_key, child, prefix, env, assume_defaults)?;
        }
    }

    prefix.truncate(mark);
    Ok(())
}

fn env_name(key: &str) -> String {
    key.to_uppercase().replace(' ', "_")
}

fn prompt_for(label: &str, shipped: &str) -> Result<String> {
    let mut input = cliclack::input(label);
    if !shipped.is_empty() {
        input = input.default_input(shipped);
    }
    let answer: String = input.interact().map_err(GraftError::Prompt)?;
    Ok(answer)
}

/// Write collected env vars to `<target>/.env`, one `KEY=VALUE` line
/// per variable.
pub fn write_env_file(target: &Path, vars: &[(String, String)]) -> Result<()> {
    let path = target.join(ENV_FILE);
    let lines: Vec<String> = vars.iter().map(|(k, v)| format!("{k}={v}")).collect();
    fs::write(&path, lines.join("\n")).map_err(|e| GraftError::io(&path, e))
}
