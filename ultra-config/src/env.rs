use std::sync::OnceLock;

use regex::Regex;

/// Expand `{{ env.VAR }}` placeholders in a raw TOML string.
///
/// Supports an optional default value via `{{ env.VAR | default("fallback") }}`.
/// When a default is provided and the variable is unset, the default is used
/// instead of returning an error. Lines starting with `#` (TOML comments)
/// are passed through unchanged.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| {
            Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
                .expect("must be valid regex")
        })
    }

    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut result = String::with_capacity(line.len());
        let mut last_end = 0;

        for captures in re().captures_iter(line) {
            let overall = captures.get(0).unwrap();
            let key = captures.get(1).unwrap().as_str();
            let default_value = captures.get(2).map(|m| m.as_str());

            result.push_str(&line[last_end..overall.start()]);

            let mut parts = key.split('.');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("env"), Some(var_name), None) => match std::env::var(var_name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => match default_value {
                        Some(default) => result.push_str(default),
                        None => return Err(format!("environment variable not found: `{var_name}`")),
                    },
                },
                _ => return Err(format!("only variables scoped with 'env.' are supported: `{key}`")),
            }

            last_end = overall.end();
        }

        result.push_str(&line[last_end..]);
        output.push_str(&result);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}
