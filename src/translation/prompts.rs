/*!
 * System prompt templates for translation requests.
 *
 * A user-supplied template (with `${src}`/`${dst}` placeholders) wins over
 * the built-in prompts; both built-ins instruct the model to keep line
 * alignment intact, which the batch pipeline depends on.
 */

use crate::app_config::Config;

/// Render `${src}`/`${dst}` placeholders in a prompt template.
pub fn render_template(template: &str, source_lang: &str, target_lang: &str) -> String {
    template
        .replace("${src}", source_lang)
        .replace("${dst}", target_lang)
}

fn custom_prompt(config: &Config) -> Option<String> {
    let template = config.system_prompt.trim();
    if template.is_empty() {
        return None;
    }
    let src = if config.source_lang.trim().is_empty() {
        "auto"
    } else {
        config.source_lang.as_str()
    };
    Some(render_template(template, src, &config.target_lang))
}

/// System prompt for multi-line batch requests.
pub fn batch_system_prompt(config: &Config) -> String {
    custom_prompt(config).unwrap_or_else(|| {
        format!(
            "Translate the following text into {}. Keep the same number of lines \
             and preserve punctuation and symbols. Do not insert newlines.",
            config.target_lang
        )
    })
}

/// System prompt for single-unit requests.
pub fn single_system_prompt(config: &Config) -> String {
    custom_prompt(config).unwrap_or_else(|| {
        format!(
            "Translate this line into {}. Keep punctuation and symbols \
             and do not insert newlines.",
            config.target_lang
        )
    })
}
