//! Translation table codec.
//!
//! The exported table has one header row of human-readable language
//! names (default language first) and one row per unique, non-empty
//! default-language string found in the document. Importing re-walks
//! the same fields and overwrites every language present in the table
//! for any field whose current default-language text matches a row.
//! File reading and writing live in the binary crate; this module only
//! works on in-memory rows.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::builder::split_values;
use crate::language;
use crate::model::*;

/// `default text -> {language code -> translated text}`.
type Lookup = HashMap<String, BTreeMap<String, String>>;

/// The suggested file name for an exported table: the questionnaire
/// name with all non-word characters stripped.
pub fn translation_filename(doc: &Questionnaire) -> String {
    let stem: String = doc
        .name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    format!("{}_translations.csv", stem)
}

struct ExportContext {
    /// Language codes, default language first.
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    /// Default-language strings already exported, to avoid duplicate
    /// rows across the whole document.
    exported: HashSet<String>,
}

impl ExportContext {
    fn add_row<F>(&mut self, text: &str, lookup: F)
    where
        F: Fn(&str) -> String,
    {
        if text.is_empty() || self.exported.contains(text) {
            return;
        }
        self.exported.insert(text.to_string());
        let row: Vec<String> = self.headers.iter().map(|h| lookup(h)).collect();
        self.rows.push(row);
    }
}

pub fn export_rows(doc: &Questionnaire) -> Vec<Vec<String>> {
    let default_lang = doc.default_language.clone();
    let mut headers = vec![default_lang.clone()];
    headers.extend(
        doc.languages
            .iter()
            .filter(|l| **l != default_lang)
            .cloned(),
    );
    let name_row: Vec<String> = headers.iter().map(|c| language::code_to_name(c)).collect();

    let mut ctx = ExportContext {
        headers,
        rows: vec![name_row],
        exported: HashSet::new(),
    };

    export_steps(&doc.steps, &mut ctx, &default_lang);
    if let Some(quota_steps) = &doc.quota_completed_steps {
        export_steps(quota_steps, &mut ctx, &default_lang);
    }

    export_message(&doc.settings.error_message, &default_lang, &mut ctx);
    export_message(&doc.settings.thank_you_message, &default_lang, &mut ctx);

    if let Some(default_title) = doc.settings.title.get(&default_lang) {
        if !default_title.trim().is_empty() {
            let title = &doc.settings.title;
            ctx.add_row(&default_title.clone(), |lang| {
                title.get(lang).cloned().unwrap_or_default()
            });
        }
    }

    if let Some(default_msg) = doc.settings.survey_already_taken_message.get(&default_lang) {
        if !default_msg.trim().is_empty() {
            let msg = &doc.settings.survey_already_taken_message;
            ctx.add_row(&default_msg.clone(), |lang| {
                msg.get(lang).cloned().unwrap_or_default()
            });
        }
    }

    ctx.rows
}

fn export_steps(steps: &[Step], ctx: &mut ExportContext, default_lang: &str) {
    for step in steps {
        // Language-selection and flag steps carry no translatable
        // prompt.
        let prompt = match step.prompt() {
            Some(p) => p,
            None => continue,
        };
        export_prompt(prompt, default_lang, ctx);

        // IVR choice responses are never exported: they are expected
        // to be digits, not natural language.
        if let Step::MultipleChoice { choices, .. } = step {
            for choice in choices {
                let default_sms = choice_sms_joined(choice, default_lang);
                ctx.add_row(&default_sms, |lang| choice_sms_joined(choice, lang));

                let default_mobileweb = choice_mobileweb(choice, default_lang);
                ctx.add_row(&default_mobileweb, |lang| choice_mobileweb(choice, lang));
            }
        }
    }
}

fn export_prompt(prompt: &LocalizedPrompt, default_lang: &str, ctx: &mut ExportContext) {
    let default_sms = prompt_sms(prompt, default_lang);
    ctx.add_row(&default_sms, |lang| prompt_sms(prompt, lang));

    let default_ivr = prompt_ivr_text(prompt, default_lang);
    ctx.add_row(&default_ivr, |lang| prompt_ivr_text(prompt, lang));

    let default_mobileweb = prompt_mobileweb(prompt, default_lang);
    ctx.add_row(&default_mobileweb, |lang| prompt_mobileweb(prompt, lang));
}

fn export_message(msg: &LocalizedPrompt, default_lang: &str, ctx: &mut ExportContext) {
    export_prompt(msg, default_lang, ctx);
}

/// Applies an imported table to the document. Unlike the autocomplete
/// actions this is a full overwrite: every language present in a
/// matching row replaces the stored value, empty cells excepted.
pub fn apply_rows(doc: &Questionnaire, rows: &[Vec<String>]) -> Questionnaire {
    if rows.is_empty() {
        return doc.clone();
    }

    let header_codes: Vec<String> = rows[0].iter().map(|n| language::name_to_code(n)).collect();
    let lookup = build_lookup(rows, &header_codes, &doc.default_language);

    let default_lang = doc.default_language.clone();
    let mut new_doc = doc.clone();

    new_doc.steps = new_doc
        .steps
        .iter()
        .map(|s| translate_step(s, &default_lang, &lookup))
        .collect();
    if let Some(quota_steps) = &new_doc.quota_completed_steps {
        new_doc.quota_completed_steps = Some(
            quota_steps
                .iter()
                .map(|s| translate_step(s, &default_lang, &lookup))
                .collect(),
        );
    }

    new_doc.settings.error_message =
        translate_prompt(&new_doc.settings.error_message, &default_lang, &lookup);
    new_doc.settings.thank_you_message =
        translate_prompt(&new_doc.settings.thank_you_message, &default_lang, &lookup);
    translate_text_map(&mut new_doc.settings.title, &default_lang, &lookup);
    translate_text_map(
        &mut new_doc.settings.survey_already_taken_message,
        &default_lang,
        &lookup,
    );

    new_doc
}

/// Converts the table into `{default text -> {language -> text}}`.
/// Rows with an empty default-language cell and empty target cells are
/// skipped.
fn build_lookup(rows: &[Vec<String>], header_codes: &[String], default_lang: &str) -> Lookup {
    let mut lookup = Lookup::new();
    let default_idx = match header_codes.iter().position(|c| c == default_lang) {
        Some(idx) => idx,
        None => return lookup,
    };

    for row in rows.iter().skip(1) {
        let default_text = match row.get(default_idx) {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => continue,
        };

        for (j, code) in header_codes.iter().enumerate() {
            if j == default_idx {
                continue;
            }
            let other_text = match row.get(j) {
                Some(t) if !t.trim().is_empty() => t.trim().to_string(),
                _ => continue,
            };
            lookup
                .entry(default_text.clone())
                .or_default()
                .insert(code.clone(), other_text);
        }
    }

    lookup
}

fn translate_step(step: &Step, default_lang: &str, lookup: &Lookup) -> Step {
    let mut new_step = step.clone();
    match &mut new_step {
        Step::MultipleChoice {
            prompt, choices, ..
        } => {
            *prompt = translate_prompt(prompt, default_lang, lookup);
            for choice in choices.iter_mut() {
                translate_choice(choice, default_lang, lookup);
            }
        }
        Step::Numeric { prompt, .. } => {
            *prompt = translate_prompt(prompt, default_lang, lookup);
        }
        Step::Explanation { prompt, .. } => {
            *prompt = translate_prompt(prompt, default_lang, lookup);
        }
        Step::Flag { .. } | Step::LanguageSelection { .. } => {}
    }
    new_step
}

fn translate_prompt(prompt: &LocalizedPrompt, default_lang: &str, lookup: &Lookup) -> LocalizedPrompt {
    let default_prompt = match prompt.get(default_lang) {
        Some(p) => p.clone(),
        None => return prompt.clone(),
    };

    let mut new_prompt = prompt.clone();

    if !default_prompt.sms.is_empty() {
        if let Some(translations) = lookup.get(&default_prompt.sms) {
            for (lang, text) in translations {
                new_prompt.entry(lang.clone()).or_default().sms = text.clone();
            }
        }
    }

    if !default_prompt.ivr.text.is_empty() {
        if let Some(translations) = lookup.get(&default_prompt.ivr.text) {
            for (lang, text) in translations {
                // A synthesized slot starts with a TTS audio source;
                // existing audio settings are kept.
                new_prompt.entry(lang.clone()).or_default().ivr.text = text.clone();
            }
        }
    }

    if !default_prompt.mobileweb.is_empty() {
        if let Some(translations) = lookup.get(&default_prompt.mobileweb) {
            for (lang, text) in translations {
                new_prompt.entry(lang.clone()).or_default().mobileweb = text.clone();
            }
        }
    }

    new_prompt
}

fn translate_choice(choice: &mut Choice, default_lang: &str, lookup: &Lookup) {
    if choice.responses.sms.contains_key(default_lang) {
        let key = choice_sms_joined(choice, default_lang);
        if let Some(translations) = lookup.get(&key) {
            for (lang, text) in translations {
                choice
                    .responses
                    .sms
                    .insert(lang.clone(), split_values(text));
            }
        }
    }

    let default_mobileweb = choice_mobileweb(choice, default_lang);
    if !default_mobileweb.is_empty() {
        if let Some(translations) = lookup.get(&default_mobileweb) {
            for (lang, text) in translations {
                choice
                    .responses
                    .mobileweb
                    .insert(lang.clone(), text.clone());
            }
        }
    }
}

fn translate_text_map(map: &mut BTreeMap<String, String>, default_lang: &str, lookup: &Lookup) {
    let key = match map.get(default_lang) {
        Some(t) if !t.is_empty() => t.trim().to_string(),
        _ => return,
    };
    if let Some(translations) = lookup.get(&key) {
        for (lang, text) in translations {
            map.insert(lang.clone(), text.trim().to_string());
        }
    }
}
