//! Routing keys for posts.
//!
//! Titles are transliterated to ASCII (`pinyin` for Chinese, `slug` for the
//! rest, which also folds Vietnamese and other Latin diacritics) and then
//! slugified. [`SlugRegistry`] hands out collision-free keys inside one listing.

use std::collections::HashSet;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Derive a base slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let candidate = slugify(transliterate_to_ascii(input));
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Produce a slug for which `is_unique` returns `true`, suffixing `-2`, `-3`, …
/// to the base slug on collision.
pub fn generate_unique_slug<F>(input: &str, mut is_unique: F) -> Result<String, SlugError>
where
    F: FnMut(&str) -> bool,
{
    let base = derive_slug(input)?;

    if is_unique(&base) {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate) {
            return Ok(candidate);
        }
    }

    Err(SlugError::Exhausted { base })
}

/// Tracks slugs already handed out within one listing.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    taken: HashSet<String>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `slug`, or the first free suffixed variant of it. Slugs that
    /// cannot be re-derived are returned unchanged.
    pub fn claim(&mut self, slug: &str) -> String {
        if slug.is_empty() {
            return String::new();
        }

        let taken = &mut self.taken;
        match generate_unique_slug(slug, |candidate| !taken.contains(candidate)) {
            Ok(unique) => {
                taken.insert(unique.clone());
                unique
            }
            Err(_) => {
                taken.insert(slug.to_string());
                slug.to_string()
            }
        }
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_transliterates_chinese() {
        let slug = derive_slug("Rust 基础教程").expect("slug");
        assert_eq!(slug, "rust-ji-chu-jiao-cheng");
    }

    #[test]
    fn derive_slug_folds_latin_diacritics() {
        let slug = derive_slug("Kiến trúc sạch").expect("slug");
        assert_eq!(slug, "kien-truc-sach");
    }

    #[test]
    fn derive_slug_rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn generate_unique_slug_exhausted() {
        let result =
            generate_unique_slug("Example", |_| false).expect_err("should exhaust attempts");
        assert_eq!(
            result,
            SlugError::Exhausted {
                base: "example".to_string()
            }
        );
    }

    #[test]
    fn registry_suffixes_duplicate_titles() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.claim("clean-architecture"), "clean-architecture");
        assert_eq!(registry.claim("clean-architecture"), "clean-architecture-2");
        assert_eq!(registry.claim("clean-architecture"), "clean-architecture-3");
        assert_eq!(registry.claim("other"), "other");
    }

    #[test]
    fn registry_passes_empty_slugs_through() {
        let mut registry = SlugRegistry::new();
        assert_eq!(registry.claim(""), "");
        assert_eq!(registry.claim(""), "");
    }
}
