use regex::{NoExpand, Regex};
use std::iter;

use crate::core::vocabulary::Vocabulary;

/// 完整的韩文音节区间 (가-힣)
pub fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

/// 韩文别名的自定义边界：韩文音节、ASCII 字母或数字
fn is_boundary_char(c: char) -> bool {
    is_hangul_syllable(c) || c.is_ascii_alphanumeric()
}

enum AliasRule {
    /// 含韩文：手写边界检查，并吞掉紧随其后的助词
    Hangul { alias: String, canonical: String },
    /// 拉丁字母/数字：`\b` 边界，忽略大小写
    Latin { pattern: Regex, canonical: String },
}

/// 把提问中的别名改写成规范列名/值
///
/// 顺序不可调整：占位符 -> 列别名 -> 值别名 -> 固定改写。
pub struct LexicalNormalizer {
    placeholder: (Regex, String),
    column_rules: Vec<AliasRule>,
    value_rules: Vec<(Regex, String)>,
    rewrites: Vec<(Regex, String)>,
    particles: Vec<String>,
}

impl LexicalNormalizer {
    pub fn new(vocab: &Vocabulary) -> Result<Self, regex::Error> {
        let placeholder = (
            whole_word(&vocab.equipment_word, false)?,
            vocab.equipment_placeholder.clone(),
        );

        let mut column_rules = Vec::new();
        for entry in vocab.columns.entries() {
            // 规范名本身也参与匹配，用来吸收它后面的助词
            for syn in entry.aliases.iter().chain(iter::once(&entry.canonical)) {
                let rule = if syn.chars().any(is_hangul_syllable) {
                    AliasRule::Hangul {
                        alias: syn.clone(),
                        canonical: entry.canonical.clone(),
                    }
                } else {
                    AliasRule::Latin {
                        pattern: whole_word(syn, true)?,
                        canonical: entry.canonical.clone(),
                    }
                };
                column_rules.push(rule);
            }
        }

        let mut value_rules = Vec::new();
        for entry in vocab.values.entries() {
            for syn in &entry.aliases {
                value_rules.push((whole_word(syn, true)?, entry.canonical.clone()));
            }
        }

        let rewrites = vocab
            .fixed_rewrites
            .iter()
            .map(|(from, to)| Ok((whole_word(from, false)?, to.clone())))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self {
            placeholder,
            column_rules,
            value_rules,
            rewrites,
            particles: vocab.particles.clone(),
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let (pattern, placeholder) = &self.placeholder;
        let mut out = pattern.replace_all(text, NoExpand(placeholder)).into_owned();

        for rule in &self.column_rules {
            out = match rule {
                AliasRule::Hangul { alias, canonical } => {
                    replace_with_particle(&out, alias, canonical, &self.particles)
                }
                AliasRule::Latin { pattern, canonical } => {
                    pattern.replace_all(&out, NoExpand(canonical)).into_owned()
                }
            };
        }

        for (pattern, canonical) in &self.value_rules {
            out = pattern.replace_all(&out, NoExpand(canonical)).into_owned();
        }

        for (pattern, to) in &self.rewrites {
            out = pattern.replace_all(&out, NoExpand(to)).into_owned();
        }

        out
    }
}

fn whole_word(word: &str, case_insensitive: bool) -> Result<Regex, regex::Error> {
    let flags = if case_insensitive { "(?i)" } else { "" };
    Regex::new(&format!(r"{}\b{}\b", flags, regex::escape(word)))
}

/// 从左到右扫描，替换所有满足边界条件的 `alias[+助词]`
fn replace_with_particle(text: &str, alias: &str, canonical: &str, particles: &[String]) -> String {
    if alias.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    while let Some(ch) = text[pos..].chars().next() {
        if text[pos..].starts_with(alias) && !text[..pos].chars().next_back().is_some_and(is_boundary_char) {
            if let Some(end) = particle_end(text, pos + alias.len(), particles) {
                out.push_str(canonical);
                pos = end;
                continue;
            }
        }
        out.push(ch);
        pos += ch.len_utf8();
    }
    out
}

/// 依次尝试每个助词，最后尝试不带助词；返回第一个右边界成立的结束位置
fn particle_end(text: &str, start: usize, particles: &[String]) -> Option<usize> {
    let rest = &text[start..];
    particles
        .iter()
        .map(String::as_str)
        .chain(iter::once(""))
        .filter(|p| rest.starts_with(p))
        .map(|p| start + p.len())
        .find(|&end| !text[end..].chars().next().is_some_and(is_boundary_char))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[fixture]
    fn normalizer() -> LexicalNormalizer {
        LexicalNormalizer::new(&Vocabulary::builtin()).unwrap()
    }

    #[rstest]
    #[case::hangul_alias("공종 알려줘", "UT 알려줘")]
    #[case::alias_with_particle("비대상을 보여줘", "사전제작X_비대상(일부공정)(1)_길이 보여줘")]
    #[case::two_char_particle("플로어에서 확인", "Floor 확인")]
    #[case::canonical_absorbs_particle("장비명은 뭐야", "장비명 뭐야")]
    #[case::latin_alias_ignores_case("UTILITY list", "UT list")]
    #[case::value_alias("2층 톡식가스", "2F Toxic Gas")]
    #[case::latin_value_alias("Bulk gas 드레인", "Bulk Gas Drain")]
    #[case::fixed_rewrites("배관 물량", "유틸리티 물량들")]
    fn rewrites_aliases(normalizer: LexicalNormalizer, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalizer.normalize(input), expected);
    }

    #[rstest]
    #[case::embedded_in_word("비대상자", "비대상자")]
    #[case::preceded_by_hangul("총비대상", "총비대상")]
    #[case::latin_inside_word("output", "output")]
    #[case::value_alias_with_particle("2층의", "2층의")]
    fn respects_boundaries(normalizer: LexicalNormalizer, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalizer.normalize(input), expected);
    }

    #[rstest]
    fn equipment_word_becomes_placeholder_first(normalizer: LexicalNormalizer) {
        // 单独的 `장비` 不会被列别名吞掉
        assert_eq!(normalizer.normalize("장비 목록"), "equipment 목록");
        // 带助词时不是完整单词，走列别名
        assert_eq!(normalizer.normalize("장비를 보여줘"), "장비명 보여줘");
    }

    #[test]
    fn particle_requires_right_boundary() {
        let particles = vec!["에".to_string(), "에서".to_string()];
        assert_eq!(replace_with_particle("층수에서 ", "층수", "Floor", &particles), "Floor ");
        assert_eq!(replace_with_particle("층수에다", "층수", "Floor", &particles), "층수에다");
        assert_eq!(replace_with_particle("층수,층수", "층수", "Floor", &particles), "Floor,Floor");
    }
}
