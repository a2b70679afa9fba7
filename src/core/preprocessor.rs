use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::core::normalizer::{is_hangul_syllable, LexicalNormalizer};
use crate::core::vocabulary::Vocabulary;
use crate::models::ontology::{Aggregation, Condition, QueryDirective};

/// 流水线中流转的中间结果
///
/// `raw` 保持不变 (维度检测要读原始提问)，其余字段逐阶段累积。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub raw: String,
    pub text: String,
    pub conditions: Vec<Condition>,
    pub selected_columns: Vec<String>,
    pub dimension_columns: Vec<String>,
}

impl Draft {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        Self {
            text: raw.clone(),
            raw,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    Dimensions,
    Conditions,
    Columns,
    Standardize,
}

/// 阶段顺序是语义的一部分：维度检测必须早于条件抽取
pub const STAGES: [Stage; 5] = [
    Stage::Normalize,
    Stage::Dimensions,
    Stage::Conditions,
    Stage::Columns,
    Stage::Standardize,
];

struct DimensionRule {
    column: String,
    /// (在原始提问上检测, 在工作文本上删除)
    triggers: Vec<(Regex, Regex)>,
}

pub struct Preprocessor {
    vocab: Arc<Vocabulary>,
    normalizer: LexicalNormalizer,
    dimension_rules: Vec<DimensionRule>,
    equipment_code: Regex,
    command_phrases: Option<Regex>,
}

impl Preprocessor {
    pub fn new(vocab: Arc<Vocabulary>) -> Result<Self, regex::Error> {
        let normalizer = LexicalNormalizer::new(&vocab)?;

        let cue = regex::escape(&vocab.group_by_cue);
        let mut dimension_rules = Vec::new();
        for dim in &vocab.dimensions {
            let mut triggers = Vec::new();
            for word in &dim.triggers {
                let word = regex::escape(word);
                triggers.push((
                    Regex::new(&format!(r"(?i){}\s*{}", word, cue))?,
                    Regex::new(&format!(r"{}\s*{}", word, cue))?,
                ));
            }
            dimension_rules.push(DimensionRule {
                column: dim.column.clone(),
                triggers,
            });
        }

        // 单个交替表达式：同一位置上按列表顺序优先匹配
        let command_phrases = if vocab.command_phrases.is_empty() {
            None
        } else {
            let alternation: Vec<String> =
                vocab.command_phrases.iter().map(|p| regex::escape(p)).collect();
            Some(Regex::new(&format!("(?:{})", alternation.join("|")))?)
        };

        Ok(Self {
            normalizer,
            dimension_rules,
            equipment_code: Regex::new(r"\b[A-Za-z0-9]{3,}\b")?,
            command_phrases,
            vocab,
        })
    }

    /// 把自然语言提问整理成执行器可消费的指令
    #[instrument(skip(self), fields(query = %raw))]
    pub fn process(&self, raw: &str) -> QueryDirective {
        let draft = Draft::new(raw);
        if draft.raw.is_empty() {
            return QueryDirective::default();
        }

        let draft = STAGES.iter().fold(draft, |draft, stage| {
            let next = self.run_stage(*stage, draft);
            debug!("阶段 {:?} 完成: {}", stage, next.text);
            next
        });

        let directive = self.assemble(draft);
        info!("指令生成完成: {}", directive);
        directive
    }

    pub fn run_stage(&self, stage: Stage, draft: Draft) -> Draft {
        match stage {
            Stage::Normalize => self.normalize(draft),
            Stage::Dimensions => self.detect_dimensions(draft),
            Stage::Conditions => self.extract_conditions(draft),
            Stage::Columns => self.select_columns(draft),
            Stage::Standardize => self.standardize_command(draft),
        }
    }

    fn normalize(&self, mut draft: Draft) -> Draft {
        draft.text = self.normalizer.normalize(&draft.text);
        draft
    }

    fn detect_dimensions(&self, mut draft: Draft) -> Draft {
        for rule in &self.dimension_rules {
            let hit = rule.triggers.iter().find(|(on_raw, _)| on_raw.is_match(&draft.raw));
            if let Some((_, on_text)) = hit {
                debug!("检测到分组维度: {}", rule.column);
                draft.dimension_columns.push(rule.column.clone());
                draft.text = on_text.replace_all(&draft.text, "").into_owned();
            }
        }
        draft
    }

    fn extract_conditions(&self, mut draft: Draft) -> Draft {
        let vocab = &self.vocab;

        // 1. 楼层
        for floor in &vocab.floor_labels {
            if let Some(stripped) = strip_whole_word(&draft.text, floor) {
                draft.conditions.push(Condition::eq(&vocab.floor_field, floor));
                draft.text = stripped;
            }
        }

        // 2. 分类值 (排除楼层和排除列表)
        for value in vocab.values.canonicals() {
            let skip = vocab.floor_labels.iter().any(|f| f == value)
                || vocab.value_exclusions.iter().any(|e| e == value);
            if skip {
                continue;
            }
            if let Some(stripped) = strip_whole_word(&draft.text, value) {
                draft.conditions.push(Condition::eq(&vocab.value_field, value));
                draft.text = stripped;
            }
        }

        // 3. 设备编号：字母数字混合、长度 >= 3，重复出现也逐个记录
        let codes: Vec<String> = self
            .equipment_code
            .find_iter(&draft.text)
            .map(|m| m.as_str())
            .filter(|w| w.chars().any(|c| c.is_ascii_alphabetic()) && w.chars().any(|c| c.is_ascii_digit()))
            .map(str::to_string)
            .collect();
        for code in codes {
            draft.text = draft.text.replace(&code, "");
            draft.conditions.push(Condition::eq(&vocab.equipment_field, code));
        }

        draft
    }

    fn select_columns(&self, mut draft: Draft) -> Draft {
        for column in self.vocab.columns.canonicals() {
            if draft.text.contains(column) {
                draft.selected_columns.push(column.to_string());
                draft.text = draft.text.replace(column, "");
            }
        }
        draft
    }

    fn standardize_command(&self, mut draft: Draft) -> Draft {
        let meaningful = draft.text.chars().filter(|c| is_hangul_syllable(*c)).count();
        if meaningful < self.vocab.min_meaningful_chars {
            return draft;
        }

        let stripped = match &self.command_phrases {
            Some(pattern) => pattern.replace_all(&draft.text, "").into_owned(),
            None => draft.text.clone(),
        };
        draft.text = format!("{} {}", stripped.trim(), self.vocab.closing_phrase);
        draft
    }

    fn assemble(&self, draft: Draft) -> QueryDirective {
        let output_columns = if draft.selected_columns.is_empty() {
            Vec::new()
        } else {
            // 身份列前缀 ∪ 选中列，按表定义顺序去重
            let mut columns: Vec<String> = self.vocab.identity_columns.clone();
            for column in self.vocab.columns.canonicals() {
                let picked = draft.selected_columns.iter().any(|c| c == column);
                if picked && !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
            columns
        };

        let aggregation = (!draft.dimension_columns.is_empty()).then_some(Aggregation::Sum);

        QueryDirective {
            conditions: draft.conditions,
            output_columns,
            dimension_columns: draft.dimension_columns,
            aggregation,
            remainder: draft.text,
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 删除所有作为完整单词出现的 `word`；一次都没出现时返回 None
fn strip_whole_word(text: &str, word: &str) -> Option<String> {
    if word.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut found = false;
    for (start, _) in text.match_indices(word) {
        if start < last {
            continue;
        }
        let end = start + word.len();
        let left_ok = !text[..start].chars().next_back().is_some_and(is_word_char);
        let right_ok = !text[end..].chars().next().is_some_and(is_word_char);
        if left_ok && right_ok {
            out.push_str(&text[last..start]);
            last = end;
            found = true;
        }
    }
    if !found {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}
