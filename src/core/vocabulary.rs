use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Column,
    Value,
}

impl TableKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "column" | "columns" => Some(TableKind::Column),
            "value" | "values" => Some(TableKind::Value),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SynonymEntry {
    pub canonical: String,
    pub aliases: Vec<String>,
}

/// 规范名 -> 别名列表，按定义顺序保存
///
/// 同一张表内别名应当互不重叠，运行时不做校验。
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    pub fn new(entries: Vec<SynonymEntry>) -> Self {
        Self { entries }
    }

    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let entries = pairs
            .iter()
            .map(|(canonical, aliases)| SynonymEntry {
                canonical: canonical.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn canonicals(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.canonical.as_str())
    }
}

/// 分组维度：规范列名 + 触发词 (与 `별` 组合)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Dimension {
    pub column: String,
    pub triggers: Vec<String>,
}

/// 预处理流水线用到的全部词表与固定短语
///
/// 进程启动时构建一次，之后只读共享。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Vocabulary {
    pub columns: SynonymTable,
    pub values: SynonymTable,
    /// 紧跟在韩文词后面的助词 (조사)，按尝试顺序排列
    pub particles: Vec<String>,
    /// 在列别名替换之前把 `장비` 换成占位符
    pub equipment_word: String,
    pub equipment_placeholder: String,
    pub fixed_rewrites: Vec<(String, String)>,
    /// 检测顺序固定: UT -> 장비명 -> Floor
    pub dimensions: Vec<Dimension>,
    pub group_by_cue: String,
    pub floor_field: String,
    pub value_field: String,
    pub equipment_field: String,
    pub floor_labels: Vec<String>,
    pub value_exclusions: Vec<String>,
    pub identity_columns: Vec<String>,
    pub command_phrases: Vec<String>,
    pub closing_phrase: String,
    pub min_meaningful_chars: usize,
}

static BUILTIN: OnceLock<Arc<Vocabulary>> = OnceLock::new();

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Vocabulary {
    /// 进程级共享的内置词表
    pub fn shared() -> Arc<Vocabulary> {
        BUILTIN.get_or_init(|| Arc::new(Vocabulary::builtin())).clone()
    }

    pub fn builtin() -> Self {
        let columns = SynonymTable::from_pairs(&[
            ("장비명", &["장비"]),
            ("UT", &["공종", "설비", "유틸리티", "utility"]),
            ("Floor", &["층수", "플로어"]),
            ("사전제작X_비대상(일부공정)(1)_길이", &["비대상"]),
            ("사전제작X_A(장비단Final)(2)_길이", &["장비단"]),
            ("사전제작○_B(H_UP구간)(3)_당초계획_길이", &["계획물량"]),
            ("사전제작○_B(H_UP구간)(4)_실제시공_길이", &["시공물량"]),
            ("사전제작X_C(TV단Final)(5)_길이", &["테핑밸브단"]),
            ("합계(1+2+4+5)", &["총합"]),
        ]);

        let values = SynonymTable::from_pairs(&[
            ("1F", &["1층"]),
            ("2F", &["2층"]),
            ("3F", &["3층"]),
            ("Bulk Gas", &["벌크가스", "bulk gas"]),
            ("Drain", &["드레인", "drain"]),
            ("Exhaust", &["이그저스트", "exhaust"]),
            ("UPW(DI)", &["초순수"]),
            ("PCW", &["프로세스쿨링워터"]),
            ("NPW", &["공업용수"]),
            ("Chemical", &["케미칼", "chemical"]),
            ("Pumping", &["펌프", "pumping"]),
            ("Toxic Gas", &["톡식가스", "toxic gas"]),
        ]);

        Self::with_tables(columns, values)
    }

    /// 使用内置的触发词与短语，替换两张同义词表
    pub fn with_tables(columns: SynonymTable, values: SynonymTable) -> Self {
        Self {
            columns,
            values,
            particles: strings(&[
                "은", "는", "이", "가", "을", "를", "의", "에", "에서", "로", "으로", "와", "과", "도",
            ]),
            equipment_word: "장비".to_string(),
            equipment_placeholder: "equipment".to_string(),
            fixed_rewrites: vec![
                ("배관".to_string(), "유틸리티".to_string()),
                ("물량".to_string(), "물량들".to_string()),
            ],
            dimensions: vec![
                Dimension {
                    column: "UT".to_string(),
                    triggers: strings(&["UT", "공종", "설비", "유틸리티", "utility"]),
                },
                Dimension {
                    column: "장비명".to_string(),
                    triggers: strings(&["장비명", "장비"]),
                },
                Dimension {
                    column: "Floor".to_string(),
                    triggers: strings(&["층", "층수"]),
                },
            ],
            group_by_cue: "별".to_string(),
            floor_field: "Floor".to_string(),
            value_field: "UT".to_string(),
            equipment_field: "장비명".to_string(),
            floor_labels: strings(&["1F", "2F", "3F"]),
            value_exclusions: strings(&["장비", "장비들"]),
            identity_columns: strings(&["장비명", "UT", "Floor"]),
            command_phrases: strings(&[
                "보여줘",
                "알려줘",
                "구해줘",
                "리스트해줘",
                "정리해줘",
                "목록화해줘",
                "합은",
                "총합은",
                "합계는",
                "총량은",
                "몇이야",
                "몇개야",
                "얼마야",
                "어떻게 돼",
                "얼마인지",
                "결과는",
            ]),
            closing_phrase: "데이터프레임으로 보여줘".to_string(),
            min_meaningful_chars: 2,
        }
    }

    pub fn table(&self, kind: TableKind) -> &SynonymTable {
        match kind {
            TableKind::Column => &self.columns,
            TableKind::Value => &self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_keep_definition_order() {
        let vocab = Vocabulary::builtin();
        let columns: Vec<&str> = vocab.columns.canonicals().collect();
        assert_eq!(columns[..3], ["장비명", "UT", "Floor"]);
        assert_eq!(columns.last(), Some(&"합계(1+2+4+5)"));
        assert_eq!(vocab.values.entries().len(), 12);
    }

    #[test]
    fn shared_vocabulary_is_built_once() {
        assert!(Arc::ptr_eq(&Vocabulary::shared(), &Vocabulary::shared()));
    }

    #[test]
    fn table_kind_parses_loose_names() {
        assert_eq!(TableKind::parse(" Columns "), Some(TableKind::Column));
        assert_eq!(TableKind::parse("value"), Some(TableKind::Value));
        assert_eq!(TableKind::parse("other"), None);
    }
}
