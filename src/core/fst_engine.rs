use fst::{Map, MapBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::core::vocabulary::{TableKind, Vocabulary};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ResolvedTerm {
    pub table: TableKind,
    pub canonical: String,
}

/// 别名/规范名 (小写) -> 规范名 的 FST 索引
pub struct SynonymIndex {
    index: Map<Vec<u8>>,
    // 存储 ID 到规范名的反查
    entries: Vec<ResolvedTerm>,
}

impl SynonymIndex {
    pub fn build(vocab: &Vocabulary) -> anyhow::Result<Self> {
        let mut builder = MapBuilder::memory();
        let mut entries = Vec::new();

        // FST 键必须有序
        let mut data: BTreeMap<String, u64> = BTreeMap::new();

        for kind in [TableKind::Column, TableKind::Value] {
            for entry in vocab.table(kind).entries() {
                let id = entries.len() as u64;
                entries.push(ResolvedTerm {
                    table: kind,
                    canonical: entry.canonical.clone(),
                });
                for term in std::iter::once(&entry.canonical).chain(entry.aliases.iter()) {
                    if let Some(prev) = data.insert(term.to_lowercase(), id) {
                        if prev != id {
                            warn!(
                                "别名冲突: '{}' 同时指向 '{}' 和 '{}'",
                                term, entries[prev as usize].canonical, entry.canonical
                            );
                        }
                    }
                }
            }
        }

        for (key, id) in &data {
            builder.insert(key, *id)?;
        }

        let bytes = builder.into_inner()?;
        info!("同义词索引构建完成: {} 个词条, {} 个键", entries.len(), data.len());
        Ok(Self {
            index: Map::new(bytes)?,
            entries,
        })
    }

    // 精确匹配：输入词语，返回对应的规范名
    pub fn find_match(&self, term: &str) -> Option<&ResolvedTerm> {
        let id = self.index.get(term.trim().to_lowercase())?;
        self.entries.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocabulary::SynonymTable;

    #[test]
    fn resolves_aliases_and_canonicals() {
        let index = SynonymIndex::build(&Vocabulary::builtin()).unwrap();

        let hit = index.find_match("톡식가스").unwrap();
        assert_eq!(hit.table, TableKind::Value);
        assert_eq!(hit.canonical, "Toxic Gas");

        assert_eq!(index.find_match(" Utility ").unwrap().canonical, "UT");
        assert_eq!(index.find_match("floor").unwrap().table, TableKind::Column);
        assert!(index.find_match("배관").is_none());
    }

    #[test]
    fn later_entry_wins_on_collision() {
        let vocab = Vocabulary::with_tables(
            SynonymTable::from_pairs(&[("UT", &["설비"])]),
            SynonymTable::from_pairs(&[("PCW", &["설비"])]),
        );
        let index = SynonymIndex::build(&vocab).unwrap();

        assert_eq!(index.find_match("설비").unwrap().canonical, "PCW");
        assert_eq!(index.len(), 3);
    }
}
