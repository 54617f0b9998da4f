use crate::{Error, Result};
use rand::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// 候选单词列表，启动时加载，之后只读
#[derive(Debug, Clone)]
pub struct WordSource {
    words: Vec<String>,
}

impl WordSource {
    /// 从文件加载词表，文件不可读、为空或包含非法单词时返回配置错误
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let entries = read_entries(path)?;
        let problems = validate_entries(&entries);
        if let Some(problem) = problems.first() {
            return Err(Error::Config(format!(
                "词表文件 {} 无效: {}",
                path.display(),
                problem
            )));
        }

        let source = Self::from_words(entries.into_iter().map(|(_, word)| word))?;
        info!("词表加载成功: {} ({} 个单词)", path.display(), source.len());
        Ok(source)
    }

    /// 从内存中的单词构建词表
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut source = WordSource { words: Vec::new() };
        for word in words {
            source.add_word(&word.into())?;
        }
        if source.words.is_empty() {
            return Err(Error::Config("词表为空".to_string()));
        }
        Ok(source)
    }

    /// 随机选取一个单词
    pub fn pick_word(&self) -> &str {
        let mut rng = rand::rng();
        let word = self
            .words
            .choose(&mut rng)
            .map(String::as_str)
            .unwrap_or_default();
        debug!("选取单词，长度 {}", word.len());
        word
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// 添加单词，去除首尾空白后必须是小写字母且不重复
    pub fn add_word(&mut self, word: &str) -> Result<()> {
        let word = word.trim();
        if let Some(problem) = check_word(word) {
            return Err(Error::Validation(problem));
        }
        if self.words.iter().any(|w| w == word) {
            return Err(Error::Validation(format!("单词已存在: {}", word)));
        }
        self.words.push(word.to_string());
        Ok(())
    }

    /// 保存词表，每行一个单词
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut content = self.words.join("\n");
        content.push('\n');
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("无法写入词表文件 {}: {}", path.display(), e)))
    }

    /// 获取词表统计信息
    pub fn stats(&self) -> WordSourceStats {
        let mut length_stats = BTreeMap::new();
        for word in &self.words {
            *length_stats.entry(word.len()).or_insert(0) += 1;
        }

        WordSourceStats {
            total_words: self.words.len(),
            shortest: self.words.iter().map(String::len).min().unwrap_or(0),
            longest: self.words.iter().map(String::len).max().unwrap_or(0),
            length_stats,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordSourceStats {
    pub total_words: usize,
    pub shortest: usize,
    pub longest: usize,
    /// 单词长度 -> 数量
    pub length_stats: BTreeMap<usize, usize>,
}

/// 读取词表文件，返回 (行号, 去除空白后的单词)，跳过空行
pub fn read_entries(path: impl AsRef<Path>) -> Result<Vec<(usize, String)>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("无法读取词表文件 {}: {}", path.display(), e)))?;

    Ok(content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim().to_string()))
        .filter(|(_, word)| !word.is_empty())
        .collect())
}

/// 检查词表条目，返回发现的问题列表
pub fn validate_entries(entries: &[(usize, String)]) -> Vec<String> {
    let mut problems = Vec::new();
    if entries.is_empty() {
        problems.push("词表为空".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    for (line, word) in entries {
        if let Some(problem) = check_word(word) {
            problems.push(format!("第{}行: {}", line, problem));
        } else if !seen.insert(word.as_str()) {
            problems.push(format!("第{}行: 单词重复 '{}'", line, word));
        }
    }

    problems
}

fn check_word(word: &str) -> Option<String> {
    if word.is_empty() {
        Some("单词为空".to_string())
    } else if !word.chars().all(|c| c.is_ascii_lowercase()) {
        Some(format!("单词只能包含小写字母 '{}'", word))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn word_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(content.as_bytes()).expect("write");
        file
    }

    #[test]
    fn load_strips_whitespace_and_skips_blank_lines() {
        let file = word_file("  apple\n\nbanana  \r\ncherry\n");
        let source = WordSource::load_from_file(file.path()).expect("load failed");
        assert_eq!(source.words(), ["apple", "banana", "cherry"]);
    }

    #[test]
    fn empty_file_is_a_config_error() {
        let file = word_file("\n   \n");
        let err = WordSource::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = WordSource::load_from_file("no/such/wordlist.txt").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn invalid_entry_names_the_line() {
        let file = word_file("apple\nPear\n");
        match WordSource::load_from_file(file.path()) {
            Err(Error::Config(msg)) => assert!(msg.contains("第2行"), "{}", msg),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn pick_word_returns_a_listed_word() {
        let source = WordSource::from_words(["cat", "dog", "bird"]).unwrap();
        for _ in 0..20 {
            let word = source.pick_word();
            assert!(source.words().iter().any(|w| w == word));
        }
    }

    #[test]
    fn add_word_rejects_duplicates_and_bad_words() {
        let mut source = WordSource::from_words(["cat"]).unwrap();
        assert!(source.add_word("cat").is_err());
        assert!(source.add_word("c4t").is_err());
        source.add_word(" dog ").unwrap();
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn save_and_reload() {
        let source = WordSource::from_words(["cat", "horse"]).unwrap();
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        source.save_to_file(file.path()).unwrap();

        let reloaded = WordSource::load_from_file(file.path()).unwrap();
        assert_eq!(reloaded.words(), source.words());

        let stats = reloaded.stats();
        assert_eq!(stats.total_words, 2);
        assert_eq!(stats.shortest, 3);
        assert_eq!(stats.longest, 5);
        assert_eq!(stats.length_stats.get(&3), Some(&1));
    }

    #[test]
    fn validate_reports_every_problem() {
        let entries = vec![
            (1, "cat".to_string()),
            (2, "cat".to_string()),
            (3, "x-ray".to_string()),
        ];
        let problems = validate_entries(&entries);
        assert_eq!(problems.len(), 2);
        assert!(validate_entries(&[]).len() == 1);
    }
}
