use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One crawled page as stored in the corpus: a JSON file holding at least
/// `url` and `content`.
#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDoc {
    pub path: PathBuf,
    pub url: String,
    pub content: String,
}

pub fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

/// Every `*.json` page under `root`, in file-name order so doc ids are
/// reproducible. Unreadable or malformed files are skipped.
pub fn iter_json_docs(root: &Path) -> impl Iterator<Item = CorpusDoc> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .filter_map(|e| load_page(e.path()))
}

fn load_page(path: &Path) -> Option<CorpusDoc> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "skipping unreadable document");
            return None;
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    let page: RawPage = match serde_json::from_str(&text) {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "skipping malformed document");
            return None;
        }
    };
    let url = page.url.unwrap_or_default();
    Some(CorpusDoc {
        path: path.to_path_buf(),
        url: strip_fragment(&url).to_string(),
        content: page.content.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_are_stripped() {
        assert_eq!(strip_fragment("https://a.edu/x#top"), "https://a.edu/x");
        assert_eq!(strip_fragment("https://a.edu/x"), "https://a.edu/x");
        assert_eq!(strip_fragment(""), "");
    }

    #[test]
    fn walks_sorted_and_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let domain = dir.path().join("www_ics_uci_edu");
        fs::create_dir_all(&domain).unwrap();
        fs::write(domain.join("b.json"), r#"{"url":"https://b#frag","content":"<p>b</p>"}"#).unwrap();
        fs::write(domain.join("a.json"), r#"{"url":"https://a","content":"<p>a</p>","encoding":"utf-8"}"#).unwrap();
        fs::write(domain.join("c.json"), "{broken").unwrap();
        fs::write(domain.join("notes.txt"), "not a page").unwrap();
        fs::write(domain.join("d.json"), r#"{"content":null}"#).unwrap();

        let docs: Vec<CorpusDoc> = iter_json_docs(dir.path()).collect();
        let urls: Vec<&str> = docs.iter().map(|d| d.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b", ""]);
        assert_eq!(docs[0].content, "<p>a</p>");
        assert_eq!(docs[2].content, "");
    }
}
