use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;

use crate::core::normalizer;
use crate::core::sources;
use crate::core::{
    ConfigProvider, MergeResult, Pipeline, RunSummary, SourceDocument, SourceRules, SourceSummary,
    Storage,
};
use crate::domain::model::Normalization;
use crate::utils::error::Result;
use crate::utils::validation;

pub const TMP_DIR: &str = "tmp";
pub const MERGED_FILE: &str = "dist/merged_rules.txt";
pub const LOG_FILE: &str = "dist/log.txt";
pub const SUMMARY_FILE: &str = "dist/summary.json";

pub struct MergePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
}

impl<S: Storage, C: ConfigProvider> MergePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MergePipeline<S, C> {
    async fn extract(&self) -> Result<Vec<SourceDocument>> {
        let urls = sources::load_sources(self.config.urls_file())?;
        let timeout = Duration::from_secs(self.config.timeout_seconds());
        let total = urls.len();

        let mut documents = Vec::with_capacity(total);
        for (position, url) in urls.into_iter().enumerate() {
            let index = position + 1;
            tracing::info!("🔗 Fetching source {}/{}: {}", index, total, url);

            // 無效的 URL 視同下載失敗：記錄後繼續
            if let Err(e) = validation::validate_url("sources", &url) {
                tracing::warn!("⚠ Skipping unfetchable source: {}", e);
                documents.push(SourceDocument {
                    index,
                    url,
                    fetched: false,
                    lines: Vec::new(),
                });
                continue;
            }

            match sources::fetch_source(&self.client, &url, timeout).await {
                Ok(lines) => {
                    tracing::debug!("Fetched {} lines from {}", lines.len(), url);
                    documents.push(SourceDocument {
                        index,
                        url,
                        fetched: true,
                        lines,
                    });
                }
                Err(e) => {
                    tracing::error!("❌ Download failed for {}: {}", url, e);
                    documents.push(SourceDocument {
                        index,
                        url,
                        fetched: false,
                        lines: Vec::new(),
                    });
                }
            }
        }

        Ok(documents)
    }

    async fn transform(&self, documents: Vec<SourceDocument>) -> Result<MergeResult> {
        let mut per_source = Vec::with_capacity(documents.len());
        let mut merged = Vec::new();
        let mut trace = Vec::new();

        for document in documents {
            let mut rules = Vec::new();

            for line in &document.lines {
                let Normalization {
                    outputs,
                    trace: line_trace,
                } = normalizer::normalize(line);

                for rule in &outputs {
                    println!("  ✅ {}", rule);
                }

                merged.extend(outputs.iter().cloned());
                rules.extend(outputs);
                trace.extend(line_trace);
            }

            tracing::debug!(
                "Source {} normalized to {} rules",
                document.index,
                rules.len()
            );

            per_source.push(SourceRules {
                index: document.index,
                url: document.url,
                fetched: document.fetched,
                rules,
            });
        }

        Ok(MergeResult {
            per_source,
            merged,
            trace,
        })
    }

    async fn load(&self, result: MergeResult) -> Result<String> {
        let MergeResult {
            per_source,
            merged,
            trace,
        } = result;

        // 每個來源的拆分結果各存一份
        for source in &per_source {
            if !source.fetched {
                continue;
            }
            let path = format!("{}/{:03}.txt", TMP_DIR, source.index);
            self.storage
                .write_file(&path, source.rules.join("\n").as_bytes())
                .await?;
        }

        let rules_collected = merged.len();
        let rules = finalize_rules(merged, self.config.dedupe(), self.config.sort_output());

        tracing::debug!(
            "Writing {} merged rules ({} collected)",
            rules.len(),
            rules_collected
        );
        self.storage
            .write_file(MERGED_FILE, rules.join("\n").as_bytes())
            .await?;

        self.storage
            .write_file(LOG_FILE, trace.join("\n").as_bytes())
            .await?;

        let summary = RunSummary {
            generated_at: chrono::Utc::now(),
            sources_total: per_source.len(),
            sources_fetched: per_source.iter().filter(|s| s.fetched).count(),
            sources_failed: per_source.iter().filter(|s| !s.fetched).count(),
            rules_collected,
            rules_written: rules.len(),
            sources: per_source
                .iter()
                .map(|s| SourceSummary {
                    index: s.index,
                    url: s.url.clone(),
                    fetched: s.fetched,
                    rule_count: s.rules.len(),
                })
                .collect(),
        };
        let summary_json = serde_json::to_string_pretty(&summary)?;
        self.storage
            .write_file(SUMMARY_FILE, summary_json.as_bytes())
            .await?;

        Ok(format!("{}/{}", self.config.output_path(), MERGED_FILE))
    }
}

/// Applies the configured persistence policy. With `dedupe` the first
/// occurrence wins; `sort` orders lexicographically for determinism.
fn finalize_rules(mut rules: Vec<String>, dedupe: bool, sort: bool) -> Vec<String> {
    if dedupe {
        let mut seen = HashSet::new();
        rules.retain(|rule| seen.insert(rule.clone()));
    }
    if sort {
        rules.sort();
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::MergeError;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn get_text(&self, path: &str) -> Option<String> {
            self.get_file(path)
                .await
                .map(|data| String::from_utf8(data).unwrap())
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                MergeError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        urls_file: String,
        output_path: String,
        timeout_seconds: u64,
        dedupe: bool,
        sort_output: bool,
    }

    impl MockConfig {
        fn new(urls_file: String) -> Self {
            Self {
                urls_file,
                output_path: "test_output".to_string(),
                timeout_seconds: 5,
                dedupe: true,
                sort_output: true,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn urls_file(&self) -> &str {
            &self.urls_file
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn timeout_seconds(&self) -> u64 {
            self.timeout_seconds
        }

        fn dedupe(&self) -> bool {
            self.dedupe
        }

        fn sort_output(&self) -> bool {
            self.sort_output
        }
    }

    fn urls_file_with(urls: &[String]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for url in urls {
            writeln!(file, "{}", url).unwrap();
        }
        file
    }

    fn document(index: usize, lines: &[&str]) -> SourceDocument {
        SourceDocument {
            index,
            url: format!("https://source{}.example/list.txt", index),
            fetched: true,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_extract_fetches_each_source_in_order() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET).path("/one.txt");
            then.status(200).body("||a.com^\n0.0.0.0 b.com");
        });
        let second = server.mock(|when, then| {
            when.method(GET).path("/two.txt");
            then.status(200).body("c.com,d.com##.ad");
        });

        let urls = urls_file_with(&[server.url("/one.txt"), server.url("/two.txt")]);
        let config = MockConfig::new(urls.path().to_str().unwrap().to_string());
        let pipeline = MergePipeline::new(MockStorage::new(), config);

        let documents = pipeline.extract().await.unwrap();

        first.assert();
        second.assert();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].index, 1);
        assert!(documents[0].fetched);
        assert_eq!(documents[0].lines, vec!["||a.com^", "0.0.0.0 b.com"]);
        assert_eq!(documents[1].index, 2);
        assert_eq!(documents[1].lines, vec!["c.com,d.com##.ad"]);
    }

    #[tokio::test]
    async fn test_extract_tolerates_failed_source() {
        let server = MockServer::start();
        let broken = server.mock(|when, then| {
            when.method(GET).path("/broken.txt");
            then.status(500);
        });
        let healthy = server.mock(|when, then| {
            when.method(GET).path("/ok.txt");
            then.status(200).body("||x.com^");
        });

        let urls = urls_file_with(&[server.url("/broken.txt"), server.url("/ok.txt")]);
        let config = MockConfig::new(urls.path().to_str().unwrap().to_string());
        let pipeline = MergePipeline::new(MockStorage::new(), config);

        let documents = pipeline.extract().await.unwrap();

        broken.assert();
        healthy.assert();
        assert_eq!(documents.len(), 2);
        assert!(!documents[0].fetched);
        assert!(documents[0].lines.is_empty());
        assert!(documents[1].fetched);
    }

    #[tokio::test]
    async fn test_extract_skips_invalid_url_without_request() {
        let urls = urls_file_with(&["not a url at all".to_string()]);
        let config = MockConfig::new(urls.path().to_str().unwrap().to_string());
        let pipeline = MergePipeline::new(MockStorage::new(), config);

        let documents = pipeline.extract().await.unwrap();

        assert_eq!(documents.len(), 1);
        assert!(!documents[0].fetched);
    }

    #[tokio::test]
    async fn test_extract_missing_urls_file_is_fatal() {
        let config = MockConfig::new("missing/urls.txt".to_string());
        let pipeline = MergePipeline::new(MockStorage::new(), config);

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, MergeError::MissingSourcesError { .. }));
    }

    #[tokio::test]
    async fn test_transform_normalizes_and_accumulates() {
        let config = MockConfig::new("unused".to_string());
        let pipeline = MergePipeline::new(MockStorage::new(), config);

        let documents = vec![
            document(1, &["! comment", "0.0.0.0 bad.com", "a.com,b.com##.banner"]),
            document(2, &["||already.com^"]),
        ];

        let result = pipeline.transform(documents).await.unwrap();

        assert_eq!(
            result.per_source[0].rules,
            vec!["||bad.com^", "||a.com##.banner", "||b.com##.banner"]
        );
        assert_eq!(result.per_source[1].rules, vec!["||already.com^"]);
        assert_eq!(
            result.merged,
            vec![
                "||bad.com^",
                "||a.com##.banner",
                "||b.com##.banner",
                "||already.com^"
            ]
        );
        assert!(result.trace.iter().any(|t| t.contains("comment")));
    }

    #[tokio::test]
    async fn test_load_writes_all_artifacts() {
        let storage = MockStorage::new();
        let config = MockConfig::new("unused".to_string());
        let pipeline = MergePipeline::new(storage.clone(), config);

        let result = MergeResult {
            per_source: vec![
                SourceRules {
                    index: 1,
                    url: "https://a.example/list.txt".to_string(),
                    fetched: true,
                    rules: vec!["||b.com^".to_string(), "||a.com^".to_string()],
                },
                SourceRules {
                    index: 2,
                    url: "https://b.example/list.txt".to_string(),
                    fetched: false,
                    rules: Vec::new(),
                },
            ],
            merged: vec![
                "||b.com^".to_string(),
                "||a.com^".to_string(),
                "||b.com^".to_string(),
            ],
            trace: vec!["hosts entry rewritten: b.com -> ||b.com^".to_string()],
        };

        let output_path = pipeline.load(result).await.unwrap();
        assert_eq!(output_path, "test_output/dist/merged_rules.txt");

        // deduplicated and sorted
        assert_eq!(
            storage.get_text(MERGED_FILE).await.unwrap(),
            "||a.com^\n||b.com^"
        );

        // per-source file keeps original order; failed source has none
        assert_eq!(
            storage.get_text("tmp/001.txt").await.unwrap(),
            "||b.com^\n||a.com^"
        );
        assert!(storage.get_file("tmp/002.txt").await.is_none());

        assert_eq!(
            storage.get_text(LOG_FILE).await.unwrap(),
            "hosts entry rewritten: b.com -> ||b.com^"
        );

        let summary: RunSummary =
            serde_json::from_str(&storage.get_text(SUMMARY_FILE).await.unwrap()).unwrap();
        assert_eq!(summary.sources_total, 2);
        assert_eq!(summary.sources_fetched, 1);
        assert_eq!(summary.sources_failed, 1);
        assert_eq!(summary.rules_collected, 3);
        assert_eq!(summary.rules_written, 2);
        assert_eq!(summary.sources[0].rule_count, 2);
    }

    #[tokio::test]
    async fn test_load_respects_dedupe_and_sort_options() {
        let merged = vec![
            "||b.com^".to_string(),
            "||a.com^".to_string(),
            "||b.com^".to_string(),
        ];
        let make_result = || MergeResult {
            per_source: Vec::new(),
            merged: merged.clone(),
            trace: Vec::new(),
        };

        // raw insertion order with duplicates
        let storage = MockStorage::new();
        let mut config = MockConfig::new("unused".to_string());
        config.dedupe = false;
        config.sort_output = false;
        let pipeline = MergePipeline::new(storage.clone(), config);
        pipeline.load(make_result()).await.unwrap();
        assert_eq!(
            storage.get_text(MERGED_FILE).await.unwrap(),
            "||b.com^\n||a.com^\n||b.com^"
        );

        // first occurrence wins, order kept
        let storage = MockStorage::new();
        let mut config = MockConfig::new("unused".to_string());
        config.sort_output = false;
        let pipeline = MergePipeline::new(storage.clone(), config);
        pipeline.load(make_result()).await.unwrap();
        assert_eq!(
            storage.get_text(MERGED_FILE).await.unwrap(),
            "||b.com^\n||a.com^"
        );

        // sorted, duplicates retained
        let storage = MockStorage::new();
        let mut config = MockConfig::new("unused".to_string());
        config.dedupe = false;
        let pipeline = MergePipeline::new(storage.clone(), config);
        pipeline.load(make_result()).await.unwrap();
        assert_eq!(
            storage.get_text(MERGED_FILE).await.unwrap(),
            "||a.com^\n||b.com^\n||b.com^"
        );
    }

    #[test]
    fn test_finalize_rules_is_deterministic() {
        let rules = vec![
            "||z.com^".to_string(),
            "||a.com^".to_string(),
            "||z.com^".to_string(),
        ];
        assert_eq!(
            finalize_rules(rules.clone(), true, true),
            vec!["||a.com^", "||z.com^"]
        );
        assert_eq!(finalize_rules(rules.clone(), false, false), rules);
    }
}
